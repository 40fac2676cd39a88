use crate::conversation::{ConfirmOutcome, Conversation};
use crate::llm::prompts::ConversationTemplates;
use crate::router::Persona;
use crate::session::UpdateOutcome;
use serde_json::{json, Value};
use thiserror::Error;

pub mod lead;
pub mod order;
pub mod routing;
pub mod wellness;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("Tool execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Invalid tool parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(Option<String>), // Happy path: Some(msg) = speak it, None = silent
    Escalation(Value),       // Tool needs LLM help/intervention
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding the tools a persona may call
    pub fn for_persona(persona: Persona) -> Self {
        let mut registry = Self::new();
        match persona {
            Persona::Barista => order::register(&mut registry),
            Persona::WellnessCompanion => wellness::register(&mut registry),
            Persona::SalesRep => lead::register(&mut registry),
            Persona::Receptionist => routing::register(&mut registry),
            Persona::Chat => {}
        }
        registry
    }

    pub fn register_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    pub fn get_tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn find_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Execute a registered tool against the conversation
    pub fn execute_tool(
        &self,
        conversation: &mut Conversation,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolError> {
        if self.find_tool(name).is_none() {
            return Err(ToolError::NotFound(format!(
                "Tool '{}' is not available to the {}",
                name,
                conversation.persona().name()
            )));
        }

        log::info!("🔧 Executing tool {} with {}", name, arguments);

        match name {
            "update_order" => order::update_order(conversation, &arguments),
            "complete_order" => order::complete_order(conversation, &arguments),
            "update_checkin" => wellness::update_checkin(conversation, &arguments),
            "complete_checkin" => wellness::complete_checkin(conversation, &arguments),
            "update_lead" => lead::update_lead(conversation, &arguments),
            "complete_lead" => lead::complete_lead(conversation, &arguments),
            "route_to_service" => routing::route_to_service(conversation, &arguments),
            _ => Err(ToolError::NotFound(format!("Tool '{}' not found", name))),
        }
    }

    /// Tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters
                    }
                })
            })
            .collect()
    }
}

/// Text form of an argument; arrays are joined with commas
fn text_argument(arguments: &Value, key: &str) -> Option<String> {
    match arguments.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_argument(arguments: &Value, key: &str) -> Result<String, ToolError> {
    text_argument(arguments, key).ok_or_else(|| {
        ToolError::InvalidParameters(format!("Missing required '{}' parameter", key))
    })
}

/// Field update shared by the `update_*` tools
fn apply_update(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let field = required_argument(arguments, "field")?;
    let value = required_argument(arguments, "value")?;

    match conversation.update(&field, &value) {
        UpdateOutcome::Applied => {
            let missing = conversation.missing_fields();
            if missing.is_empty() {
                Ok(ToolResult::Success(None))
            } else {
                Ok(ToolResult::Escalation(json!({
                    "status": "collecting",
                    "missing": missing,
                    "say": ConversationTemplates::incomplete(&missing),
                })))
            }
        }
        UpdateOutcome::Ignored(reason) => Ok(ToolResult::Escalation(json!({
            "status": "ignored",
            "field": field,
            "reason": reason,
        }))),
    }
}

/// Turn a confirm attempt into something the LLM can act on
fn confirm_into_result(
    conversation: &mut Conversation,
    what: &str,
    saved: fn(&str) -> String,
) -> Result<ToolResult, ToolError> {
    match conversation.confirm() {
        Ok(ConfirmOutcome::Saved { summary, .. }) => Ok(ToolResult::Success(Some(saved(&summary)))),
        Ok(ConfirmOutcome::AlreadySaved(_)) => Ok(ToolResult::Success(Some(saved(
            &conversation.summary(),
        )))),
        Ok(ConfirmOutcome::Incomplete(missing)) => Ok(ToolResult::Escalation(json!({
            "status": "incomplete",
            "missing": missing,
            "say": ConversationTemplates::incomplete(&missing),
        }))),
        Ok(ConfirmOutcome::NothingToSave) => Err(ToolError::ExecutionFailed(format!(
            "the {} has no {} to save",
            conversation.persona().name(),
            what
        ))),
        Err(e) if e.is_persistence() => {
            log::error!("❌ Failed to save {}: {}", what, e);
            Ok(ToolResult::Escalation(json!({
                "status": "save_failed",
                "error": e.to_string(),
                "say": ConversationTemplates::save_failed(what),
            })))
        }
        Err(e) => Err(ToolError::ExecutionFailed(e.to_string())),
    }
}
