use super::{apply_update, confirm_into_result, required_argument, text_argument};
use super::{Tool, ToolError, ToolRegistry, ToolResult};
use crate::conversation::Conversation;
use crate::llm::prompts::ConversationTemplates;
use crate::session::{LeadField, UpdateOutcome};
use serde_json::{json, Value};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register_tool(Tool {
        name: "update_lead".to_string(),
        description: "Record one detail about the prospect as soon as they share it, or a question they asked."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "enum": ["name", "company", "email", "role", "useCase", "teamSize", "timeline", "questionsAsked", "answersProvided"],
                    "description": "Which detail this is"
                },
                "value": {
                    "type": "string",
                    "description": "The value as the prospect said it"
                }
            },
            "required": ["field", "value"]
        }),
    });

    registry.register_tool(Tool {
        name: "complete_lead".to_string(),
        description: "Save the lead once you have their name, company, email, role and use case.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "The prospect's full name"},
                "company": {"type": "string", "description": "The company they work for"},
                "email": {"type": "string", "description": "Their business email address"},
                "role": {"type": "string", "description": "Their job title"},
                "use_case": {"type": "string", "description": "What they want to use our services for"},
                "team_size": {"type": "string", "description": "Optional size of their team"},
                "timeline": {"type": "string", "description": "Optional start timeline, e.g. \"next quarter\""}
            },
            "required": ["name", "company", "email", "role", "use_case"]
        }),
    });
}

pub fn update_lead(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    apply_update(conversation, arguments)
}

/// Fill in the lead from the final function call and save it
pub fn complete_lead(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let name = required_argument(arguments, "name")?;
    let company = required_argument(arguments, "company")?;
    let email = required_argument(arguments, "email")?;
    let role = required_argument(arguments, "role")?;
    let use_case = required_argument(arguments, "use_case")?;
    let team_size = text_argument(arguments, "team_size");
    let timeline = text_argument(arguments, "timeline");

    if conversation.is_saved() {
        return confirm_into_result(conversation, "details", ConversationTemplates::lead_saved);
    }

    let lead = conversation
        .lead_mut()
        .ok_or_else(|| ToolError::ExecutionFailed("no lead in progress".to_string()))?;

    let mut rejected = Vec::new();
    for (field, value) in [
        (LeadField::Name, Some(name)),
        (LeadField::Company, Some(company)),
        (LeadField::Email, Some(email)),
        (LeadField::Role, Some(role)),
        (LeadField::UseCase, Some(use_case)),
        (LeadField::TeamSize, team_size),
        (LeadField::Timeline, timeline),
    ] {
        if let Some(value) = value {
            if let UpdateOutcome::Ignored(reason) = lead.set(field, &value) {
                rejected.push(reason);
            }
        }
    }

    if !rejected.is_empty() {
        let say = ConversationTemplates::rejected(&rejected);
        return Ok(ToolResult::Escalation(json!({
            "status": "invalid",
            "reasons": rejected,
            "say": say,
        })));
    }

    confirm_into_result(conversation, "details", ConversationTemplates::lead_saved)
}
