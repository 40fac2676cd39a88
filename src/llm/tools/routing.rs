use super::{required_argument, Tool, ToolError, ToolRegistry, ToolResult};
use crate::conversation::Conversation;
use crate::llm::prompts::ConversationTemplates;
use crate::router::Service;
use serde_json::{json, Value};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register_tool(Tool {
        name: "route_to_service".to_string(),
        description: "Switch to the service the user chose.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "service": {
                    "type": "string",
                    "enum": Service::tags(),
                    "description": "The service to route to"
                }
            },
            "required": ["service"]
        }),
    });
}

pub fn route_to_service(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let requested = required_argument(arguments, "service")?;

    let Some(service) = Service::parse(&requested) else {
        let say = ConversationTemplates::unknown_service(&Service::tags());
        return Ok(ToolResult::Escalation(json!({
            "status": "unknown_service",
            "service": requested,
            "say": say,
        })));
    };

    let persona = conversation
        .select_service(service)
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

    Ok(ToolResult::Success(Some(
        ConversationTemplates::service_selected(persona),
    )))
}
