use super::{apply_update, confirm_into_result, required_argument, text_argument};
use super::{Tool, ToolError, ToolRegistry, ToolResult};
use crate::conversation::Conversation;
use crate::llm::prompts::ConversationTemplates;
use crate::session::{OrderField, UpdateOutcome};
use serde_json::{json, Value};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register_tool(Tool {
        name: "update_order".to_string(),
        description: "Record one detail of the customer's order as soon as they mention it."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "enum": ["drinkType", "size", "milk", "extras", "customerName"],
                    "description": "Which part of the order this is"
                },
                "value": {
                    "type": "string",
                    "description": "The value, e.g. \"Latte\", \"medium\", \"oat milk\", \"vanilla syrup\" or the customer's name"
                }
            },
            "required": ["field", "value"]
        }),
    });

    registry.register_tool(Tool {
        name: "complete_order".to_string(),
        description: "Finalize and save the order once the customer has confirmed it. Requires drink, size and name.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "drink_type": {"type": "string", "description": "The drink ordered, e.g. \"Latte\""},
                "size": {"type": "string", "enum": ["small", "medium", "large"]},
                "milk": {"type": "string", "description": "Milk preference, e.g. \"oat milk\""},
                "name": {"type": "string", "description": "The customer's name for the order"},
                "extras": {"type": "string", "description": "Optional comma-separated extras"}
            },
            "required": ["drink_type", "size", "name"]
        }),
    });
}

pub fn update_order(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    apply_update(conversation, arguments)
}

/// Fill in the order from the final function call and save it
pub fn complete_order(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let drink = required_argument(arguments, "drink_type")?;
    let size = required_argument(arguments, "size")?;
    let name = required_argument(arguments, "name")?;
    let milk = text_argument(arguments, "milk");
    let extras = text_argument(arguments, "extras");

    // A second complete_order in the same session is a new order
    if conversation.is_saved() {
        conversation.reset();
    }

    let order = conversation
        .order_mut()
        .ok_or_else(|| ToolError::ExecutionFailed("no order in progress".to_string()))?;

    let mut rejected = Vec::new();
    for (field, value) in [
        (OrderField::DrinkType, Some(drink)),
        (OrderField::Size, Some(size)),
        (OrderField::CustomerName, Some(name)),
        (OrderField::Milk, milk),
    ] {
        if let Some(value) = value {
            if let UpdateOutcome::Ignored(reason) = order.set(field, &value) {
                rejected.push(reason);
            }
        }
    }
    if let Some(extras) = extras {
        order.set_extras(&extras);
    }

    if !rejected.is_empty() {
        let say = ConversationTemplates::rejected(&rejected);
        return Ok(ToolResult::Escalation(json!({
            "status": "invalid",
            "reasons": rejected,
            "say": say,
        })));
    }

    confirm_into_result(conversation, "order", ConversationTemplates::order_saved)
}
