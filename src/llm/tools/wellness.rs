use super::{apply_update, confirm_into_result, required_argument, text_argument};
use super::{Tool, ToolError, ToolRegistry, ToolResult};
use crate::conversation::Conversation;
use crate::llm::prompts::ConversationTemplates;
use crate::session::{UpdateOutcome, WellnessField};
use serde_json::{json, Value};

pub(super) fn register(registry: &mut ToolRegistry) {
    registry.register_tool(Tool {
        name: "update_checkin".to_string(),
        description: "Record one part of today's check-in as soon as the user shares it."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "enum": ["mood", "energyLevel", "stressFactors", "objectives", "selfCareIntentions"],
                    "description": "Which part of the check-in this is"
                },
                "value": {
                    "type": "string",
                    "description": "The value; energy is high, medium or low; objectives may be comma-separated"
                }
            },
            "required": ["field", "value"]
        }),
    });

    registry.register_tool(Tool {
        name: "complete_checkin".to_string(),
        description: "Save the check-in after recapping it with the user. Requires mood, energy level and at least one objective.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "mood": {"type": "string", "description": "e.g. \"good\", \"tired\", \"anxious but hopeful\""},
                "energy_level": {"type": "string", "enum": ["high", "medium", "low"]},
                "objectives": {"type": "string", "description": "Comma-separated list of 1-3 things to accomplish today"},
                "stress_factors": {"type": "string", "description": "Optional description of what is stressing them"},
                "self_care_intentions": {"type": "string", "description": "Optional self-care plans"}
            },
            "required": ["mood", "energy_level", "objectives"]
        }),
    });
}

pub fn update_checkin(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    apply_update(conversation, arguments)
}

/// Fill in the check-in from the final function call and append it to the log
pub fn complete_checkin(
    conversation: &mut Conversation,
    arguments: &Value,
) -> Result<ToolResult, ToolError> {
    let mood = required_argument(arguments, "mood")?;
    let energy = required_argument(arguments, "energy_level")?;
    let objectives = required_argument(arguments, "objectives")?;
    let stress = text_argument(arguments, "stress_factors");
    let self_care = text_argument(arguments, "self_care_intentions");

    if conversation.is_saved() {
        return confirm_into_result(conversation, "check-in", ConversationTemplates::checkin_saved);
    }

    let wellness = conversation
        .wellness_mut()
        .ok_or_else(|| ToolError::ExecutionFailed("no check-in in progress".to_string()))?;

    wellness.set_objectives(&objectives);

    let mut rejected = Vec::new();
    for (field, value) in [
        (WellnessField::Mood, Some(mood)),
        (WellnessField::EnergyLevel, Some(energy)),
        (WellnessField::StressFactors, stress),
        (WellnessField::SelfCareIntentions, self_care),
    ] {
        if let Some(value) = value {
            if let UpdateOutcome::Ignored(reason) = wellness.set(field, &value) {
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

    confirm_into_result(conversation, "check-in", ConversationTemplates::checkin_saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::RecordStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn companion(dir: &TempDir) -> (Conversation, Arc<RecordStore>) {
        let store = Arc::new(RecordStore::new(StoreConfig::rooted_at(dir.path())));
        (
            Conversation::start(Some("wellness"), store.clone(), 20),
            store,
        )
    }

    #[test]
    fn test_complete_checkin_appends_to_log() {
        let dir = TempDir::new().unwrap();
        let (mut conversation, store) = companion(&dir);

        let result = conversation
            .call_tool(
                "complete_checkin",
                json!({
                    "mood": "a bit tired",
                    "energy_level": "Low",
                    "objectives": ["finish slides", "call mum"],
                    "stress_factors": "deadline"
                }),
            )
            .unwrap();

        let ToolResult::Success(Some(reply)) = result else {
            panic!("expected a spoken confirmation");
        };
        assert!(reply.contains("Mood: a bit tired"));

        let last = store.load_last().unwrap();
        assert_eq!(last.mood.as_deref(), Some("a bit tired"));
        assert_eq!(last.objectives, vec!["finish slides", "call mum"]);
        assert_eq!(
            last.agent_summary,
            "User feeling a bit tired with low energy. Stressed about: deadline."
        );
    }

    #[test]
    fn test_second_complete_does_not_duplicate() {
        let dir = TempDir::new().unwrap();
        let (mut conversation, store) = companion(&dir);
        let args = json!({"mood": "fine", "energy_level": "medium", "objectives": "walk"});

        conversation.call_tool("complete_checkin", args.clone()).unwrap();
        conversation.call_tool("complete_checkin", args).unwrap();

        assert_eq!(store.load_history().len(), 1);
    }

    #[test]
    fn test_update_checkin_then_confirm() {
        let dir = TempDir::new().unwrap();
        let (mut conversation, store) = companion(&dir);

        for (field, value) in [
            ("mood", "upbeat"),
            ("energyLevel", "high"),
            ("objectives", "run 5k"),
        ] {
            conversation
                .call_tool("update_checkin", json!({"field": field, "value": value}))
                .unwrap();
        }

        assert!(conversation.is_complete());
        conversation.confirm().unwrap();
        assert_eq!(store.load_last().unwrap().mood.as_deref(), Some("upbeat"));
    }

    #[test]
    fn test_invalid_energy_is_escalated() {
        let dir = TempDir::new().unwrap();
        let (mut conversation, store) = companion(&dir);

        let result = conversation
            .call_tool(
                "complete_checkin",
                json!({"mood": "ok", "energy_level": "sky high", "objectives": "rest"}),
            )
            .unwrap();

        let ToolResult::Escalation(details) = result else {
            panic!("expected escalation for an unknown energy level");
        };
        assert_eq!(details["status"], "invalid");
        assert!(details["say"].as_str().unwrap().contains("sky high"));
        assert!(store.load_history().is_empty());
    }
}
