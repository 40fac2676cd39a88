//! One active session: the routed persona, its state accumulator and a
//! handle on the shared record store.
//!
//! The conversation runtime drives it through a narrow command surface:
//! [`Conversation::update`], [`Conversation::hear`],
//! [`Conversation::confirm`] and [`Conversation::call_tool`].

use crate::error::{AgentError, Result};
use crate::history;
use crate::llm::context::ConversationContext;
use crate::llm::prompts::SystemPrompts;
use crate::llm::tools::{ToolError, ToolRegistry, ToolResult};
use crate::router::{self, Persona, Service, StateKind};
use crate::session::{LeadState, OrderState, SessionState, UpdateOutcome, WellnessState};
use crate::store::RecordStore;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

const CONTEXT_MAX_TOKENS: usize = 8000;

/// Accumulator owned by the active persona
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveState {
    Stateless,
    Order(OrderState),
    Wellness(WellnessState),
    Lead(LeadState),
}

impl ActiveState {
    fn for_kind(kind: StateKind) -> Self {
        match kind {
            StateKind::Stateless => ActiveState::Stateless,
            StateKind::Order => ActiveState::Order(OrderState::new()),
            StateKind::Wellness => ActiveState::Wellness(WellnessState::new()),
            StateKind::Lead => ActiveState::Lead(LeadState::new()),
        }
    }
}

/// Result of asking to finalize the collected state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Required fields are missing; ask a follow-up question
    Incomplete(Vec<&'static str>),
    /// The record was written
    Saved { path: PathBuf, summary: String },
    /// This state was already persisted; nothing new was written
    AlreadySaved(PathBuf),
    /// The persona does not collect anything
    NothingToSave,
}

pub struct Conversation {
    store: Arc<RecordStore>,
    persona: Persona,
    state: ActiveState,
    context: ConversationContext,
    tools: ToolRegistry,
    history_context: Option<String>,
    saved_to: Option<PathBuf>,
}

impl Conversation {
    /// Route a connection-time service tag and set up the session
    pub fn start(tag: Option<&str>, store: Arc<RecordStore>, max_messages: usize) -> Self {
        let persona = router::route(tag);
        let mut conversation = Self {
            store,
            persona,
            state: ActiveState::Stateless,
            context: ConversationContext::new(max_messages, CONTEXT_MAX_TOKENS),
            tools: ToolRegistry::default(),
            history_context: None,
            saved_to: None,
        };
        conversation.enter(persona);
        conversation
    }

    /// Start from raw room metadata (`{"service": "..."}`)
    pub fn from_metadata(metadata: &str, store: Arc<RecordStore>, max_messages: usize) -> Self {
        let tag = router::service_from_metadata(metadata);
        Self::start(tag.as_deref(), store, max_messages)
    }

    fn enter(&mut self, persona: Persona) {
        self.persona = persona;
        self.state = ActiveState::for_kind(persona.state_kind());
        self.tools = ToolRegistry::for_persona(persona);
        self.saved_to = None;

        self.history_context = match persona {
            Persona::WellnessCompanion => Some(history::context_from_store(&self.store)),
            _ => None,
        };

        let prompt = SystemPrompts::for_persona(persona, self.history_context.as_deref());
        self.context.set_system_message(prompt);

        log::info!(
            "🤖 Conversation running as {} ({} tools)",
            persona.name(),
            self.tools.get_tools().len()
        );
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn state(&self) -> &ActiveState {
        &self.state
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn transcript(&self) -> &ConversationContext {
        &self.context
    }

    pub fn system_message(&self) -> &str {
        self.context.system_message().unwrap_or_default()
    }

    /// Context to emit when the session opens; only check-ins have one
    pub fn opening_context(&self) -> Option<&str> {
        self.history_context.as_deref()
    }

    /// Path of the record written for the current state, if any
    pub fn saved_to(&self) -> Option<&PathBuf> {
        self.saved_to.as_ref()
    }

    /// Switch a receptionist session to the chosen service.
    ///
    /// Only allowed once, while no service has been chosen.
    pub fn select_service(&mut self, service: Service) -> Result<Persona> {
        if self.persona != Persona::Receptionist {
            return Err(AgentError::General(format!(
                "service already selected: {}",
                self.persona.name()
            )));
        }

        log::info!("🧭 Routing caller to {}", service);
        let persona = Persona::from(service);
        self.enter(persona);
        Ok(persona)
    }

    pub fn update(&mut self, field: &str, value: &str) -> UpdateOutcome {
        if self.saved_to.is_some() {
            return UpdateOutcome::Ignored(
                "this one is already saved; start a new one first".to_string(),
            );
        }

        let outcome = match self.state {
            ActiveState::Order(ref mut order) => order.update(field, value),
            ActiveState::Wellness(ref mut wellness) => wellness.update(field, value),
            ActiveState::Lead(ref mut lead) => lead.update(field, value),
            ActiveState::Stateless => {
                UpdateOutcome::Ignored(format!("{} does not collect fields", self.persona.name()))
            }
        };

        match outcome {
            UpdateOutcome::Applied => log::debug!("Updated {} = '{}'", field, value),
            UpdateOutcome::Ignored(ref reason) => {
                log::debug!("Ignored update {} = '{}': {}", field, value, reason)
            }
        }
        outcome
    }

    /// Feed a transcribed user utterance into the session.
    ///
    /// The barista pulls menu keywords straight out of the text; other
    /// personas only record it. Returns the names of updated fields.
    pub fn hear(&mut self, utterance: &str) -> Vec<String> {
        self.context.add_user_message(utterance);

        if self.saved_to.is_some() {
            return Vec::new();
        }

        match self.state {
            ActiveState::Order(ref mut order) => order
                .update_from_text(utterance)
                .into_iter()
                .map(|field| field.to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Record what the agent said back
    pub fn say(&mut self, text: impl Into<String>) {
        self.context.add_assistant_message(text);
    }

    pub fn is_complete(&self) -> bool {
        match self.state {
            ActiveState::Order(ref order) => order.is_complete(),
            ActiveState::Wellness(ref wellness) => wellness.is_complete(),
            ActiveState::Lead(ref lead) => lead.is_complete(),
            ActiveState::Stateless => false,
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        match self.state {
            ActiveState::Order(ref order) => order.missing_fields(),
            ActiveState::Wellness(ref wellness) => wellness.missing_fields(),
            ActiveState::Lead(ref lead) => lead.missing_fields(),
            ActiveState::Stateless => Vec::new(),
        }
    }

    pub fn summary(&self) -> String {
        match self.state {
            ActiveState::Order(ref order) => order.summary(),
            ActiveState::Wellness(ref wellness) => wellness.summary(),
            ActiveState::Lead(ref lead) => lead.summary(),
            ActiveState::Stateless => String::new(),
        }
    }

    /// Persist the collected state if it is complete.
    ///
    /// A failed write leaves the state untouched so the caller can retry.
    pub fn confirm(&mut self) -> Result<ConfirmOutcome> {
        if let Some(ref path) = self.saved_to {
            return Ok(ConfirmOutcome::AlreadySaved(path.clone()));
        }

        let missing = self.missing_fields();
        if !missing.is_empty() {
            log::info!("📝 Not ready to save, missing: {}", missing.join(", "));
            return Ok(ConfirmOutcome::Incomplete(missing));
        }

        let path = match self.state {
            ActiveState::Order(ref order) => self.store.save_order(&order.to_record())?,
            ActiveState::Wellness(ref wellness) => {
                self.store.save_checkin(&wellness.to_record())?
            }
            ActiveState::Lead(ref lead) => self.store.save_lead(&lead.to_record())?,
            ActiveState::Stateless => return Ok(ConfirmOutcome::NothingToSave),
        };

        self.saved_to = Some(path.clone());
        Ok(ConfirmOutcome::Saved {
            path,
            summary: self.summary(),
        })
    }

    /// Drop the collected state and start collecting afresh
    pub fn reset(&mut self) {
        self.state = ActiveState::for_kind(self.persona.state_kind());
        self.saved_to = None;
    }

    pub(crate) fn order_mut(&mut self) -> Option<&mut OrderState> {
        match self.state {
            ActiveState::Order(ref mut order) => Some(order),
            _ => None,
        }
    }

    pub(crate) fn wellness_mut(&mut self) -> Option<&mut WellnessState> {
        match self.state {
            ActiveState::Wellness(ref mut wellness) => Some(wellness),
            _ => None,
        }
    }

    pub(crate) fn lead_mut(&mut self) -> Option<&mut LeadState> {
        match self.state {
            ActiveState::Lead(ref mut lead) => Some(lead),
            _ => None,
        }
    }

    pub(crate) fn is_saved(&self) -> bool {
        self.saved_to.is_some()
    }

    /// Execute an LLM function call against this session
    pub fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> std::result::Result<ToolResult, ToolError> {
        let persona = self.persona;
        let tools = std::mem::take(&mut self.tools);
        let result = tools.execute_tool(self, name, arguments);

        // A routing call installs the new persona's registry; keep it
        if self.persona == persona {
            self.tools = tools;
        }

        if let Ok(ToolResult::Success(Some(ref text))) = result {
            self.say(text.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Arc<RecordStore> {
        Arc::new(RecordStore::new(StoreConfig::rooted_at(dir.path())))
    }

    #[test]
    fn test_coffee_session_end_to_end() {
        let dir = TempDir::new().unwrap();
        let mut conversation = Conversation::start(Some("coffee"), store(&dir), 20);
        assert_eq!(conversation.persona(), Persona::Barista);
        assert!(conversation.opening_context().is_none());

        conversation.update("drinkType", "Latte");
        conversation.update("size", "medium");
        conversation.update("milk", "oat");
        assert_eq!(
            conversation.confirm().unwrap(),
            ConfirmOutcome::Incomplete(vec!["name"])
        );

        conversation.update("customerName", "Alex");
        assert!(conversation.is_complete());

        let outcome = conversation.confirm().unwrap();
        let ConfirmOutcome::Saved { path, summary } = outcome else {
            panic!("expected the order to be saved");
        };
        assert!(path.exists());
        assert_eq!(summary, "medium Latte with oat milk for Alex");

        assert_eq!(
            conversation.confirm().unwrap(),
            ConfirmOutcome::AlreadySaved(path)
        );
        assert!(!conversation.update("milk", "soy").is_applied());
    }

    #[test]
    fn test_reset_after_save_allows_another_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut conversation = Conversation::start(Some("coffee"), store.clone(), 20);

        conversation.hear("a small espresso please, name's Jo");
        conversation.update("name", "Jo");
        assert!(matches!(
            conversation.confirm().unwrap(),
            ConfirmOutcome::Saved { .. }
        ));

        conversation.reset();
        assert!(!conversation.is_complete());
        conversation.hear("large mocha");
        conversation.update("name", "Jo");
        assert!(matches!(
            conversation.confirm().unwrap(),
            ConfirmOutcome::Saved { .. }
        ));
        assert_eq!(store.load_orders().len(), 2);
    }

    #[test]
    fn test_wellness_session_uses_history() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut first = Conversation::start(Some("wellness"), store.clone(), 20);
        assert_eq!(first.opening_context(), Some(history::FIRST_CHECKIN));

        first.update("mood", "drained");
        first.update("energy_level", "low");
        first.update("objectives", "sleep early");
        assert!(matches!(first.confirm().unwrap(), ConfirmOutcome::Saved { .. }));

        let second = Conversation::start(Some("wellness"), store, 20);
        let context = second.opening_context().unwrap();
        assert!(context.contains("drained"));
        assert!(context.contains("low"));
        assert!(second.system_message().contains("drained"));
    }

    #[test]
    fn test_sales_session_saves_lead() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut conversation = Conversation::start(Some("sdr"), store.clone(), 20);
        assert_eq!(conversation.persona(), Persona::SalesRep);

        conversation.update("name", "Priya");
        conversation.update("company", "Acme");
        conversation.update("email", "priya@acme.example");
        assert_eq!(
            conversation.confirm().unwrap(),
            ConfirmOutcome::Incomplete(vec!["role", "use case"])
        );

        conversation.update("role", "CTO");
        conversation.update("useCase", "analytics");
        let ConfirmOutcome::Saved { path, summary } = conversation.confirm().unwrap() else {
            panic!("expected the lead to be saved");
        };
        assert!(path.starts_with(&store.config().leads_dir));
        assert_eq!(summary, "Priya, CTO at Acme, interested in analytics");
    }

    #[test]
    fn test_stateless_personas() {
        let dir = TempDir::new().unwrap();
        let mut conversation = Conversation::start(Some("chat"), store(&dir), 20);
        assert!(!conversation.update("mood", "good").is_applied());
        assert_eq!(conversation.confirm().unwrap(), ConfirmOutcome::NothingToSave);

        let receptionist = Conversation::start(Some("xyz"), store(&dir), 20);
        assert_eq!(receptionist.persona(), Persona::Receptionist);
        assert_eq!(receptionist.state(), &ActiveState::Stateless);
    }

    #[test]
    fn test_select_service_only_from_receptionist() {
        let dir = TempDir::new().unwrap();
        let mut conversation = Conversation::start(None, store(&dir), 20);

        let persona = conversation.select_service(Service::Wellness).unwrap();
        assert_eq!(persona, Persona::WellnessCompanion);
        assert!(matches!(conversation.state(), ActiveState::Wellness(_)));
        assert!(conversation.opening_context().is_some());

        assert!(conversation.select_service(Service::Coffee).is_err());
    }

    #[test]
    fn test_from_metadata() {
        let dir = TempDir::new().unwrap();
        let conversation =
            Conversation::from_metadata(r#"{"service":"coffee"}"#, store(&dir), 20);
        assert_eq!(conversation.persona(), Persona::Barista);
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("orders");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = Arc::new(RecordStore::new(StoreConfig::new(
            &blocker,
            dir.path().join("log.json"),
        )));

        let mut conversation = Conversation::start(Some("coffee"), store, 20);
        conversation.update("drink", "Latte");
        conversation.update("size", "small");
        conversation.update("name", "Alex");

        let err = conversation.confirm().unwrap_err();
        assert!(err.is_persistence());
        assert!(conversation.is_complete());
        assert!(conversation.saved_to().is_none());
    }
}
