//! Conversation state, persistence and routing for the Nero voice agent.
//!
//! A connection arrives with a service tag; the [`router`] picks a persona,
//! a [`Conversation`](conversation::Conversation) owns that persona's state
//! accumulator from [`session`], function calls from the LLM fill it in via
//! [`llm::tools`], and the [`store`] persists finished orders, leads and
//! check-ins.
//! [`history`] turns past check-ins into priming context for the next one.

pub mod config;
pub mod conversation;
pub mod error;
pub mod history;
pub mod llm;
pub mod router;
pub mod session;
pub mod store;

// Re-export common types
pub use conversation::{ConfirmOutcome, Conversation};
pub use error::{AgentError, Result};
pub use router::{Persona, Service};
pub use store::RecordStore;
