pub mod context;
pub mod prompts;
pub mod tools;

// Re-export common types
pub use context::*;
pub use prompts::*;
