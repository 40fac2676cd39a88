use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Failed to persist record to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Wrap an I/O failure that happened while writing `path`
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AgentError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// True when a save attempt failed and the caller should apologise and retry
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            AgentError::Persistence { .. } | AgentError::Serialization(_)
        )
    }
}
