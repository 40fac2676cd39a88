use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const ORDERS_DIR_VAR: &str = "NERO_ORDERS_DIR";
pub const WELLNESS_LOG_VAR: &str = "NERO_WELLNESS_LOG";
pub const LEADS_DIR_VAR: &str = "NERO_LEADS_DIR";
pub const CONTEXT_MAX_MESSAGES_VAR: &str = "NERO_CONTEXT_MAX_MESSAGES";

const DEFAULT_ORDERS_DIR: &str = "orders";
const DEFAULT_WELLNESS_LOG: &str = "wellness_log.json";
const DEFAULT_LEADS_DIR: &str = "leads";
const DEFAULT_CONTEXT_MAX_MESSAGES: usize = 20;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("Environment error: {0}")]
    EnvError(#[from] env::VarError),
}

/// Where finished records are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding one `order_<timestamp>.json` per completed order
    pub orders_dir: PathBuf,
    /// Single JSON array file holding every wellness check-in
    pub wellness_log: PathBuf,
    /// Directory holding one `lead_<timestamp>.json` per captured sales lead
    pub leads_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(orders_dir: impl Into<PathBuf>, wellness_log: impl Into<PathBuf>) -> Self {
        Self {
            orders_dir: orders_dir.into(),
            wellness_log: wellness_log.into(),
            leads_dir: PathBuf::from(DEFAULT_LEADS_DIR),
        }
    }

    /// Lay every store out under one base directory
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            orders_dir: base.join(DEFAULT_ORDERS_DIR),
            wellness_log: base.join(DEFAULT_WELLNESS_LOG),
            leads_dir: base.join(DEFAULT_LEADS_DIR),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ORDERS_DIR, DEFAULT_WELLNESS_LOG)
    }
}

/// Runtime configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub store: StoreConfig,
    /// Upper bound on transcript turns kept in the conversation window
    pub context_max_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            context_max_messages: DEFAULT_CONTEXT_MAX_MESSAGES,
        }
    }
}

impl AgentConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = non_empty(lookup(ORDERS_DIR_VAR)) {
            config.store.orders_dir = PathBuf::from(dir);
        }

        if let Some(path) = non_empty(lookup(WELLNESS_LOG_VAR)) {
            config.store.wellness_log = PathBuf::from(path);
        }

        if let Some(dir) = non_empty(lookup(LEADS_DIR_VAR)) {
            config.store.leads_dir = PathBuf::from(dir);
        }

        if let Some(raw) = non_empty(lookup(CONTEXT_MAX_MESSAGES_VAR)) {
            let parsed: usize = raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: CONTEXT_MAX_MESSAGES_VAR.to_string(),
                reason: format!("'{}' is not a positive integer", raw),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    var: CONTEXT_MAX_MESSAGES_VAR.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
            config.context_max_messages = parsed;
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load configuration with helpful error messages for development
pub fn load_config() -> Result<AgentConfig, ConfigError> {
    match AgentConfig::load() {
        Ok(config) => {
            log::info!(
                "Loaded configuration (orders: {}, wellness log: {}, leads: {})",
                config.store.orders_dir.display(),
                config.store.wellness_log.display(),
                config.store.leads_dir.display()
            );
            Ok(config)
        }
        Err(ConfigError::InvalidValue { var, reason }) => {
            log::error!("Invalid value for {}: {}", var, reason);
            log::error!("Fix or remove {} in your environment or .env file", var);
            Err(ConfigError::InvalidValue { var, reason })
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = AgentConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.store, StoreConfig::default());
        assert_eq!(config.context_max_messages, 20);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = AgentConfig::from_lookup(lookup_from(&[
            (ORDERS_DIR_VAR, "/tmp/orders"),
            (WELLNESS_LOG_VAR, "/tmp/log.json"),
            (LEADS_DIR_VAR, "/tmp/leads"),
            (CONTEXT_MAX_MESSAGES_VAR, "8"),
        ]))
        .unwrap();

        assert_eq!(config.store.leads_dir, PathBuf::from("/tmp/leads"));
        assert_eq!(config.store.orders_dir, PathBuf::from("/tmp/orders"));
        assert_eq!(config.store.wellness_log, PathBuf::from("/tmp/log.json"));
        assert_eq!(config.context_max_messages, 8);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AgentConfig::from_lookup(lookup_from(&[(ORDERS_DIR_VAR, "  ")])).unwrap();
        assert_eq!(config.store.orders_dir, PathBuf::from("orders"));
    }

    #[test]
    fn test_invalid_context_size() {
        let err = AgentConfig::from_lookup(lookup_from(&[(CONTEXT_MAX_MESSAGES_VAR, "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AgentConfig::from_lookup(lookup_from(&[(CONTEXT_MAX_MESSAGES_VAR, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rooted_at() {
        let config = StoreConfig::rooted_at("/data");
        assert_eq!(config.orders_dir, PathBuf::from("/data/orders"));
        assert_eq!(config.wellness_log, PathBuf::from("/data/wellness_log.json"));
        assert_eq!(config.leads_dir, PathBuf::from("/data/leads"));
    }
}
