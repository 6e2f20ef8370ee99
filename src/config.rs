use crate::admin::DEFAULT_PASSCODE;
use crate::state::{MAX_SESSIONS, SESSION_IDLE};
use crate::store::{HitStore, MemoryStore, RestStore, StoreError};
use std::{env, sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Rest { url: String, key: String },
    Memory,
    /// No data service configured; the board runs in preview mode.
    Absent,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreConfig,
    pub admin_passcode: String,
    pub session_idle: Duration,
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(value) => value.parse().unwrap_or_else(|err| {
                warn!("invalid PORT {value:?} ({err}), using 8080");
                8080
            }),
            None => 8080,
        };

        let store = match var("HITBOARD_STORE").as_deref() {
            Some("memory") => StoreConfig::Memory,
            backend => {
                if let Some(other) = backend.filter(|b| *b != "rest") {
                    warn!("unknown HITBOARD_STORE {other:?}, using rest");
                }
                match (var("HITBOARD_STORE_URL"), var("HITBOARD_STORE_KEY")) {
                    (Some(url), Some(key)) => StoreConfig::Rest { url, key },
                    _ => StoreConfig::Absent,
                }
            }
        };

        let admin_passcode = var("HITBOARD_ADMIN_PASSCODE").unwrap_or_else(|| DEFAULT_PASSCODE.to_string());

        let session_idle = match var("HITBOARD_SESSION_IDLE_SECS") {
            Some(value) => value.parse().map(Duration::from_secs).unwrap_or_else(|err| {
                warn!("invalid HITBOARD_SESSION_IDLE_SECS {value:?} ({err}), using default");
                SESSION_IDLE
            }),
            None => SESSION_IDLE,
        };

        let max_sessions = match var("HITBOARD_MAX_SESSIONS") {
            Some(value) => value.parse().unwrap_or_else(|err| {
                warn!("invalid HITBOARD_MAX_SESSIONS {value:?} ({err}), using {MAX_SESSIONS}");
                MAX_SESSIONS
            }),
            None => MAX_SESSIONS,
        };

        Self {
            port,
            store,
            admin_passcode,
            session_idle,
            max_sessions,
        }
    }

    pub fn build_store(&self) -> Result<Option<Arc<dyn HitStore>>, StoreError> {
        let store: Arc<dyn HitStore> = match &self.store {
            StoreConfig::Rest { url, key } => {
                info!("using data service at {url}");
                Arc::new(RestStore::new(url, key)?)
            }
            StoreConfig::Memory => {
                info!("using in-memory data store");
                Arc::new(MemoryStore::new())
            }
            StoreConfig::Absent => {
                warn!("HITBOARD_STORE_URL / HITBOARD_STORE_KEY not set, board is read-only preview");
                return Ok(None);
            }
        };
        Ok(Some(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreConfig::Absent);
        assert_eq!(config.admin_passcode, DEFAULT_PASSCODE);
        assert_eq!(config.session_idle, SESSION_IDLE);
        assert_eq!(config.max_sessions, MAX_SESSIONS);
    }

    #[test]
    fn session_limits_fall_back_on_bad_values() {
        let config = config(&[
            ("HITBOARD_SESSION_IDLE_SECS", "60"),
            ("HITBOARD_MAX_SESSIONS", "lots"),
        ]);
        assert_eq!(config.session_idle, Duration::from_secs(60));
        assert_eq!(config.max_sessions, MAX_SESSIONS);
    }

    #[test]
    fn rest_needs_both_url_and_key() {
        let partial = config(&[("HITBOARD_STORE_URL", "https://db.example")]);
        assert_eq!(partial.store, StoreConfig::Absent);

        let full = config(&[
            ("HITBOARD_STORE_URL", "https://db.example"),
            ("HITBOARD_STORE_KEY", "anon"),
            ("PORT", "9000"),
        ]);
        assert_eq!(full.port, 9000);
        assert_eq!(
            full.store,
            StoreConfig::Rest {
                url: "https://db.example".to_string(),
                key: "anon".to_string()
            }
        );
    }

    #[test]
    fn memory_backend_and_custom_passcode() {
        let config = config(&[("HITBOARD_STORE", "memory"), ("HITBOARD_ADMIN_PASSCODE", "s3cret")]);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.admin_passcode, "s3cret");
        assert!(config.build_store().unwrap().is_some());
    }
}
