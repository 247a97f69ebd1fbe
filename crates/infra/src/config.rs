//! Service configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PRICING_BIND_ADDR` | `0.0.0.0:8080` |
//! | `USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

/// Where prices are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the process env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup("PRICING_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "PRICING_BIND_ADDR",
                reason: e.to_string(),
            })?;

        let persistent = match lookup("USE_PERSISTENT_STORES") {
            Some(raw) => raw
                .trim()
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|e| ConfigError::Invalid {
                    var: "USE_PERSISTENT_STORES",
                    reason: e.to_string(),
                })?,
            None => false,
        };

        let backend = if persistent {
            let database_url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got {raw:?}"),
                    })?,
                None => DEFAULT_MAX_CONNECTIONS,
            };
            StoreBackend::Postgres {
                database_url,
                max_connections,
            }
        } else {
            StoreBackend::InMemory
        };

        Ok(Self { bind_addr, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_in_memory_on_port_8080() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.bind_addr, DEFAULT_BIND_ADDR.parse().unwrap());
        assert_eq!(cfg.backend, StoreBackend::InMemory);
    }

    #[test]
    fn persistent_requires_database_url() {
        let err = load(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn persistent_with_url_selects_postgres() {
        let cfg = load(&[
            ("USE_PERSISTENT_STORES", "TRUE"),
            ("DATABASE_URL", "postgres://localhost/pricing"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("PRICING_BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(
            cfg.backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/pricing".into(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn database_settings_are_ignored_when_not_persistent() {
        let cfg = load(&[("DATABASE_URL", "postgres://ignored")]).unwrap();
        assert_eq!(cfg.backend, StoreBackend::InMemory);
    }

    #[test]
    fn bad_values_name_the_variable() {
        assert!(matches!(
            load(&[("PRICING_BIND_ADDR", "nope")]),
            Err(ConfigError::Invalid { var: "PRICING_BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("USE_PERSISTENT_STORES", "yes")]),
            Err(ConfigError::Invalid { var: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            load(&[
                ("USE_PERSISTENT_STORES", "true"),
                ("DATABASE_URL", "postgres://x"),
                ("DATABASE_MAX_CONNECTIONS", "0"),
            ]),
            Err(ConfigError::Invalid { var: "DATABASE_MAX_CONNECTIONS", .. })
        ));
    }
}
