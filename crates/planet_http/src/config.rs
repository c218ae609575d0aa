//! Server configuration.
//!
//! Two keys are read from the environment:
//! - `PLANET_API_DB_PATH`: SQLite file path, or `:memory:`.
//! - `PLANET_API_ADDR`: listen address, e.g. `0.0.0.0:8080`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "PLANET_API_DB_PATH";
pub const ADDR_ENV: &str = "PLANET_API_ADDR";

const DEFAULT_DB_FILE_NAME: &str = "planet_api.sqlite3";
const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const MEMORY_DB: &str = ":memory:";

/// Where the planet store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl Display for DbLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, "{MEMORY_DB}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidAddr { value: String, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddr { value, reason } => {
                write!(f, "invalid {ADDR_ENV} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings consumed by the HTTP server at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db: DbLocation,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    /// Loads configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values fall back to
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db = match non_blank(lookup(DB_PATH_ENV)) {
            Some(value) if value == MEMORY_DB => DbLocation::Memory,
            Some(value) => DbLocation::File(PathBuf::from(value)),
            None => DbLocation::File(std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
        };

        let raw_addr = non_blank(lookup(ADDR_ENV)).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|err| ConfigError::InvalidAddr {
                value: raw_addr.clone(),
                reason: err.to_string(),
            })?;

        Ok(Self { db, bind_addr })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DbLocation, ServerConfig, ADDR_ENV, DB_PATH_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_keys_are_missing_or_blank() {
        let config = ServerConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, "  ")])).unwrap();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(matches!(config.db, DbLocation::File(ref path) if path.ends_with("planet_api.sqlite3")));
    }

    #[test]
    fn explicit_values_are_used() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (DB_PATH_ENV, "/var/lib/planets.db"),
            (ADDR_ENV, "0.0.0.0:9000"),
        ]))
        .unwrap();

        assert_eq!(
            config.db,
            DbLocation::File(PathBuf::from("/var/lib/planets.db"))
        );
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn memory_marker_selects_in_memory_store() {
        let config = ServerConfig::from_lookup(lookup_from(&[(DB_PATH_ENV, ":memory:")])).unwrap();
        assert_eq!(config.db, DbLocation::Memory);
    }

    #[test]
    fn unparsable_address_is_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[(ADDR_ENV, "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddr { ref value, .. } if value == "localhost"));
    }
}
