use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "FEED_TREE_HTTP_ADDR";
pub const DB_PATH_VAR: &str = "FEED_TREE_DB";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "feed_tree=info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// SQLite file backing the served feed. In-memory only when unset.
    pub db_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_addr = lookup(HTTP_ADDR_VAR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let addr = raw_addr
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAddr {
                var: HTTP_ADDR_VAR,
                value: raw_addr.clone(),
                source,
            })?;

        let db_path = match lookup(DB_PATH_VAR) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty { var: DB_PATH_VAR });
            }
            Some(value) => Some(PathBuf::from(value.trim())),
            None => None,
        };

        Ok(Self { addr, db_path })
    }
}
