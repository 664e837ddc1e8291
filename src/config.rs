use std::net::SocketAddr;

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite(String),
}

impl StorageBackend {
    /// `memory` selects the process-local store; anything else is a SQLite URL.
    pub fn from_url(url: &str) -> Self {
        if url.eq_ignore_ascii_case("memory") { Self::Memory } else { Self::Sqlite(url.to_string()) }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Reads `DATABASE_URL` and `BIND_ADDR`, loading `.env` first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_vars(std::env::var("DATABASE_URL").ok(), std::env::var("BIND_ADDR").ok())
    }

    pub fn from_vars(database_url: Option<String>, bind_addr: Option<String>) -> anyhow::Result<Self> {
        let database_url = database_url.unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = bind_addr.unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse().with_context(|| format!("invalid BIND_ADDR {bind_addr:?}"))?;
        Ok(Self { storage: StorageBackend::from_url(&database_url), bind_addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::from_vars(None, None).unwrap();
        assert_eq!(config.storage, StorageBackend::Sqlite(DEFAULT_DATABASE_URL.into()));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn memory_backend_and_bad_addr() {
        let config = AppConfig::from_vars(Some("memory".into()), Some("0.0.0.0:8080".into())).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(AppConfig::from_vars(None, Some("not an address".into())).is_err());
    }
}
