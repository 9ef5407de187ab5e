//! Server configuration from environment variables.
//!
//!   GRIEVANCE_BIND_ADDR          - listen address (default: 0.0.0.0:4200)
//!   GRIEVANCE_STORE              - `postgres` (default) or `memory`
//!   DATABASE_URL                 - Postgres connection string (required for postgres)
//!   DATABASE_POOL_SIZE           - max pool connections (default: 10)
//!   GRIEVANCE_TRANSITION_POLICY  - `permissive` (default) or `forward_only`
//!   GRIEVANCE_RUN_MIGRATIONS     - apply embedded migrations on startup (default: true)

use anyhow::{anyhow, bail, Result};
use grievance_core::TransitionPolicy;
use grievance_postgres::DatabaseConfig;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4200";

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Postgres(DatabaseConfig),
    /// Process-local store seeded with campus reference data.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub policy: TransitionPolicy,
    pub run_migrations: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("GRIEVANCE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());

        let policy = match lookup("GRIEVANCE_TRANSITION_POLICY") {
            Some(raw) => raw
                .parse::<TransitionPolicy>()
                .map_err(|e| anyhow!("GRIEVANCE_TRANSITION_POLICY: {e}"))?,
            None => TransitionPolicy::default(),
        };

        let run_migrations = match lookup("GRIEVANCE_RUN_MIGRATIONS").as_deref() {
            None => true,
            Some("1" | "true" | "yes") => true,
            Some("0" | "false" | "no") => false,
            Some(other) => bail!("GRIEVANCE_RUN_MIGRATIONS: expected true/false, got '{other}'"),
        };

        let store = match lookup("GRIEVANCE_STORE").as_deref().unwrap_or("postgres") {
            "memory" => StoreBackend::Memory,
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .ok_or_else(|| anyhow!("DATABASE_URL must be set when GRIEVANCE_STORE=postgres"))?;
                let max_connections = match lookup("DATABASE_POOL_SIZE") {
                    Some(raw) => raw
                        .parse::<u32>()
                        .map_err(|e| anyhow!("DATABASE_POOL_SIZE: {e}"))?,
                    None => 10,
                };
                StoreBackend::Postgres(DatabaseConfig {
                    database_url,
                    max_connections,
                    ..DatabaseConfig::default()
                })
            }
            other => bail!("GRIEVANCE_STORE: expected postgres or memory, got '{other}'"),
        };

        Ok(Self {
            bind_addr,
            store,
            policy,
            run_migrations,
        })
    }
}
