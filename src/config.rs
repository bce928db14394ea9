use std::net::SocketAddr;

use crate::error::{AppError, Result};

pub const DEFAULT_YEAR: i32 = 2024;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub default_year: i32,
    pub cors_allowed_origins: Vec<String>,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment. A `.env` file, if any, should already
    /// have been loaded.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AppError::config("DATABASE_URL must be set to a Postgres instance"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::config(format!("invalid BIND_ADDR: {e}")))?;

        let default_year = match lookup("DEFAULT_YEAR") {
            Some(value) => value
                .trim()
                .parse::<i32>()
                .map_err(|e| AppError::config(format!("invalid DEFAULT_YEAR: {e}")))?,
            None => DEFAULT_YEAR,
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .map_err(|e| AppError::config(format!("invalid DB_MAX_CONNECTIONS: {e}")))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            database_url,
            bind_addr,
            default_year,
            cors_allowed_origins,
            max_connections,
        })
    }
}
