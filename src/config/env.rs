use crate::domain::ports::BootContext;
use crate::utils::error::{BootError, Result};
use std::path::Path;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const REDIS_URL: &str = "REDIS_URL";

/// Connection strings that must be present before anything else runs.
#[derive(Debug, Clone)]
pub struct RequiredEnv {
    pub database_url: String,
    pub redis_url: String,
}

impl RequiredEnv {
    /// Read through `lookup`; unset, empty and whitespace-only values are all
    /// treated as missing. `DATABASE_URL` is checked first.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, DATABASE_URL)?;
        let redis_url = required(&lookup, REDIS_URL)?;
        Ok(Self {
            database_url,
            redis_url,
        })
    }

    pub fn into_context(self) -> BootContext {
        BootContext {
            database_url: self.database_url,
            redis_url: self.redis_url,
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BootError::MissingEnvError {
            var: key.to_string(),
        }),
    }
}

/// Load a dotenv file without overriding variables already set.
pub fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path).map_err(|e| BootError::ConfigError {
        message: format!("failed to load env file '{}': {}", path.display(), e),
    })
}
