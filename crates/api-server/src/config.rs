//! Server configuration read from the environment

use std::path::PathBuf;

use anyhow::{bail, Context};
use tasknest_core::identity::{DirectorySettings, DEFAULT_JWT_SECRET, DEFAULT_TOKEN_TTL_SECONDS};

pub const DEFAULT_DATA_DIR: &str = ".tasknest-data";
pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_MONGO_DB: &str = "tasknest";

/// Where task documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// JSON file under the data directory
    File,
    Mongo { uri: String, database: String },
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Mongo { .. } => "mongo",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub backend: Backend,
    pub cors_any: bool,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("TASKNEST_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("TASKNEST_PORT must be a port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let token_ttl_seconds = match var("TASKNEST_TOKEN_TTL_SECONDS") {
            Some(raw) => raw.parse::<i64>().with_context(|| {
                format!("TASKNEST_TOKEN_TTL_SECONDS must be an integer, got '{}'", raw)
            })?,
            None => DEFAULT_TOKEN_TTL_SECONDS,
        };
        if token_ttl_seconds <= 0 {
            bail!("TASKNEST_TOKEN_TTL_SECONDS must be positive");
        }

        let backend = match var("TASKNEST_BACKEND").as_deref().map(str::to_ascii_lowercase) {
            None => Backend::File,
            Some(name) if name == "file" => Backend::File,
            Some(name) if name == "mongo" => Backend::Mongo {
                uri: var("TASKNEST_MONGO_URI").unwrap_or_else(|| DEFAULT_MONGO_URI.to_string()),
                database: var("TASKNEST_MONGO_DB").unwrap_or_else(|| DEFAULT_MONGO_DB.to_string()),
            },
            Some(other) => bail!("Unknown TASKNEST_BACKEND '{}', expected file or mongo", other),
        };

        Ok(Self {
            data_dir: var("TASKNEST_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            port,
            jwt_secret: var("TASKNEST_JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_ttl_seconds,
            backend,
            cors_any: flag(var("TASKNEST_CORS_ANY"), true),
        })
    }

    pub fn directory_settings(&self) -> DirectorySettings {
        DirectorySettings {
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_seconds: self.token_ttl_seconds,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn flag(raw: Option<String>, default: bool) -> bool {
    match raw {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECONDS);
        assert!(config.cors_any);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn mongo_backend_with_defaults() {
        let config = config(&[("TASKNEST_BACKEND", "Mongo"), ("TASKNEST_MONGO_DB", "prod")]).unwrap();
        assert_eq!(
            config.backend,
            Backend::Mongo {
                uri: DEFAULT_MONGO_URI.to_string(),
                database: "prod".to_string(),
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("TASKNEST_PORT", "eighty")]).is_err());
        assert!(config(&[("TASKNEST_BACKEND", "sqlite")]).is_err());
        assert!(config(&[("TASKNEST_TOKEN_TTL_SECONDS", "0")]).is_err());
    }

    #[test]
    fn lenient_flags() {
        assert!(!config(&[("TASKNEST_CORS_ANY", "off")]).unwrap().cors_any);
        assert!(!config(&[("TASKNEST_CORS_ANY", "No")]).unwrap().cors_any);
        assert!(config(&[("TASKNEST_CORS_ANY", "maybe")]).unwrap().cors_any);
    }
}
