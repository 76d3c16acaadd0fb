// ⚙️ Configuration - shared by the CLI and the server
//
// Resolution order, later wins:
// 1. built-in defaults
// 2. TOML file (`--config`, else `<config_dir>/school-registry/config.toml`)
// 3. SCHOOL_REGISTRY_DB / SCHOOL_REGISTRY_ADDR / SCHOOL_REGISTRY_LOG
// 4. command-line flags

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE: &str = "SCHOOL_REGISTRY_DB";
pub const ENV_BIND_ADDRESS: &str = "SCHOOL_REGISTRY_ADDR";
pub const ENV_LOG_LEVEL: &str = "SCHOOL_REGISTRY_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_address: String,
    /// Default `env_logger` filter; `RUST_LOG` still takes precedence
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from("school-registry.db"),
            bind_address: "127.0.0.1:3000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Default location of the config file.
pub fn config_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("school-registry").join("config.toml")
}

impl Config {
    /// Defaults, then the config file, then the environment.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
        let mut config = match explicit {
            Some(path) => Config::from_file(path)?,
            None => {
                let path = config_path();
                if path.exists() {
                    Config::from_file(&path)?
                } else {
                    Config::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Config::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Config> {
        Ok(toml::from_str(contents)?)
    }

    /// Overlay environment values; blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(db) = get(ENV_DATABASE) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(addr) = get(ENV_BIND_ADDRESS) {
            self.bind_address = addr;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Apply command-line flags.
    pub fn with_overrides(
        mut self,
        database: Option<PathBuf>,
        bind_address: Option<String>,
        log_level: Option<String>,
    ) -> Config {
        if let Some(db) = database {
            self.database_path = db;
        }
        if let Some(addr) = bind_address {
            self.bind_address = addr;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        self
    }
}

/// Initialise `env_logger` with the configured filter unless `RUST_LOG` is set.
pub fn init_logging(config: &Config) {
    let env = env_logger::Env::default().default_filter_or(config.log_level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_path, PathBuf::from("school-registry.db"));
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("database_path = \"/var/lib/schools.db\"\n").unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/schools.db"));
        assert_eq!(config.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_toml_str("databse_path = \"typo.db\"\n").is_err());
    }

    #[test]
    fn test_layering_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "database_path = \"file.db\"\nbind_address = \"0.0.0.0:8080\"\nlog_level = \"warn\"\n",
        )
        .unwrap();

        let mut config = Config::from_file(&path).unwrap();
        assert_eq!(config.log_level, "warn");

        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_DATABASE, "env.db"), (ENV_LOG_LEVEL, "  ")]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path, PathBuf::from("env.db"));
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.log_level, "warn", "blank env values are ignored");

        let config = config.with_overrides(None, Some("127.0.0.1:9000".to_string()), Some("debug".to_string()));
        assert_eq!(config.database_path, PathBuf::from("env.db"));
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
