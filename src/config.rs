use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "ledger-keeper";
pub const CONFIG_ENV: &str = "LEDGER_KEEPER_CONFIG";
pub const DB_ENV: &str = "LEDGER_KEEPER_DB";

/// Runtime settings shared by the CLI and the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_filter: String,
    pub bind_address: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: data_dir().join("ledger.db"),
            log_filter: "ledger_keeper=info".into(),
            bind_address: "127.0.0.1:3000".into(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    data_dir().join("config.json")
}

impl Config {
    /// Resolve configuration: explicit file, then `$LEDGER_KEEPER_CONFIG`, then
    /// the default location, then built-in defaults. `$LEDGER_KEEPER_DB`
    /// overrides the database path in every case.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match env::var_os(CONFIG_ENV) {
                Some(path) => Self::from_file(Path::new(&path))?,
                None => {
                    let path = default_config_path();
                    if path.exists() {
                        Self::from_file(&path)?
                    } else {
                        Self::default()
                    }
                }
            },
        };

        if let Some(db) = env::var_os(DB_ENV) {
            config.database_path = PathBuf::from(db);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Create the database's parent directory if needed.
    pub fn ensure_database_dir(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }
        Ok(())
    }
}
