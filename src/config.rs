use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_endpoint() -> String {
    "https://api.monday.com/v2".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub api_endpoint: String,
    pub api_token: String,
    /// Board to open at startup; stands in for the host's context
    /// notification when running standalone.
    pub board_id: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config at {}", path.display()))?;
                let config: Config = toml::from_str(&contents)
                    .with_context(|| "Failed to parse config.toml")?;
                return Ok(config);
            }
        }

        let api_token = std::env::var("MONDAY_API_TOKEN")
            .with_context(|| "MONDAY_API_TOKEN not set. Create a config file or set the env var.")?;
        let board_id = std::env::var("MONDAY_BOARD_ID")
            .with_context(|| "MONDAY_BOARD_ID not set. Create a config file or set the env var.")?
            .parse()
            .with_context(|| "MONDAY_BOARD_ID must be a numeric board id")?;
        let api_endpoint =
            std::env::var("MONDAY_API_ENDPOINT").unwrap_or_else(|_| default_endpoint());

        Ok(Self {
            api_endpoint,
            api_token,
            board_id,
        })
    }

    pub fn generate_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .with_context(|| "Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let default = Config {
            api_endpoint: default_endpoint(),
            api_token: "your-api-token-here".into(),
            board_id: 0,
        };

        let toml_str = toml::to_string_pretty(&default)?;
        std::fs::write(&path, toml_str)?;
        Ok(path)
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("boardcal").join("config.toml"))
    }
}
