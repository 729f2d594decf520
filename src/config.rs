//! Gateway configuration

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub serving: ServingConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub rest_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServingConfig {
    pub url: String,
    pub verbose: bool,
    pub model_name: String,
    pub model_version: String,
    pub batch_size: usize,
    pub class_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub result_save_dir: Option<PathBuf>,
    pub resize_width: Option<u32>,
    pub resize_height: Option<u32>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_path() -> &'static str {
        "config.toml"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig { rest_port: 3000 },
            serving: ServingConfig {
                url: "http://127.0.0.1:8001".to_string(),
                verbose: false,
                model_name: "face_detect".to_string(),
                model_version: "1".to_string(),
                batch_size: 8,
                class_count: 0,
            },
            media: MediaConfig {
                result_save_dir: None,
                resize_width: None,
                resize_height: None,
            },
        }
    }
}
