//! TOML configuration for the `docchat` binary.
//!
//! ```toml
//! [chat]
//! chunk_size = 500
//! chunk_overlap = 100
//! top_k = 10
//!
//! [openai]
//! chat_model = "gpt-4o-mini"
//! embedding_model = "text-embedding-3-small"
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use anyhow::{Context, Result};
use docchat_rag::ChatConfig;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chat: ChatConfig,
    pub openai: OpenAIConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 1.0,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config file")?;
    config.chat.validate().context("Invalid [chat] settings")?;
    Ok(config)
}
