pub mod schema;

pub use schema::GroqMcpConfig;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default config location (~/.groq-mcp/config.toml).
pub fn default_config_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(".groq-mcp"))
        .unwrap_or_else(|| PathBuf::from(".groq-mcp"))
        .join("config.toml")
}

/// Expand a user-supplied path that may start with `~`.
pub fn resolve_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Load config from the given path, or return defaults.
pub fn load_config(path: &Path) -> Result<GroqMcpConfig> {
    if path.exists() {
        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
        let config: GroqMcpConfig =
            toml::from_str(&contents).context("Failed to parse config (TOML)")?;
        config.validate().context("Invalid config")?;
        Ok(config)
    } else {
        Ok(GroqMcpConfig::default())
    }
}

/// Load config and apply process environment overrides.
pub fn load_config_with_env(path: &Path) -> Result<GroqMcpConfig> {
    let mut config = load_config(path)?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Save config to the given path (TOML format).
pub fn save_config(config: &GroqMcpConfig, path: &Path) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents).context("Failed to write config file")?;
    Ok(())
}
