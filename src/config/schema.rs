//! Configuration schema for config.toml.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqMcpConfig {
    /// Groq OpenAI-compatible API base URL.
    pub api_base_url: String,

    /// Groq API key. When unset, `GROQ_API_KEY` is read on each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// HTTP timeout for a single completion request.
    pub request_timeout_secs: u64,

    /// Name reported to MCP clients during `initialize`.
    pub server_name: String,

    /// Version reported to MCP clients during `initialize`.
    pub server_version: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for GroqMcpConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.groq.com/openai/v1".into(),
            api_key: None,
            request_timeout_secs: 60,
            server_name: "groq-interaction".into(),
            server_version: "1.0.0".into(),
            log_level: "info".into(),
        }
    }
}

impl GroqMcpConfig {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than 0");
        }
        if self.api_base_url.trim().is_empty() {
            bail!("api_base_url must not be empty");
        }
        Ok(())
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GROQ_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
    }
}
