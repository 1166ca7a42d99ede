//! Groq chat completions over the OpenAI-compatible HTTP API.

use super::CompletionClient;
use crate::config::GroqMcpConfig;
use crate::types::{CompletionRequest, CompletionResponse};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the Groq credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// HTTP client for the Groq completion endpoint.
///
/// The connection pool is shared across calls; the credential is resolved on
/// every request so a key exported after startup is still picked up.
#[derive(Debug, Clone)]
pub struct GroqClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl GroqClient {
    /// Create a new client. `api_key = None` defers to `GROQ_API_KEY`.
    pub fn new(base_url: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            http,
        })
    }

    pub fn from_config(config: &GroqMcpConfig) -> Result<Self> {
        Self::new(
            &config.api_base_url,
            config.api_key.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn api_key(&self) -> Result<String> {
        resolve_api_key(self.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())
    }
}

/// Pick the configured key, else the environment one. Blank keys count as missing.
pub fn resolve_api_key(configured: Option<&str>, from_env: Option<String>) -> Result<String> {
    if let Some(key) = configured.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    match from_env {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => bail!("The {} environment variable is missing or empty", API_KEY_ENV),
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!("Completion request to model: {}", request.model);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&api_key)
            .json(request)
            .send()
            .await
            .context("Completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{} {}", status.as_u16(), body);
        }

        resp.json()
            .await
            .context("Failed to parse completion response")
    }
}
