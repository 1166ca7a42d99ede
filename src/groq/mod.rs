//! Remote completion service: the client seam and the Groq implementation.

pub mod client;

pub use client::GroqClient;

use crate::types::{CompletionRequest, CompletionResponse};
use anyhow::Result;
use async_trait::async_trait;

/// Something that can answer a chat completion request.
///
/// The executor only talks to this trait, so tests can swap in a double.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one request and return the parsed reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
