//! Query executor: one validated tool call in, one response envelope out.

use crate::groq::CompletionClient;
use crate::types::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Text used when the service returns no answer.
pub const NO_RESPONSE_TEXT: &str = "No response from model.";

/// Prefix of every failure envelope.
pub const FAILURE_PREFIX: &str = "Failed to get response from Groq: ";

/// Body of a verbose-mode answer.
#[derive(Debug, Serialize)]
struct VerbosePayload<'a> {
    answer: &'a str,
    executed_tools: Option<&'a serde_json::Value>,
}

/// Forwards validated questions to the completion service.
#[derive(Clone)]
pub struct QueryExecutor {
    client: Arc<dyn CompletionClient>,
}

impl QueryExecutor {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Run one query. Failures come back as a text envelope, never as `Err`.
    pub async fn execute(&self, args: &ToolArguments) -> ResponseEnvelope {
        let request = build_request(args);
        debug!("Executing query with model {} ({} mode)", args.model, args.mode);

        match self.client.complete(&request).await {
            Ok(reply) => match shape_response(&reply, args.mode) {
                Ok(text) => ResponseEnvelope::text(text),
                Err(e) => failure_envelope(&anyhow::Error::from(e)),
            },
            Err(e) => failure_envelope(&e),
        }
    }
}

/// Single-turn request carrying only the filters the caller asked for.
pub fn build_request(args: &ToolArguments) -> CompletionRequest {
    let mut request = CompletionRequest::new(args.model, vec![ChatMessage::user(&args.question)]);
    if let Some(domains) = &args.include_domains {
        request = request.with_include_domains(domains.clone());
    }
    if let Some(domains) = &args.exclude_domains {
        request = request.with_exclude_domains(domains.clone());
    }
    request
}

fn shape_response(reply: &CompletionResponse, mode: Mode) -> serde_json::Result<String> {
    let message = reply.first_message();
    let answer = message
        .and_then(|m| m.content.as_deref())
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_RESPONSE_TEXT);

    match mode {
        Mode::Minimal => Ok(answer.to_string()),
        Mode::Verbose => serde_json::to_string_pretty(&VerbosePayload {
            answer,
            executed_tools: message.and_then(|m| m.executed_tools.as_ref()),
        }),
    }
}

fn failure_envelope(err: &anyhow::Error) -> ResponseEnvelope {
    error!("Error executing Groq query: {:#}", err);
    ResponseEnvelope::text(format!("{}{:#}", FAILURE_PREFIX, err))
}
