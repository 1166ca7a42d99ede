//! Shared types used across the tool layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Model / mode enumerations
// ---------------------------------------------------------------------------

/// Groq compound models a caller may select.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    /// Full compound model.
    #[default]
    #[serde(rename = "compound-beta")]
    CompoundBeta,
    /// Faster, lighter compound model.
    #[serde(rename = "compound-beta-mini")]
    CompoundBetaMini,
}

impl Model {
    /// Every accepted model, in the order they are advertised.
    pub const ALL: [Model; 2] = [Model::CompoundBeta, Model::CompoundBetaMini];

    /// Wire identifier sent to the completion service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompoundBeta => "compound-beta",
            Self::CompoundBetaMini => "compound-beta-mini",
        }
    }

    /// Look up a model by its wire identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response verbosity requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Answer text only.
    #[default]
    Minimal,
    /// Answer plus the tools the service executed, as pretty JSON.
    Verbose,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Minimal, Mode::Verbose];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Verbose => "verbose",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == id)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tool arguments
// ---------------------------------------------------------------------------

/// Normalized arguments for a query tool call.
///
/// Only produced by [`crate::tools::schema::validate`]; defaults are already
/// applied. Domain filters stay `None` when the caller did not ask for one, which
/// is distinct from `Some(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolArguments {
    pub question: String,
    pub model: Model,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// A single block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Uniform result of every tool invocation, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub content: Vec<ContentBlock>,
}

impl ResponseEnvelope {
    /// Envelope carrying one text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Text of the first block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
    }
}

// ---------------------------------------------------------------------------
// Completion types
// ---------------------------------------------------------------------------

/// A chat message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
}

/// Outbound request to the completion service.
///
/// Domain filters are set one at a time with the `with_*` builders and are
/// left off the wire entirely when never set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_domains: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_domains: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(model: Model, messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model,
            include_domains: None,
            exclude_domains: None,
        }
    }

    pub fn with_include_domains(mut self, domains: Vec<String>) -> Self {
        self.include_domains = Some(domains);
        self
    }

    pub fn with_exclude_domains(mut self, domains: Vec<String>) -> Self {
        self.exclude_domains = Some(domains);
        self
    }
}

/// Reply from the completion service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: ReplyMessage,
}

/// Assistant message inside a completion choice.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// Tools the service ran while answering. Relayed without interpretation.
    #[serde(default)]
    pub executed_tools: Option<serde_json::Value>,
}

impl CompletionResponse {
    /// Message of the first choice, if the service returned any.
    pub fn first_message(&self) -> Option<&ReplyMessage> {
        self.choices.first().map(|c| &c.message)
    }
}
