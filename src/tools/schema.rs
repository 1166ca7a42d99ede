//! Argument schema shared by the query tools: validation, defaults, and the
//! JSON Schema advertised to clients.

use crate::types::{Mode, Model, ToolArguments};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Why a raw argument payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    MissingField,
    TypeMismatch,
    InvalidEnum,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "missing_field"),
            Self::TypeMismatch => write!(f, "type_mismatch"),
            Self::InvalidEnum => write!(f, "invalid_enum"),
        }
    }
}

/// A rejected tool call. The executor is never reached when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn missing(field: &'static str) -> Self {
        Self {
            kind: ValidationErrorKind::MissingField,
            field,
            message: "required".into(),
        }
    }

    fn type_mismatch(field: &'static str, expected: &str, got: &Value) -> Self {
        Self {
            kind: ValidationErrorKind::TypeMismatch,
            field,
            message: format!("expected {}, received {}", expected, json_type_name(got)),
        }
    }

    fn invalid_enum(field: &'static str, allowed: &[&str], got: &Value) -> Self {
        Self {
            kind: ValidationErrorKind::InvalidEnum,
            field,
            message: format!("expected one of [{}], received {}", allowed.join(", "), got),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate and normalize a raw argument payload.
///
/// `null` is treated as an empty object. Unknown keys are ignored.
pub fn validate(raw: &Value) -> Result<ToolArguments, ValidationError> {
    let empty = Map::new();
    let obj = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => return Err(ValidationError::type_mismatch("arguments", "object", other)),
    };

    let question = match obj.get("question") {
        None => return Err(ValidationError::missing("question")),
        Some(Value::String(q)) => q.clone(),
        Some(other) => return Err(ValidationError::type_mismatch("question", "string", other)),
    };

    let model = match obj.get("model") {
        None => Model::default(),
        Some(value) => value
            .as_str()
            .and_then(Model::from_id)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Model::ALL.iter().map(|m| m.as_str()).collect();
                ValidationError::invalid_enum("model", &allowed, value)
            })?,
    };

    let mode = match obj.get("mode") {
        None => Mode::default(),
        Some(value) => value
            .as_str()
            .and_then(Mode::from_id)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();
                ValidationError::invalid_enum("mode", &allowed, value)
            })?,
    };

    let include_domains = domain_list(obj, "include_domains", "includeDomains")?;
    let exclude_domains = domain_list(obj, "exclude_domains", "excludeDomains")?;

    Ok(ToolArguments {
        question,
        model,
        mode,
        include_domains,
        exclude_domains,
    })
}

/// Read an optional list of domains, accepting the camelCase alias.
fn domain_list(
    obj: &Map<String, Value>,
    field: &'static str,
    alias: &str,
) -> Result<Option<Vec<String>>, ValidationError> {
    let Some(value) = obj.get(field).or_else(|| obj.get(alias)) else {
        return Ok(None);
    };

    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::type_mismatch(field, "array", value))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ValidationError::type_mismatch(field, "array of strings", value))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

// ---------------------------------------------------------------------------
// Advertised schema
// ---------------------------------------------------------------------------

const MODEL_DESCRIPTION: &str = "The model to use (compound-beta or compound-beta-mini). \
Defaults to compound-beta. Use compound-beta-mini for quick answers.";

const MODE_DESCRIPTION: &str = "Response mode ('minimal' or 'verbose'). Defaults to 'minimal'. \
'verbose' includes executed tools in the response. This is very verbose and should only be \
used when the user asks for it or when the user query cannot be answered without it \
(always first try without it).";

/// JSON Schema for the query tool arguments. Only the `question` hint varies
/// between tools.
pub fn arguments_schema(question_description: &str) -> Value {
    let models: Vec<&str> = Model::ALL.iter().map(|m| m.as_str()).collect();
    let modes: Vec<&str> = Mode::ALL.iter().map(|m| m.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "question": {
                "type": "string",
                "description": question_description
            },
            "model": {
                "type": "string",
                "enum": models,
                "default": Model::default().as_str(),
                "description": MODEL_DESCRIPTION
            },
            "mode": {
                "type": "string",
                "enum": modes,
                "default": Mode::default().as_str(),
                "description": MODE_DESCRIPTION
            },
            "include_domains": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of domains to specifically include in the search."
            },
            "exclude_domains": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of domains to exclude from the search."
            }
        },
        "required": ["question"]
    })
}
