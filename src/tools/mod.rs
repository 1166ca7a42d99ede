pub mod schema;
pub mod traits;

pub use schema::{ValidationError, ValidationErrorKind};
pub use traits::{Tool, ToolDefinition};

use crate::executor::QueryExecutor;
use crate::types::{ResponseEnvelope, ToolArguments};
use async_trait::async_trait;
use std::sync::Arc;

/// Presentation details for one registration of the query executor.
#[derive(Debug, Clone, Copy)]
pub struct QueryToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub question_description: &'static str,
}

pub const REALTIME_TOOL: QueryToolSpec = QueryToolSpec {
    name: "ask_with_realtime_information",
    description: "Ask a question requiring real-time information (e.g., news, current events) \
using a Groq model.",
    question_description: "The question to ask the model, especially if it requires real-time \
information (e.g., current news, recent events).",
};

pub const CODE_EXECUTION_TOOL: QueryToolSpec = QueryToolSpec {
    name: "ask_with_code_execution",
    description: "Ask questions that benefit from Python REPL interaction (e.g., for \
intermediate calculations or code execution).",
    question_description: "The question to ask the model, especially one that benefits from \
Python REPL interaction (e.g., for intermediate calculations or code execution).",
};

// ---------------------------------------------------------------------------
// Query tool
// ---------------------------------------------------------------------------

/// A named alias over the shared [`QueryExecutor`].
pub struct QueryTool {
    spec: QueryToolSpec,
    executor: QueryExecutor,
}

impl QueryTool {
    pub fn new(spec: QueryToolSpec, executor: QueryExecutor) -> Self {
        Self { spec, executor }
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        schema::arguments_schema(self.spec.question_description)
    }

    fn validate(&self, raw: &serde_json::Value) -> Result<ToolArguments, ValidationError> {
        schema::validate(raw)
    }

    async fn execute(&self, args: ToolArguments) -> ResponseEnvelope {
        self.executor.execute(&args).await
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide set of tools, looked up by name.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Both Groq query tools, sharing one executor.
    pub fn groq(executor: QueryExecutor) -> Self {
        Self {
            tools: [REALTIME_TOOL, CODE_EXECUTION_TOOL]
                .into_iter()
                .map(|spec| Arc::new(QueryTool::new(spec, executor.clone())) as Arc<dyn Tool>)
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Listing form of every tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}
