//! Groq MCP — agent tools backed by Groq compound models.
//!
//! Exposes `ask_with_realtime_information` and `ask_with_code_execution` over
//! the Model Context Protocol. Both validate their arguments, forward the
//! question to Groq's chat completions API, and return a single text block.

pub mod config;
pub mod executor;
pub mod groq;
pub mod server;
pub mod tools;
pub mod types;
