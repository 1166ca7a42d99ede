//! Groq MCP server.
//!
//! Usage:
//!   groq-mcp serve              Serve MCP over stdio (default)
//!   groq-mcp tools              List the registered tools
//!   groq-mcp call <tool> --args '{"question": "..."}'
//!   groq-mcp init-config        Write a default config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use groq_mcp::config::{self, GroqMcpConfig};
use groq_mcp::executor::QueryExecutor;
use groq_mcp::groq::GroqClient;
use groq_mcp::server::McpServer;
use groq_mcp::tools::ToolRegistry;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "groq-mcp")]
#[command(version)]
#[command(about = "MCP server exposing Groq compound models as agent tools")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the config file (defaults to ~/.groq-mcp/config.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdin/stdout.
    Serve,

    /// List the registered tools.
    Tools,

    /// Invoke one tool and print its response.
    Call {
        /// Tool name, e.g. ask_with_realtime_information.
        tool: String,

        /// Tool arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Write a default config file if none exists.
    InitConfig,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_config_with_env(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging; stdout belongs to the protocol
    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cmd_serve(&cfg).await,
        Commands::Tools => cmd_tools(&cfg),
        Commands::Call { tool, args } => cmd_call(&cfg, &tool, &args).await,
        Commands::InitConfig => cmd_init_config(&config_path),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_serve(cfg: &GroqMcpConfig) -> Result<()> {
    let registry = build_registry(cfg)?;
    let server = Arc::new(McpServer::new(registry, &cfg.server_name, &cfg.server_version));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => signal_cancel.cancel(),
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    info!("Groq MCP Server running on stdio");
    server.serve_stdio(cancel).await?;
    info!("Server shutdown complete");
    Ok(())
}

fn cmd_tools(cfg: &GroqMcpConfig) -> Result<()> {
    let registry = build_registry(cfg)?;

    println!();
    println!("{}", "=== Groq MCP Tools ===".bold());
    for def in registry.definitions() {
        println!();
        println!("  {}", def.name.green().bold());
        println!("    {}", def.description);
        if let Some(props) = def.input_schema["properties"].as_object() {
            let names: Vec<&str> = props.keys().map(String::as_str).collect();
            println!("    {}: {}", "args".dimmed(), names.join(", "));
        }
    }
    println!();

    Ok(())
}

async fn cmd_call(cfg: &GroqMcpConfig, tool_name: &str, raw_args: &str) -> Result<()> {
    let registry = build_registry(cfg)?;
    let tool = match registry.get(tool_name) {
        Some(tool) => tool,
        None => bail!("Unknown tool: {}", tool_name),
    };

    let raw: serde_json::Value =
        serde_json::from_str(raw_args).context("--args must be valid JSON")?;

    let envelope = match tool.invoke(&raw).await {
        Ok(envelope) => envelope,
        Err(e) => bail!("Invalid arguments for {} ({}): {}", tool_name, e.kind, e),
    };

    println!("{}", envelope.first_text().unwrap_or_default());
    Ok(())
}

fn cmd_init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("{} Config already exists at {}", "!".yellow().bold(), path.display());
        return Ok(());
    }
    config::save_config(&GroqMcpConfig::default(), path)?;
    println!("{} Wrote default config to {}", ">>>".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Wire the Groq client, executor, and both tools together.
fn build_registry(cfg: &GroqMcpConfig) -> Result<ToolRegistry> {
    let client = GroqClient::from_config(cfg)?;
    Ok(ToolRegistry::groq(QueryExecutor::new(Arc::new(client))))
}
