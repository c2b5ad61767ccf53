//! odmcp: open-data tool server.
//!
//! Usage:
//!   odmcp serve                       Serve tools over stdio (JSON-RPC)
//!   odmcp list                        List available tools
//!   odmcp schema <tool>               Print a tool's input schema
//!   odmcp call <tool> --args '{...}'  Call a tool once
//!   odmcp init                        Write a default config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;
use tracing::{debug, info};

use odmcp::config::{self, OdmcpConfig};
use odmcp::providers;
use odmcp::server::Server;
use odmcp::tools::ToolRegistry;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "odmcp")]
#[command(version)]
#[command(about = "Open-data APIs as callable tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.odmcp/odmcp.toml).
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file;
    /// RUST_LOG overrides both.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve every tool over stdio as newline-delimited JSON-RPC.
    Serve,

    /// List the registered tools.
    List,

    /// Print the JSON schema of a tool's arguments.
    Schema {
        /// Tool name.
        tool: String,
    },

    /// Call a tool once and print its output.
    Call {
        /// Tool name.
        tool: String,

        /// Arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,
    },

    /// Write a config file with every default filled in.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();

    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);

    let cfg = config::load_config(&config_path)?;

    // Logs go to stderr; stdout carries the JSON-RPC stream.
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Ok(path) = &dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Serve => cmd_serve(&cfg).await,
        Commands::List => cmd_list(&cfg),
        Commands::Schema { tool } => cmd_schema(&cfg, &tool),
        Commands::Call { tool, args } => cmd_call(&cfg, &tool, args.as_deref()).await,
        Commands::Init { force } => cmd_init(&cfg, &config_path, force),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_serve(cfg: &OdmcpConfig) -> Result<()> {
    let registry = build_registry(cfg)?;
    info!("odmcp {} ready on stdio", env!("CARGO_PKG_VERSION"));
    Server::new(registry).serve_stdio().await
}

fn cmd_list(cfg: &OdmcpConfig) -> Result<()> {
    let registry = build_registry(cfg)?;

    println!();
    println!("{}", "=== odmcp tools ===".bold());
    println!();
    for def in registry.definitions() {
        println!("  {}", def.name.green().bold());
        println!("    {}", def.description.dimmed());
    }
    println!();
    Ok(())
}

fn cmd_schema(cfg: &OdmcpConfig, name: &str) -> Result<()> {
    let registry = build_registry(cfg)?;
    let Some(tool) = registry.get(name) else {
        bail!("Unknown tool '{}'. Run `odmcp list` to see available tools.", name);
    };
    let schema = serde_json::to_string_pretty(&tool.parameters_schema())
        .context("Failed to render schema")?;
    println!("{schema}");
    Ok(())
}

async fn cmd_call(cfg: &OdmcpConfig, name: &str, args: Option<&str>) -> Result<()> {
    let registry = build_registry(cfg)?;
    let args = args
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--args must be valid JSON")?;

    let content = registry
        .call(name, args)
        .await
        .with_context(|| format!("Tool '{}' failed", name))?;

    for item in content {
        if let Some(text) = item.as_text() {
            println!("{text}");
        }
    }
    Ok(())
}

fn cmd_init(cfg: &OdmcpConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        eprintln!(
            "{} Config already exists at {}. Use --force to overwrite.",
            "Error:".red().bold(),
            path.display()
        );
        std::process::exit(1);
    }

    config::save_config(cfg, path)?;
    println!("{} Wrote {}", ">>>".green().bold(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_registry(cfg: &OdmcpConfig) -> Result<ToolRegistry> {
    providers::default_registry(cfg).context("Failed to register tools")
}
