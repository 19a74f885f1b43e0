//! Cellar - storefront API server.
//!
//! Commands:
//! - `cellar serve` - Run the HTTP API
//! - `cellar migrate` - Apply database migrations
//! - `cellar seed <catalog.json>` - Load catalog items
//! - `cellar promote <email>` - Grant (or `--revoke`) the admin role

use anyhow::{Context, Result};
use cellar_auth::{AccountService, LogNotifier, Role};
use cellar_cache::Cache;
use cellar_commerce::catalog::{CatalogService, NewItem};
use cellar_server::config::Config;
use cellar_server::telemetry;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cellar storefront server
#[derive(Parser)]
#[command(name = "cellar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file path (default: ./cellar.toml if present)
    #[arg(short, long, global = true, env = "CELLAR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Insert or replace catalog items from a JSON array
    Seed {
        /// Path to the catalog file
        path: PathBuf,
    },

    /// Grant the admin role to an account
    Promote {
        email: String,

        /// Demote back to customer instead
        #[arg(long)]
        revoke: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    telemetry::init(config.log.format, config.log.filter.as_deref())?;

    match cli.command {
        Commands::Serve => cellar_server::serve(config).await,
        Commands::Migrate => migrate(&config),
        Commands::Seed { path } => seed(&config, &path),
        Commands::Promote { email, revoke } => promote(&config, &email, revoke),
    }
}

fn migrate(config: &Config) -> Result<()> {
    cellar_server::open_database(config)?;
    Ok(())
}

fn seed(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let items: Vec<NewItem> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

    let db = cellar_server::open_database(config)?;
    let now = chrono::Utc::now().timestamp();
    let count = CatalogService::new(db)
        .seed(items, now)
        .context("Failed to seed catalog")?;
    tracing::info!(count, "catalog loaded");
    Ok(())
}

fn promote(config: &Config, email: &str, revoke: bool) -> Result<()> {
    let db = cellar_server::open_database(config)?;
    let accounts = AccountService::new(db, Arc::new(Cache::in_memory()), Arc::new(LogNotifier));
    let role = if revoke { Role::Customer } else { Role::Admin };
    accounts
        .set_role(email, role)
        .with_context(|| format!("Failed to set role for {email}"))?;
    Ok(())
}
