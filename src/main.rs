mod api;
mod assessment;
mod config;
mod database;
mod llm;
mod logging;
mod matrix;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{info, warn};

use crate::api::AppState;
use crate::assessment::ImpactAnalyst;
use crate::config::AppConfig;
use crate::database::{connect_database, run_migrations};
use crate::llm::OpenAIClient;
use crate::logging::{LogFormat, init_logging};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "leopold",
    version,
    about = "Leopold matrix environmental impact assessment service"
)]
pub(crate) struct Cli {
    /// Address the HTTP API listens on
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Model name
    #[arg(long)]
    model: Option<String>,

    /// API key (set via env OPENAI_API_KEY recommended)
    #[arg(long)]
    api_key: Option<String>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let (cfg, report) = AppConfig::from_cli(cli)?;
    init_logging(&cfg.log_level, cfg.log_format)?;
    report.log();
    info!(
        bind=%cfg.bind,
        database=%cfg.database_path.display(),
        base_url=%cfg.base_url,
        model=%cfg.model,
        "app config"
    );

    let db = connect_database(&cfg.database_path)
        .await
        .with_context(|| format!("open database {}", cfg.database_path.display()))?;
    run_migrations(&db).await.context("run migrations")?;

    let analyst = match cfg.api_key.clone() {
        Some(key) => {
            let client = OpenAIClient::new(cfg.base_url.clone(), key)?.with_llm_config(cfg.llm);
            Some(ImpactAnalyst::new(client, cfg.model.clone()))
        }
        None => {
            warn!("no API key configured, analysis endpoints will fail");
            None
        }
    };

    server::serve(&cfg.bind, AppState::new(db, analyst)).await
}
