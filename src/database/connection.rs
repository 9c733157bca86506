use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Connects to the SQLite database, creating the file when it does not exist.
pub async fn connect_database(db_path: &Path) -> Result<DatabaseConnection, DbErr> {
    info!(path=%db_path.display(), "connecting to SQLite database");

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DbErr::Custom(format!("create database dir: {e}")))?;
        }
    }

    // mode=rwc: read, write, create
    let mut opt = ConnectOptions::new(format!("sqlite://{}?mode=rwc", db_path.display()));
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    Database::connect(opt).await
}
