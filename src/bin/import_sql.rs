use dotenvy::dotenv;
use eyre::Result;
use std::env;
use std::path::PathBuf;
use tracing::{info, error};

use trade_journal_ops::logging;
use trade_journal_ops::config;
use trade_journal_ops::db::{
    connection,
    import,
    schema,
};
use trade_journal_ops::sql::writer::LATEST_FILE_NAME;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file, if any
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    // Load configuration
    let cfg = config::Config::load()?;

    // Script path: first argument, or the latest alias in the backup directory
    let script_path = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| cfg.backup_dir.join(LATEST_FILE_NAME));
    info!(script = %script_path.display(), "Configuration loaded and logging initialized");

    // Initialize database connection pool and make sure the tables exist
    let pool = connection::create_pool(&cfg).await?;
    schema::init_schema(&pool).await?;
    info!("Database schema ready");

    let counts = match import::apply_script(&pool, &script_path).await {
        Ok(counts) => counts,
        Err(e) => {
            error!(error = ?e, "Import failed");
            return Err(e);
        }
    };

    println!("Import complete: {} trades, {} balance rows", counts.trades, counts.balance);
    Ok(())
}
