use dotenvy::dotenv;
use eyre::Result;
use tracing::{info};

use trade_journal_ops::logging;
use trade_journal_ops::config;
use trade_journal_ops::db::{
    connection,
    schema,
};

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
    info!("Configuration loaded and logging initialized");

    // Initialize database connection pool
    let pool = connection::create_pool(&cfg).await?;
    info!("Database connection pool created");

    // Initialize database schema
    schema::init_schema(&pool).await?;
    info!("Database schema initialized");

    Ok(())
}
