use dotenvy::dotenv;
use tracing::{info, error};

use trade_journal_ops::logging;
use trade_journal_ops::config;
use trade_journal_ops::api::client::JournalClient;
use trade_journal_ops::export;
use trade_journal_ops::sql::writer;

const PREVIEW_LINES: usize = 30;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load environment variables from .env file, if any
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    // Load configuration
    let cfg = config::Config::load()?;
    info!(api = %cfg.api_base_url, backup_dir = %cfg.backup_dir.display(), "Configuration loaded and logging initialized");

    // Initialize journal API client
    let client = JournalClient::new(&cfg)?;

    println!("Generating SQL import script...");
    let outcome = match export::run_export(&client, &cfg).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = ?e, "Export failed");
            return Err(e);
        }
    };

    println!("SQL import script generated!");
    println!("SQL file: {}", outcome.artifact.sql_file.display());
    println!(
        "Balance: {} | Trades: {} ({} closed, {} open)",
        if outcome.balance_exported { "exported" } else { "none" },
        outcome.summary.total,
        outcome.summary.closed,
        outcome.summary.open,
    );
    if outcome.skipped_rows > 0 {
        println!("Skipped {} row(s) with invalid numbers, see the script comments", outcome.skipped_rows);
    }
    println!();
    println!("Preview:");
    println!("{}", "-".repeat(60));
    println!("{}", writer::preview(&outcome.script, PREVIEW_LINES));
    println!("...");
    println!("{}", "-".repeat(60));
    println!("Full script: {}", outcome.artifact.sql_file.display());
    println!("Latest script link: {}", outcome.artifact.latest_link.display());

    Ok(())
}
