use dotenvy::dotenv;
use std::io;
use tracing::{info, warn};

use trade_journal_ops::logging;
use trade_journal_ops::config;
use trade_journal_ops::api::client::JournalClient;
use trade_journal_ops::reset;

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
    info!(api = %cfg.api_base_url, "Configuration loaded and logging initialized");

    // Initialize journal API client
    let client = JournalClient::new(&cfg)?;

    let report = reset::confirm_and_clear(
        &client,
        cfg.trades_page_size,
        io::stdin().lock(),
        io::stdout(),
    )
    .await?;

    let Some(report) = report else {
        println!("Operation cancelled");
        return Ok(());
    };

    println!();
    println!(
        "Trades: {} ({} of {} deleted)",
        report.trades_phase, report.trades_deleted, report.trades_found
    );
    for id in &report.failed_deletions {
        warn!(trade_id = %id, "Trade was not deleted");
    }
    match &report.balance_phase {
        Some(status) if report.balance_reset => println!("Balance: {} (reset to 0)", status),
        Some(status) => println!("Balance: {} (no balance row)", status),
        None => println!("Balance: skipped"),
    }

    if !report.succeeded() {
        println!("\nReset failed");
        eyre::bail!("reset did not complete cleanly");
    }

    println!("\nReset complete. A backup script can now be imported to restore data.");
    Ok(())
}
