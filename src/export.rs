use chrono::{Local, Utc};
use eyre::Result;
use tracing::{info, instrument, warn};

use crate::api::{JournalApi, list_all_trades};
use crate::config::Config;
use crate::models::{Balance, Trade, TradeSummary};
use crate::sql::{self, ScriptMeta, writer::{self, BackupArtifact}};

/// What the exporter managed to read from the API
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub balance: Option<Balance>,
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub artifact: BackupArtifact,
    pub script: String,
    pub balance_exported: bool,
    pub summary: TradeSummary,
    /// Rows left out because a numeric column could not be parsed
    pub skipped_rows: usize,
}

/// Reads balance and trades; a failed fetch is logged and treated as "no data"
#[instrument(skip(api))]
pub async fn collect_snapshot<A: JournalApi>(api: &A, page_size: usize) -> Snapshot {
    let balance = match api.fetch_balance().await {
        Ok(balance) => balance,
        Err(e) => {
            warn!(error = %e, "Failed to fetch balance, exporting without it");
            None
        }
    };

    let trades = match list_all_trades(api, page_size).await {
        Ok(trades) => trades,
        Err(e) => {
            warn!(error = %e, "Failed to fetch trades, exporting without them");
            Vec::new()
        }
    };

    Snapshot { balance, trades }
}

/// Fetches, renders and writes one backup script
#[instrument(name = "export", skip_all, fields(on_close = true))]
pub async fn run_export<A: JournalApi>(api: &A, config: &Config) -> Result<ExportOutcome> {
    let snapshot = collect_snapshot(api, config.trades_page_size).await;
    let summary = TradeSummary::of(&snapshot.trades);
    info!(
        has_balance = snapshot.balance.is_some(),
        total_trades = summary.total,
        closed_trades = summary.closed,
        open_trades = summary.open,
        "Snapshot collected"
    );

    let meta = ScriptMeta {
        generated_at: Utc::now(),
        source: config.api_base_url.to_string(),
    };
    let rendered = sql::render_script(snapshot.balance.as_ref(), &snapshot.trades, &meta);
    if !rendered.skipped.is_empty() {
        warn!(skipped = rendered.skipped.len(), "Some rows were left out of the script");
    }
    let artifact = writer::write_backup(&config.backup_dir, &rendered.sql, &Local::now())?;

    let balance_skipped = rendered
        .skipped
        .iter()
        .any(|e| matches!(e, sql::SqlError::InvalidNumeric { table: "balance", .. }));
    Ok(ExportOutcome {
        artifact,
        script: rendered.sql,
        balance_exported: snapshot.balance.is_some() && !balance_skipped,
        summary,
        skipped_rows: rendered.skipped.len(),
    })
}
