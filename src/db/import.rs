use eyre::{Result, WrapErr};
use sqlx::{Executor, postgres::PgPool};
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Row counts read back after a script has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub trades: i64,
    pub balance: i64,
}

/// Runs a generated import script (following the latest alias if given) and reports table counts.
///
/// The script carries its own `BEGIN`/`COMMIT`, so it is sent as one simple-protocol batch
/// on a dedicated connection. If a statement fails, that connection is rolled back
/// before it goes back to the pool, otherwise it would stay in an aborted transaction.
#[instrument(skip(pool), fields(path = %path.display(), on_close = true))]
pub async fn apply_script(pool: &PgPool, path: &Path) -> Result<TableCounts> {
    let script = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read SQL script {}", path.display()))?;
    info!(bytes = script.len(), "Applying SQL script");

    let mut conn = pool.acquire().await.wrap_err("failed to acquire a database connection")?;
    if let Err(e) = (&mut *conn).execute(script.as_str()).await {
        if let Err(rollback) = (&mut *conn).execute("ROLLBACK").await {
            warn!(error = %rollback, "Rollback after failed script also failed");
        }
        return Err(eyre::Report::new(e).wrap_err("failed to apply SQL script"));
    }
    drop(conn);

    let counts = table_counts(pool).await?;
    info!(trades = counts.trades, balance = counts.balance, "SQL script applied");
    Ok(counts)
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts, sqlx::Error> {
    let trades = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM trades")
        .fetch_one(pool)
        .await?;
    let balance = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM balance")
        .fetch_one(pool)
        .await?;
    Ok(TableCounts { trades, balance })
}
