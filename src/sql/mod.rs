pub mod literal;
pub mod writer;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use crate::models::{Balance, Trade, non_null};
use literal::{SqlValue, numeric, optional_text, text_or, timestamp_or_now};

pub const NO_BALANCE_PLACEHOLDER: &str = "-- No balance data";
pub const NO_TRADES_PLACEHOLDER: &str = "-- No trade data";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SqlError {
    #[error("{table} row {id}: column {column} is not numeric: {value:?}")]
    InvalidNumeric {
        table: &'static str,
        id: String,
        column: &'static str,
        value: String,
    },
}

/// Header details stamped into a generated script
#[derive(Debug, Clone)]
pub struct ScriptMeta {
    pub generated_at: DateTime<Utc>,
    pub source: String,
}

/// A rendered import script plus the rows left out of it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScript {
    pub sql: String,
    pub skipped: Vec<SqlError>,
}

/// Renders the full import script: header, one transaction with every upsert, then verification counts.
///
/// A row with an unparseable numeric is left out with a warning and a comment
/// line; the remaining rows are still rendered. Output is deterministic for a
/// given input apart from the `Generated at` header line.
pub fn render_script(balance: Option<&Balance>, trades: &[Trade], meta: &ScriptMeta) -> RenderedScript {
    let mut skipped = Vec::new();
    let mut lines: Vec<String> = vec![
        "-- Trade journal data import script".to_string(),
        format!("-- Generated at: {}", meta.generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        "-- Database: PostgreSQL".to_string(),
        format!("-- Source: {}", comment_safe(&meta.source)),
        String::new(),
        "BEGIN;".to_string(),
    ];

    lines.push(String::new());
    lines.push("-- Upsert balance".to_string());
    match balance.map(balance_upsert).transpose() {
        Ok(Some(Some(statement))) => lines.push(statement),
        Ok(_) => lines.push(NO_BALANCE_PLACEHOLDER.to_string()),
        Err(e) => {
            warn!(error = %e, "Skipping balance row");
            lines.push(skipped_line(&e));
            lines.push(NO_BALANCE_PLACEHOLDER.to_string());
            skipped.push(e);
        }
    }

    lines.push(String::new());
    lines.push("-- Upsert trades".to_string());
    let mut trade_lines = Vec::with_capacity(trades.len());
    let mut trade_statements = 0;
    for trade in trades {
        match trade_upsert(trade) {
            Ok(Some(statement)) => {
                trade_lines.push(statement);
                trade_statements += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Skipping trade row");
                trade_lines.push(skipped_line(&e));
                skipped.push(e);
            }
        }
    }
    lines.extend(trade_lines);
    if trade_statements == 0 {
        lines.push(NO_TRADES_PLACEHOLDER.to_string());
    }

    lines.push(String::new());
    lines.push("COMMIT;".to_string());

    lines.push(String::new());
    lines.push("-- Verification".to_string());
    lines.push("SELECT COUNT(*) AS total_trades FROM trades;".to_string());
    lines.push("SELECT COUNT(*) AS total_balance FROM balance;".to_string());

    RenderedScript { sql: lines.join("\n"), skipped }
}

fn skipped_line(err: &SqlError) -> String {
    format!("-- Skipped {}", comment_safe(&err.to_string()))
}

// A line break would end the comment and let the rest run as SQL
fn comment_safe(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// `None` when the balance has no id (the API's "no row" placeholder)
pub fn balance_upsert(balance: &Balance) -> Result<Option<String>, SqlError> {
    let Some(id) = non_null(&balance.id) else {
        return Ok(None);
    };
    let required = |column: &'static str, value: &Option<String>| {
        required_numeric("balance", id, column, value)
    };

    let values = [
        ("id", SqlValue::Text(id.to_string())),
        ("amount", required("amount", &balance.amount)?),
        ("withdrawal_amount", required("withdrawal_amount", &balance.withdrawal_amount)?),
        ("created_at", timestamp_or_now(&balance.created_at)),
        ("updated_at", timestamp_or_now(&balance.updated_at)),
    ];

    Ok(Some(upsert_statement(
        "balance",
        &values,
        &["amount", "withdrawal_amount", "updated_at"],
    )))
}

/// `None` (with a warning) when the trade has no id, since it cannot be keyed
pub fn trade_upsert(trade: &Trade) -> Result<Option<String>, SqlError> {
    let Some(id) = non_null(&trade.id) else {
        warn!(symbol = ?trade.symbol, "Skipping trade without id");
        return Ok(None);
    };
    let optional = |column: &'static str, value: &Option<String>| {
        optional_numeric("trades", id, column, value)
    };

    let values = [
        ("id", SqlValue::Text(id.to_string())),
        ("symbol", text_or(&trade.symbol, "")),
        ("direction", text_or(&trade.direction, "")),
        ("entry_price", required_numeric("trades", id, "entry_price", &trade.entry_price)?),
        ("exit_price", optional("exit_price", &trade.exit_price)?),
        ("quantity", optional("quantity", &trade.quantity)?),
        ("strategy_summary", text_or(&trade.strategy_summary, "")),
        ("trade_level", text_or(&trade.trade_level, "A")),
        ("position_size", text_or(&trade.position_size, "10%")),
        ("profit_loss", optional("profit_loss", &trade.profit_loss)?),
        ("exit_reason", optional_text(&trade.exit_reason)),
        ("entry_time", timestamp_or_now(&trade.entry_time)),
        ("exit_time", optional_text(&trade.exit_time)),
        ("notes", optional_text(&trade.notes)),
        ("is_closed", SqlValue::Bool(trade.is_closed.unwrap_or(false))),
        ("created_at", timestamp_or_now(&trade.created_at)),
        ("updated_at", optional_text(&trade.updated_at)),
    ];

    let updated: Vec<&str> = values
        .iter()
        .map(|(column, _)| *column)
        .filter(|column| !matches!(*column, "id" | "created_at"))
        .collect();

    Ok(Some(upsert_statement("trades", &values, &updated)))
}

fn required_numeric(table: &'static str, id: &str, column: &'static str, value: &Option<String>) -> Result<SqlValue, SqlError> {
    match optional_numeric(table, id, column, value)? {
        SqlValue::Null => Ok(SqlValue::Numeric(Decimal::ZERO)),
        other => Ok(other),
    }
}

fn optional_numeric(table: &'static str, id: &str, column: &'static str, value: &Option<String>) -> Result<SqlValue, SqlError> {
    match numeric(value) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Ok(SqlValue::Null),
        Err(raw) => Err(SqlError::InvalidNumeric {
            table,
            id: id.to_string(),
            column,
            value: raw,
        }),
    }
}

/// Columns whose value fell back to `NOW()` are inserted but never overwritten
/// on conflict, so re-applying a script leaves an existing row unchanged.
fn upsert_statement(table: &str, values: &[(&str, SqlValue)], update_columns: &[&str]) -> String {
    let columns = values.iter().map(|(column, _)| *column).collect::<Vec<_>>().join(", ");
    let rendered = values
        .iter()
        .map(|(_, value)| format!("  {}", value))
        .collect::<Vec<_>>()
        .join(",\n");
    let assignments = update_columns
        .iter()
        .filter(|column| {
            !values
                .iter()
                .any(|(name, value)| name == *column && *value == SqlValue::Now)
        })
        .map(|column| format!("  {column} = EXCLUDED.{column}"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "INSERT INTO {table} (\n  {columns}\n) VALUES (\n{rendered}\n)\nON CONFLICT (id) DO UPDATE SET\n{assignments};"
    )
}
