use std::fmt;
use std::io::{self, BufRead, Write};
use tracing::{error, info, instrument, warn};

use crate::api::{JournalApi, list_all_trades};
use crate::models::{BalanceUpdate, non_null};

const AFFIRMATIVE: &str = "yes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    /// Only an exact `yes` (any case) confirms; just the line terminator is stripped
    pub fn parse(input: &str) -> Self {
        if input.trim_end_matches(['\r', '\n']).eq_ignore_ascii_case(AFFIRMATIVE) {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

/// Writes the prompt and reads one line of answer. EOF counts as a refusal.
pub fn prompt_confirmation<R: BufRead, W: Write>(mut input: R, mut output: W) -> io::Result<Confirmation> {
    write!(
        output,
        "Delete ALL trades and reset the balance? This cannot be undone. (yes/no): "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(Confirmation::parse(&answer))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseStatus {
    Succeeded,
    Failed(String),
}

impl PhaseStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PhaseStatus::Succeeded)
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseStatus::Succeeded => f.write_str("ok"),
            PhaseStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub trades_found: usize,
    pub trades_deleted: usize,
    pub failed_deletions: Vec<String>,
    pub trades_phase: PhaseStatus,
    /// `None` when the trades phase could not list trades and the run stopped there
    pub balance_phase: Option<PhaseStatus>,
    pub balance_reset: bool,
}

impl ResetReport {
    pub fn succeeded(&self) -> bool {
        self.trades_phase.is_success()
            && self.balance_phase.as_ref().is_some_and(PhaseStatus::is_success)
    }
}

/// Deletes every trade, then zeroes the balance.
///
/// Deletions are attempted one by one and a failed deletion does not stop the
/// rest, but it does mark the trades phase as failed.
#[instrument(name = "clear_all", skip_all, fields(on_close = true))]
pub async fn clear_all<A: JournalApi>(api: &A, page_size: usize) -> ResetReport {
    let mut report = ResetReport {
        trades_found: 0,
        trades_deleted: 0,
        failed_deletions: Vec::new(),
        trades_phase: PhaseStatus::Succeeded,
        balance_phase: None,
        balance_reset: false,
    };

    let trades = match list_all_trades(api, page_size).await {
        Ok(trades) => trades,
        Err(e) => {
            error!(error = %e, "Failed to list trades");
            report.trades_phase = PhaseStatus::Failed(format!("could not list trades: {}", e));
            return report;
        }
    };
    report.trades_found = trades.len();
    info!(count = trades.len(), "Found trades to delete");

    for trade in &trades {
        let Some(id) = non_null(&trade.id) else {
            warn!(symbol = ?trade.symbol, "Skipping trade without id");
            continue;
        };
        match api.delete_trade(id).await {
            Ok(()) => report.trades_deleted += 1,
            Err(e) => {
                warn!(trade_id = id, error = %e, "Failed to delete trade");
                report.failed_deletions.push(id.to_string());
            }
        }
    }
    if !report.failed_deletions.is_empty() {
        report.trades_phase = PhaseStatus::Failed(format!(
            "{} of {} deletions failed",
            report.failed_deletions.len(),
            report.trades_deleted + report.failed_deletions.len()
        ));
    }

    report.balance_phase = Some(match reset_balance(api).await {
        Ok(reset) => {
            report.balance_reset = reset;
            PhaseStatus::Succeeded
        }
        Err(reason) => PhaseStatus::Failed(reason),
    });

    report
}

/// Prompts, then clears everything only on confirmation. `None` means the operator declined.
pub async fn confirm_and_clear<A, R, W>(api: &A, page_size: usize, input: R, mut output: W) -> io::Result<Option<ResetReport>>
where
    A: JournalApi,
    R: BufRead,
    W: Write,
{
    if prompt_confirmation(input, &mut output)? == Confirmation::Declined {
        info!("Reset declined by operator");
        return Ok(None);
    }
    Ok(Some(clear_all(api, page_size).await))
}

// Ok(false) when there is no balance row to reset
async fn reset_balance<A: JournalApi>(api: &A) -> Result<bool, String> {
    let balance = api
        .fetch_balance()
        .await
        .map_err(|e| format!("could not fetch balance: {}", e))?;

    let Some(balance) = balance else {
        info!("No balance row, nothing to reset");
        return Ok(false);
    };

    info!(balance_id = ?balance.id, "Resetting balance to zero");
    api.save_balance(&BalanceUpdate::zeroed())
        .await
        .map_err(|e| format!("could not reset balance: {}", e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeJournal, trade};
    use crate::models::Balance;
    use std::io::Cursor;

    fn balance() -> Balance {
        Balance {
            id: Some("b1".into()),
            amount: Some("2500".into()),
            withdrawal_amount: Some("300".into()),
            ..Default::default()
        }
    }

    #[test]
    fn only_yes_confirms() {
        assert_eq!(Confirmation::parse("yes"), Confirmation::Confirmed);
        assert_eq!(Confirmation::parse("YES\n"), Confirmation::Confirmed);
        assert_eq!(Confirmation::parse("Yes\r\n"), Confirmation::Confirmed);
        assert_eq!(Confirmation::parse("  Yes  "), Confirmation::Declined);
        assert_eq!(Confirmation::parse("yes \n"), Confirmation::Declined);
        assert_eq!(Confirmation::parse("y"), Confirmation::Declined);
        assert_eq!(Confirmation::parse("yes please"), Confirmation::Declined);
        assert_eq!(Confirmation::parse("no"), Confirmation::Declined);
        assert_eq!(Confirmation::parse(""), Confirmation::Declined);
    }

    #[test]
    fn prompt_reads_one_line() {
        let mut shown = Vec::new();
        let answer = prompt_confirmation(Cursor::new("yes\nextra\n"), &mut shown).unwrap();
        assert_eq!(answer, Confirmation::Confirmed);
        assert!(String::from_utf8(shown).unwrap().ends_with("(yes/no): "));

        let eof = prompt_confirmation(Cursor::new(""), io::sink()).unwrap();
        assert_eq!(eof, Confirmation::Declined);
    }

    #[tokio::test]
    async fn declined_confirmation_touches_nothing() {
        let api = FakeJournal::with_data(Some(balance()), vec![trade("t1")]);

        let report = confirm_and_clear(&api, 100, Cursor::new("no\n"), io::sink()).await.unwrap();

        assert!(report.is_none());
        assert!(api.calls().is_empty());
        assert_eq!(api.trades.borrow().len(), 1);
    }

    #[tokio::test]
    async fn padded_answer_touches_nothing() {
        let api = FakeJournal::with_data(Some(balance()), vec![trade("t1")]);

        let report = confirm_and_clear(&api, 100, Cursor::new("  yes \n"), io::sink()).await.unwrap();

        assert!(report.is_none());
        assert!(api.calls().is_empty());
        assert_eq!(api.trades.borrow().len(), 1);
    }

    #[tokio::test]
    async fn confirmed_prompt_runs_the_reset() {
        let api = FakeJournal::with_data(None, vec![trade("t1")]);

        let report = confirm_and_clear(&api, 100, Cursor::new("YES\n"), io::sink()).await.unwrap();

        assert_eq!(report.map(|r| r.trades_deleted), Some(1));
    }

    #[tokio::test]
    async fn clears_trades_then_zeroes_balance() {
        let api = FakeJournal::with_data(Some(balance()), vec![trade("t1"), trade("t2")]);

        let report = clear_all(&api, 100).await;

        assert!(report.succeeded());
        assert_eq!(report.trades_found, 2);
        assert_eq!(report.trades_deleted, 2);
        assert!(report.balance_reset);
        assert!(api.trades.borrow().is_empty());
        let balance = api.balance.borrow().clone().unwrap();
        assert_eq!(balance.amount.as_deref(), Some("0"));
        assert_eq!(balance.withdrawal_amount.as_deref(), Some("0"));
        assert_eq!(
            api.calls(),
            vec![
                Call::FetchTrades { skip: 0, limit: 100 },
                Call::DeleteTrade("t1".into()),
                Call::DeleteTrade("t2".into()),
                Call::FetchBalance,
                Call::SaveBalance(BalanceUpdate::zeroed()),
            ]
        );
    }

    #[tokio::test]
    async fn failed_deletion_is_reported_but_rest_continue() {
        let mut api = FakeJournal::with_data(Some(balance()), vec![trade("t1"), trade("t2"), trade("t3")]);
        api.fail_delete_ids.insert("t2".into());

        let report = clear_all(&api, 100).await;

        assert!(!report.succeeded());
        assert_eq!(report.trades_deleted, 2);
        assert_eq!(report.failed_deletions, vec!["t2".to_string()]);
        assert_eq!(report.trades_phase, PhaseStatus::Failed("1 of 3 deletions failed".into()));
        assert_eq!(report.balance_phase, Some(PhaseStatus::Succeeded));
        assert_eq!(api.trades.borrow().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_stops_before_balance() {
        let api = FakeJournal {
            fail_trades: true,
            ..FakeJournal::with_data(Some(balance()), vec![trade("t1")])
        };

        let report = clear_all(&api, 100).await;

        assert!(!report.succeeded());
        assert!(report.balance_phase.is_none());
        assert_eq!(api.calls(), vec![Call::FetchTrades { skip: 0, limit: 100 }]);
        assert_eq!(api.balance.borrow().clone().unwrap().amount.as_deref(), Some("2500"));
    }

    #[tokio::test]
    async fn missing_balance_is_not_an_error() {
        let api = FakeJournal::with_data(None, Vec::new());

        let report = clear_all(&api, 100).await;

        assert!(report.succeeded());
        assert!(!report.balance_reset);
        assert!(!api.calls().iter().any(|c| matches!(c, Call::SaveBalance(_))));
    }

    #[tokio::test]
    async fn failed_balance_save_fails_phase() {
        let api = FakeJournal {
            fail_save: true,
            ..FakeJournal::with_data(Some(balance()), Vec::new())
        };

        let report = clear_all(&api, 100).await;

        assert!(report.trades_phase.is_success());
        assert!(matches!(report.balance_phase, Some(PhaseStatus::Failed(_))));
        assert!(!report.succeeded());
    }
}
