pub mod client;

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Balance, BalanceUpdate, Trade, non_null};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),
    #[error("bad response: {0}")]
    Response(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
}

/// The slice of the trading-journal HTTP API the operational tools rely on
#[allow(async_fn_in_trait)]
pub trait JournalApi {
    /// `GET /api/balance`; `None` when the journal has no balance row yet
    async fn fetch_balance(&self) -> Result<Option<Balance>, ApiError>;

    /// `GET /api/trades?skip=..&limit=..`
    async fn fetch_trades_page(&self, skip: usize, limit: usize) -> Result<Vec<Trade>, ApiError>;

    /// `DELETE /api/trades/{id}`
    async fn delete_trade(&self, id: &str) -> Result<(), ApiError>;

    /// `POST /api/balance`
    async fn save_balance(&self, update: &BalanceUpdate) -> Result<(), ApiError>;
}

/// Pages through `/api/trades` until a short page comes back.
///
/// Stops early if a full page brings no unseen ids, so a server that ignores
/// `skip` cannot loop forever. Rows without an id never count as progress, and
/// after the first page they are only kept from pages that also brought new ids.
pub async fn list_all_trades<A: JournalApi>(api: &A, page_size: usize) -> Result<Vec<Trade>, ApiError> {
    let mut trades: Vec<Trade> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut skip = 0;

    loop {
        let page = api.fetch_trades_page(skip, page_size).await?;
        let page_len = page.len();
        debug!(skip, page_len, "Fetched trades page");

        let mut fresh = 0;
        let mut unkeyed = Vec::new();
        for trade in page {
            match non_null(&trade.id) {
                Some(id) if seen_ids.insert(id.to_string()) => {
                    fresh += 1;
                    trades.push(trade);
                }
                Some(_) => {}
                None => unkeyed.push(trade),
            }
        }
        if fresh > 0 || skip == 0 {
            trades.extend(unkeyed);
        }

        if page_len < page_size {
            break;
        }
        if fresh == 0 {
            warn!(skip, "Trades page repeated already seen rows, stopping pagination");
            break;
        }
        skip += page_len;
    }

    Ok(trades)
}


#[cfg(test)]
mod tests {
    use super::fake::{Call, FakeJournal, trade};
    use super::*;

    #[tokio::test]
    async fn pages_until_short_page() {
        let trades: Vec<Trade> = (0..5).map(|i| trade(&format!("t{i}"))).collect();
        let api = FakeJournal::with_data(None, trades);

        let listed = list_all_trades(&api, 2).await.unwrap();

        let ids: Vec<_> = listed.iter().map(|t| t.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(
            api.calls(),
            vec![
                Call::FetchTrades { skip: 0, limit: 2 },
                Call::FetchTrades { skip: 2, limit: 2 },
                Call::FetchTrades { skip: 4, limit: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_empty_page() {
        let trades: Vec<Trade> = (0..4).map(|i| trade(&format!("t{i}"))).collect();
        let api = FakeJournal::with_data(None, trades);

        let listed = list_all_trades(&api, 2).await.unwrap();

        assert_eq!(listed.len(), 4);
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn stops_when_server_ignores_skip() {
        let trades: Vec<Trade> = (0..4).map(|i| trade(&format!("t{i}"))).collect();
        let api = FakeJournal { ignore_skip: true, ..FakeJournal::with_data(None, trades) };

        let listed = list_all_trades(&api, 2).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn idless_rows_do_not_keep_a_repeating_listing_alive() {
        let unkeyed = |symbol: &str| Trade { id: None, symbol: Some(symbol.into()), ..Default::default() };
        let api = FakeJournal {
            ignore_skip: true,
            ..FakeJournal::with_data(None, vec![unkeyed("AAPL"), unkeyed("MSFT")])
        };

        let listed = list_all_trades(&api, 2).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(api.calls(), vec![Call::FetchTrades { skip: 0, limit: 2 }]);
    }

    #[tokio::test]
    async fn repeated_mixed_page_is_not_duplicated() {
        let unkeyed = Trade { id: None, symbol: Some("AAPL".into()), ..Default::default() };
        let api = FakeJournal {
            ignore_skip: true,
            ..FakeJournal::with_data(None, vec![trade("t1"), unkeyed])
        };

        let listed = list_all_trades(&api, 2).await.unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn listing_error_propagates() {
        let api = FakeJournal { fail_trades: true, ..Default::default() };
        assert!(list_all_trades(&api, 100).await.is_err());
    }
}
