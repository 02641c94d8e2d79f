use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, JournalApi};
use crate::config::Config;
use crate::models::{Balance, BalanceUpdate, Trade};

/// HTTP client for the trading-journal API
#[derive(Debug, Clone)]
pub struct JournalClient {
    http_client: ClientWithMiddleware,
    base_url: Url,
}

impl JournalClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let reqwest_client = reqwest_middleware::reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_millis(1000))
            .build_with_max_retries(config.http_max_retries);

        let http_client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            http_client,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl JournalApi for JournalClient {
    #[instrument(skip(self))]
    async fn fetch_balance(&self) -> Result<Option<Balance>, ApiError> {
        let url = self.endpoint(&["api", "balance"])?;
        let response = self.http_client.get(url).send().await?.error_for_status()?;
        let balance: Balance = response.json().await?;
        debug!(?balance, "Received balance");
        Ok(Some(balance).filter(Balance::exists))
    }

    #[instrument(skip(self))]
    async fn fetch_trades_page(&self, skip: usize, limit: usize) -> Result<Vec<Trade>, ApiError> {
        let url = self.endpoint(&["api", "trades"])?;
        let params = [
            ("skip", skip.to_string()),
            ("limit", limit.to_string()),
        ];
        let response = self.http_client.get(url).query(&params).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete_trade(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "trades", id])?;
        self.http_client.delete(url).send().await?.error_for_status()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn save_balance(&self, update: &BalanceUpdate) -> Result<(), ApiError> {
        let url = self.endpoint(&["api", "balance"])?;
        self.http_client.post(url).json(update).send().await?.error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base: &str) -> JournalClient {
        let config = Config::from_lookup(|key| match key {
            "JOURNAL_API_URL" => Some(base.to_string()),
            _ => None,
        })
        .unwrap();
        JournalClient::new(&config).unwrap()
    }

    #[test]
    fn endpoints_join_onto_base_path() {
        let client = client_for("http://localhost:5000");
        assert_eq!(
            client.endpoint(&["api", "balance"]).unwrap().as_str(),
            "http://localhost:5000/api/balance"
        );

        let prefixed = client_for("http://journal.local/app/");
        assert_eq!(
            prefixed.endpoint(&["api", "trades"]).unwrap().as_str(),
            "http://journal.local/app/api/trades"
        );
    }

    #[test]
    fn trade_ids_are_encoded_as_one_segment() {
        let client = client_for("http://localhost:5000");
        assert_eq!(
            client.endpoint(&["api", "trades", "a/b c"]).unwrap().as_str(),
            "http://localhost:5000/api/trades/a%2Fb%20c"
        );
    }
}
