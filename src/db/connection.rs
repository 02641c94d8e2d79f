use sqlx::ConnectOptions;
use sqlx::postgres::{
    PgConnectOptions,
    PgPool,
    PgPoolOptions,
};
use eyre::Result;
use std::str::FromStr;
use std::time::Duration;
use tracing::log::LevelFilter;

use crate::config::Config;

pub async fn create_pool(config: &Config) -> Result<PgPool> {
    let database_url = config.require_database_url()?;
    let connect_options = PgConnectOptions::from_str(database_url)?
        .log_slow_statements(LevelFilter::Warn, Duration::from_secs(60));

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(connect_options)
        .await?;
    Ok(pool)
}
