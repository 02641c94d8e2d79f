use sqlx::{
    Executor,
    postgres::PgPool,
};

pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("balance.sql")).await?;
    pool.execute(include_str!("trades.sql")).await?;

    // Lookup indices used by the journal's trade list filters
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS trades_symbol_idx
        ON trades(symbol);
        "#
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS trades_entry_time_idx
        ON trades(entry_time);
        "#
    )
    .execute(pool)
    .await?;

    Ok(())
}
