use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::Value;

/// Balance row as returned by `GET /api/balance`
///
/// The API answers with `id: null` when no balance row exists yet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub withdrawal_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub updated_at: Option<String>,
}

impl Balance {
    /// True when the API reported an actual row rather than its placeholder
    pub fn exists(&self) -> bool {
        non_null(&self.id).is_some()
    }
}

/// Trade row as returned by `GET /api/trades`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub entry_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub exit_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub strategy_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub trade_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub position_size: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub profit_loss: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub exit_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub entry_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub exit_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_closed: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub updated_at: Option<String>,
}

/// Body of `POST /api/balance`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceUpdate {
    pub amount: String,
    pub withdrawal_amount: String,
}

impl BalanceUpdate {
    pub fn zeroed() -> Self {
        Self {
            amount: "0".to_string(),
            withdrawal_amount: "0".to_string(),
        }
    }
}

/// Open/closed breakdown of a trade list, logged after every export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeSummary {
    pub total: usize,
    pub closed: usize,
    pub open: usize,
}

impl TradeSummary {
    pub fn of(trades: &[Trade]) -> Self {
        let closed = trades.iter().filter(|t| t.is_closed == Some(true)).count();
        Self {
            total: trades.len(),
            closed,
            open: trades.len() - closed,
        }
    }
}

/// Returns the value unless it is absent, empty, or the text `null`
pub fn non_null(value: &Option<String>) -> Option<&str> {
    match value.as_deref() {
        None => None,
        Some(v) if v.is_empty() || v.eq_ignore_ascii_case("null") => None,
        Some(v) => Some(v),
    }
}

// Decimals come back as strings, but older rows and hand-edited payloads may carry numbers or booleans
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a scalar, got {}", other))),
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(Value::String(s)) if s.is_empty() || s.eq_ignore_ascii_case("null") => Ok(None),
        Some(other) => Err(D::Error::custom(format!("expected a boolean, got {}", other))),
    }
}
