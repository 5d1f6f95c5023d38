use chrono::DateTime;
use serde::{Deserialize, Serialize};

/// Deserialize Alpaca string-encoded decimals to f64.
pub fn string_to_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<f64>().map_err(serde::de::Error::custom)
}

/// Client -> server auth request. Must be sent within 10 seconds of connect.
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub action: &'static str,
    pub key: &'a str,
    pub secret: &'a str,
}

impl<'a> AuthRequest<'a> {
    pub fn new(key: &'a str, secret: &'a str) -> Self {
        Self {
            action: "auth",
            key,
            secret,
        }
    }
}

/// Client -> server trade subscription request.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest<'a> {
    pub action: &'static str,
    pub trades: &'a [String],
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(trades: &'a [String]) -> Self {
        Self {
            action: "subscribe",
            trades,
        }
    }
}

/// Server -> client message. Alpaca frames every payload as a JSON array of
/// these, discriminated by the "T" field.
#[derive(Debug, Deserialize)]
#[serde(tag = "T")]
pub enum StreamMessage {
    #[serde(rename = "success")]
    Success { msg: String },
    #[serde(rename = "error")]
    Error { code: i32, msg: String },
    #[serde(rename = "subscription")]
    Subscription {
        #[serde(default)]
        trades: Vec<String>,
    },
    #[serde(rename = "t")]
    Trade(TradeMessage),
    #[serde(other)]
    Other,
}

/// Trade tick from the stock trade stream (`"T":"t"`).
#[derive(Debug, Deserialize)]
pub struct TradeMessage {
    #[serde(rename = "S")]
    pub symbol: String,
    #[serde(rename = "p")]
    pub price: f64,
    #[serde(rename = "t")]
    pub timestamp: String,
}

impl TradeMessage {
    pub fn timestamp_ms(&self) -> u64 {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.timestamp_millis().max(0) as u64)
            .unwrap_or(0)
    }
}

/// Open position item (GET /v2/positions). Alpaca encodes decimals as strings.
#[derive(Debug, Deserialize)]
pub struct PositionItem {
    pub symbol: String,
    #[serde(deserialize_with = "string_to_f64")]
    pub avg_entry_price: f64,
}
