use anyhow::{bail, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};

use super::types::PositionItem;
use crate::model::position::OpenPosition;

pub struct AlpacaRestClient {
    http: reqwest::Client,
    trading_base_url: String,
}

impl AlpacaRestClient {
    pub fn new(trading_base_url: &str, api_key: &str, api_secret: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("APCA-API-KEY-ID", HeaderValue::from_str(api_key)?);
        headers.insert("APCA-API-SECRET-KEY", HeaderValue::from_str(api_secret)?);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("failed to build Alpaca HTTP client")?;
        Ok(Self {
            http,
            trading_base_url: trading_base_url.to_string(),
        })
    }

    /// All currently open positions (GET /v2/positions).
    pub async fn get_open_positions(&self) -> Result<Vec<OpenPosition>> {
        let url = format!("{}/v2/positions", self.trading_base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("alpaca get positions HTTP failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("alpaca get positions failed ({}): {}", status, body);
        }
        let items: Vec<PositionItem> = response
            .json()
            .await
            .context("alpaca get positions JSON parse failed")?;
        Ok(items
            .into_iter()
            .map(|p| OpenPosition::new(&p.symbol, p.avg_entry_price))
            .collect())
    }
}
