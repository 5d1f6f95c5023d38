#[derive(Debug, Clone)]
pub struct TradeEvent {
    pub symbol: String,
    pub price: f64,
    pub timestamp_ms: u64,
}
