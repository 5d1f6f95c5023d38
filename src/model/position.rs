/// An open brokerage position, reduced to what baseline resolution needs.
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub symbol: String,
    pub avg_entry_price: f64,
}

impl OpenPosition {
    pub fn new(symbol: &str, avg_entry_price: f64) -> Self {
        Self {
            symbol: symbol.to_ascii_uppercase(),
            avg_entry_price,
        }
    }
}
