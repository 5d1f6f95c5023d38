use anyhow::{Context, Result};

use crate::alpaca::rest::AlpacaRestClient;
use crate::model::position::OpenPosition;

/// Keep only positions for watched symbols with a usable entry price.
pub fn filter_watched(positions: Vec<OpenPosition>, watchlist: &[String]) -> Vec<OpenPosition> {
    positions
        .into_iter()
        .filter(|p| p.avg_entry_price > 0.0 && watchlist.iter().any(|s| s == &p.symbol))
        .collect()
}

/// Resolve reference prices for one connection epoch.
///
/// Symbols with an open position get the position's average entry price;
/// every other watched symbol stays unresolved and is seeded from its first
/// tick. A failed position query fails the whole cycle so the supervisor can
/// retry after its fixed delay.
pub async fn resolve(
    rest: &AlpacaRestClient,
    watchlist: &[String],
) -> Result<Vec<OpenPosition>> {
    let positions = rest
        .get_open_positions()
        .await
        .context("position snapshot query failed")?;
    let tracked = filter_watched(positions, watchlist);

    for pos in &tracked {
        tracing::info!(
            symbol = %pos.symbol,
            entry = pos.avg_entry_price,
            "baseline from position entry price"
        );
    }
    for sym in watchlist {
        if !tracked.iter().any(|p| &p.symbol == sym) {
            tracing::info!(symbol = %sym, "no open position; baseline seeds from first tick");
        }
    }
    Ok(tracked)
}
