use std::collections::HashMap;

use crate::model::position::OpenPosition;

/// Direction of a percentage move relative to the reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Alert payload produced when a symbol enters a percentage band it has not
/// alerted for during the current excursion.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceAlert {
    pub symbol: String,
    /// Band boundary as a signed percentage, a multiple of the step (e.g. -5.0, 15.0).
    pub bucket_pct: f64,
    pub change_pct: f64,
    pub price: f64,
    pub reference: f64,
    pub direction: Direction,
}

/// Outcome of processing one trade event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// First tick for a symbol with no position-derived reference: seeds the
    /// baseline silently.
    BaselineSeeded { symbol: String, price: f64 },
    NoAlert,
    Alert(PriceAlert),
}

#[derive(Debug, Clone, Default)]
struct SymbolState {
    reference: Option<f64>,
    last_alerted_bucket: Option<i64>,
}

/// Per-symbol percentage-band state machine.
///
/// Owned by the single stream-consumption task; `process` is called once per
/// trade event, in arrival order. State lives for one connection epoch and is
/// rebuilt by `reset` on reconnect.
#[derive(Debug)]
pub struct BucketTracker {
    step_pct: f64,
    states: HashMap<String, SymbolState>,
}

impl BucketTracker {
    pub fn new(watchlist: &[String], step_pct: f64) -> Self {
        Self {
            step_pct,
            states: watchlist
                .iter()
                .map(|s| (s.to_ascii_uppercase(), SymbolState::default()))
                .collect(),
        }
    }

    /// Start a new excursion epoch: forget all baselines and alerted buckets,
    /// then take references from open positions where available. Symbols
    /// without a position stay unresolved until their first tick.
    pub fn reset(&mut self, positions: &[OpenPosition]) {
        for state in self.states.values_mut() {
            *state = SymbolState::default();
        }
        for pos in positions {
            if let Some(state) = self.states.get_mut(&pos.symbol.to_ascii_uppercase()) {
                if pos.avg_entry_price > 0.0 {
                    state.reference = Some(pos.avg_entry_price);
                }
            }
        }
    }

    /// Reference price currently tracked for a symbol, if resolved.
    pub fn reference(&self, symbol: &str) -> Option<f64> {
        self.states.get(symbol).and_then(|s| s.reference)
    }

    pub fn process(&mut self, symbol: &str, price: f64) -> Decision {
        if price <= 0.0 {
            return Decision::NoAlert;
        }
        let Some(state) = self.states.get_mut(symbol) else {
            // Not on the watchlist; nothing to measure against.
            return Decision::NoAlert;
        };

        let Some(reference) = state.reference else {
            state.reference = Some(price);
            return Decision::BaselineSeeded {
                symbol: symbol.to_string(),
                price,
            };
        };

        let change_pct = (price - reference) / reference * 100.0;
        if change_pct.abs() < self.step_pct {
            // Dead zone: clearing the bucket re-arms every band for this symbol.
            state.last_alerted_bucket = None;
            return Decision::NoAlert;
        }

        // Truncation toward zero keeps band boundaries symmetric: -6.3% at a
        // 5% step lands in bucket -1 (-5%), not -2 (-10%).
        let bucket = (change_pct / self.step_pct).trunc() as i64;
        if state.last_alerted_bucket == Some(bucket) {
            return Decision::NoAlert;
        }
        state.last_alerted_bucket = Some(bucket);

        Decision::Alert(PriceAlert {
            symbol: symbol.to_string(),
            bucket_pct: bucket as f64 * self.step_pct,
            change_pct,
            price,
            reference,
            direction: if change_pct > 0.0 {
                Direction::Up
            } else {
                Direction::Down
            },
        })
    }
}
