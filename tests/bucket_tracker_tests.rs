use price_sentinel::model::position::OpenPosition;
use price_sentinel::tracker::{BucketTracker, Decision, Direction};

fn watchlist(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

fn tracker_with_reference(symbol: &str, entry: f64) -> BucketTracker {
    let mut tracker = BucketTracker::new(&watchlist(&[symbol]), 5.0);
    tracker.reset(&[OpenPosition::new(symbol, entry)]);
    tracker
}

fn expect_alert(decision: Decision) -> price_sentinel::tracker::PriceAlert {
    match decision {
        Decision::Alert(alert) => alert,
        other => panic!("expected alert, got {:?}", other),
    }
}

#[test]
fn first_tick_seeds_unresolved_baseline_without_alert() {
    let mut tracker = BucketTracker::new(&watchlist(&["AMZN"]), 5.0);
    assert_eq!(tracker.reference("AMZN"), None);

    let decision = tracker.process("AMZN", 200.0);
    assert_eq!(
        decision,
        Decision::BaselineSeeded {
            symbol: "AMZN".to_string(),
            price: 200.0
        }
    );
    assert_eq!(tracker.reference("AMZN"), Some(200.0));

    // Even a large jump right after seeding measures against the seed price.
    let alert = expect_alert(tracker.process("AMZN", 220.0));
    assert!((alert.reference - 200.0).abs() < f64::EPSILON);
}

#[test]
fn position_entry_price_is_the_reference() {
    let mut tracker = tracker_with_reference("MSTR", 100.0);
    // First tick does not reseed: 4% off the entry price stays silent.
    assert_eq!(tracker.process("MSTR", 104.0), Decision::NoAlert);
    assert_eq!(tracker.reference("MSTR"), Some(100.0));
}

#[test]
fn dead_zone_produces_no_alert() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    for price in [96.0, 100.0, 104.9] {
        assert_eq!(tracker.process("AMZN", price), Decision::NoAlert);
    }
}

#[test]
fn same_bucket_never_realerts() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    let alert = expect_alert(tracker.process("AMZN", 106.0));
    assert!((alert.bucket_pct - 5.0).abs() < f64::EPSILON);
    assert_eq!(alert.direction, Direction::Up);

    assert_eq!(tracker.process("AMZN", 107.0), Decision::NoAlert);
    assert_eq!(tracker.process("AMZN", 108.0), Decision::NoAlert);
}

#[test]
fn dead_zone_visit_rearms_the_same_bucket() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    expect_alert(tracker.process("AMZN", 106.0));
    assert_eq!(tracker.process("AMZN", 102.0), Decision::NoAlert);

    let alert = expect_alert(tracker.process("AMZN", 107.0));
    assert!((alert.bucket_pct - 5.0).abs() < f64::EPSILON);
}

#[test]
fn negative_buckets_truncate_toward_zero() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    let alert = expect_alert(tracker.process("AMZN", 93.7));
    assert!((alert.change_pct - (-6.3)).abs() < 1e-9);
    assert!((alert.bucket_pct - (-5.0)).abs() < f64::EPSILON);
    assert_eq!(alert.direction, Direction::Down);
}

#[test]
fn direct_jump_alerts_once_at_the_outer_band() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    let alert = expect_alert(tracker.process("AMZN", 118.0));
    assert!((alert.bucket_pct - 15.0).abs() < f64::EPSILON);

    // Still in bucket 15: no second alert.
    assert_eq!(tracker.process("AMZN", 117.0), Decision::NoAlert);
}

#[test]
fn widening_move_alerts_each_new_bucket_once() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    let first = expect_alert(tracker.process("AMZN", 106.0));
    assert!((first.bucket_pct - 5.0).abs() < f64::EPSILON);
    let second = expect_alert(tracker.process("AMZN", 111.0));
    assert!((second.bucket_pct - 10.0).abs() < f64::EPSILON);
    assert_eq!(tracker.process("AMZN", 112.0), Decision::NoAlert);
}

#[test]
fn crossing_to_the_other_side_alerts_again() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    expect_alert(tracker.process("AMZN", 106.0));
    let down = expect_alert(tracker.process("AMZN", 93.0));
    assert!((down.bucket_pct - (-5.0)).abs() < f64::EPSILON);
    assert_eq!(down.direction, Direction::Down);
}

#[test]
fn epoch_reset_rearms_alerted_buckets() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    expect_alert(tracker.process("AMZN", 106.0));
    assert_eq!(tracker.process("AMZN", 106.5), Decision::NoAlert);

    // New connection epoch with the same position snapshot.
    tracker.reset(&[OpenPosition::new("AMZN", 100.0)]);
    let alert = expect_alert(tracker.process("AMZN", 106.5));
    assert!((alert.bucket_pct - 5.0).abs() < f64::EPSILON);
}

#[test]
fn epoch_reset_forgets_tick_seeded_baselines() {
    let mut tracker = BucketTracker::new(&watchlist(&["AMZN"]), 5.0);
    tracker.process("AMZN", 100.0);
    assert_eq!(tracker.reference("AMZN"), Some(100.0));

    tracker.reset(&[]);
    assert_eq!(tracker.reference("AMZN"), None);
    assert_eq!(
        tracker.process("AMZN", 150.0),
        Decision::BaselineSeeded {
            symbol: "AMZN".to_string(),
            price: 150.0
        }
    );
}

#[test]
fn unwatched_symbols_and_bad_prices_are_ignored() {
    let mut tracker = tracker_with_reference("AMZN", 100.0);
    assert_eq!(tracker.process("TSLA", 500.0), Decision::NoAlert);
    assert_eq!(tracker.process("AMZN", 0.0), Decision::NoAlert);
    assert_eq!(tracker.process("AMZN", -1.0), Decision::NoAlert);
    // The bad price did not disturb tracked state.
    assert_eq!(tracker.reference("AMZN"), Some(100.0));
}

#[test]
fn custom_step_size_changes_band_boundaries() {
    let mut tracker = BucketTracker::new(&watchlist(&["AMZN"]), 2.5);
    tracker.reset(&[OpenPosition::new("AMZN", 100.0)]);
    assert_eq!(tracker.process("AMZN", 102.0), Decision::NoAlert);
    let alert = expect_alert(tracker.process("AMZN", 102.6));
    assert!((alert.bucket_pct - 2.5).abs() < f64::EPSILON);
}
