use price_sentinel::baseline::filter_watched;
use price_sentinel::model::position::OpenPosition;

fn watchlist(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

#[test]
fn keeps_only_watched_positions() {
    let positions = vec![
        OpenPosition::new("AMZN", 198.7),
        OpenPosition::new("TSLA", 410.0),
        OpenPosition::new("MSTR", 1510.25),
    ];
    let tracked = filter_watched(positions, &watchlist(&["AMZN", "MSTR"]));
    let symbols: Vec<&str> = tracked.iter().map(|p| p.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AMZN", "MSTR"]);
}

#[test]
fn drops_positions_without_a_usable_entry_price() {
    let positions = vec![
        OpenPosition::new("AMZN", 0.0),
        OpenPosition::new("MSTR", -1.0),
    ];
    assert!(filter_watched(positions, &watchlist(&["AMZN", "MSTR"])).is_empty());
}

#[test]
fn no_positions_means_everything_seeds_from_first_tick() {
    assert!(filter_watched(Vec::new(), &watchlist(&["AMZN"])).is_empty());
}

#[test]
fn position_symbols_are_normalized_to_uppercase() {
    let positions = vec![OpenPosition::new("amzn", 198.7)];
    let tracked = filter_watched(positions, &watchlist(&["AMZN"]));
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].symbol, "AMZN");
}
