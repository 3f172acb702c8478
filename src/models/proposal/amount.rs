//! Bookkeeping for the list of previously quoted amounts.
//!
//! Options are compared as formatted strings, so `1500` and `1500.0` are the
//! same option while `1500` and `1500.00` typed by hand elsewhere are not.

/// Integral amounts print without a fractional part; everything else uses the
/// shortest representation that round-trips.
pub fn format_amount(amount: f64) -> String {
    if amount == 0.0 {
        // avoids "-0"
        return "0".to_string();
    }
    amount.to_string()
}

/// The options list with `amount` appended, or `None` when it is already
/// present.
pub fn with_amount_option(options: &[String], amount: f64) -> Option<Vec<String>> {
    let formatted = format_amount(amount);
    if options.iter().any(|o| *o == formatted) {
        return None;
    }
    let mut next = options.to_vec();
    next.push(formatted);
    Some(next)
}

/// Server-side merge: existing options keep their order, incoming ones are
/// appended when new. Nothing is ever dropped.
pub fn merge_amount_options(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    for option in incoming {
        let option = option.trim();
        if option.is_empty() || merged.iter().any(|o| o == option) {
            continue;
        }
        merged.push(option.to_string());
    }
    merged
}
