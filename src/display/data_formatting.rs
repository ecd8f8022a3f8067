use jiff::Timestamp;

/// Placeholder for values the server did not send
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a count the way list views show it: `1.5M`, `125k`, `999`.
///
/// # Examples
///
/// ```
/// use audience_console::display::format_count;
///
/// assert_eq!(format_count(999), "999");
/// assert_eq!(format_count(1_500), "2k");
/// assert_eq!(format_count(125_000), "125k");
/// assert_eq!(format_count(2_345_678), "2.3M");
/// ```
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        let millions = (n as f64 / 100_000.0).round() / 10.0;
        format!("{millions:.1}M")
    } else if n >= 1_000 {
        format!("{}k", (n as f64 / 1_000.0).round() as u64)
    } else {
        n.to_string()
    }
}

/// Format Unix seconds as `Jan 01, 2026` (UTC). Missing values read `N/A`.
///
/// # Examples
///
/// ```
/// use audience_console::display::format_epoch_date;
///
/// assert_eq!(format_epoch_date(Some(1_767_225_600)), "Jan 01, 2026");
/// assert_eq!(format_epoch_date(None), "N/A");
/// ```
pub fn format_epoch_date(seconds: Option<i64>) -> String {
    let Some(seconds) = seconds else {
        return NOT_AVAILABLE.to_string();
    };
    match Timestamp::from_second(seconds) {
        Ok(ts) => ts.strftime("%b %d, %Y").to_string(),
        Err(_) => seconds.to_string(),
    }
}

/// Upper-case the first character and lower-case the rest: `STATIC` -> `Static`.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Truncate to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
