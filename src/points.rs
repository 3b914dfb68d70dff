use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static PLUS_POINTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+([0-9]+)").expect("plus points pattern is valid"));

/// Value of the first `+N` token in `text`. Digits are consumed greedily, so
/// `+10abc` yields 10. Later tokens are ignored.
pub fn extract_numeric_value(text: &str) -> Option<i64> {
    let digits = PLUS_POINTS.captures(text)?.get(1)?.as_str();
    // Only overflow can fail here; saturate and let the clamp cap it.
    Some(digits.parse().unwrap_or(i64::MAX))
}

/// Caps `value` at `max`. No lower bound is applied.
pub fn clamp_points(value: i64, max: i64) -> i64 {
    if value > max {
        warn!(
            event_name = "recognition.points.clamped",
            value, max, "value exceeds max, adjusting"
        );
        return max;
    }

    value
}
