//! Value converters that only look at the token.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(\d+)w)?(?:(\d+)d)?(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$")
        .expect("duration pattern is valid")
});

pub(crate) fn parse_str(part: &str) -> Option<String> {
    Some(part.to_string())
}

/// Decimal integer; single `_` between digits is allowed (`1_000`).
pub(crate) fn parse_int(part: &str) -> Option<i64> {
    let digits = part.strip_prefix(['+', '-']).unwrap_or(part);
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    part.replace('_', "").parse().ok()
}

/// Decimal float; NaN and infinities are rejected.
pub(crate) fn parse_float(part: &str) -> Option<f64> {
    part.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_bool(part: &str) -> Option<bool> {
    match part.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// `1w2d3h4m5s`; every unit is optional but at least one must be given.
pub(crate) fn parse_duration(part: &str) -> Option<Duration> {
    const UNITS: [u64; 5] = [7 * 86_400, 86_400, 3_600, 60, 1];

    let captures = DURATION_REGEX.captures(part)?;
    let mut seconds: u64 = 0;
    let mut matched = false;
    for (group, unit) in UNITS.iter().enumerate() {
        if let Some(amount) = captures.get(group + 1) {
            let amount: u64 = amount.as_str().parse().ok()?;
            seconds = seconds.checked_add(amount.checked_mul(*unit)?)?;
            matched = true;
        }
    }
    matched.then(|| Duration::from_secs(seconds))
}
