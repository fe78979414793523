// TTL string parsing — turns human-readable durations like "15m",
// "7d", "90 seconds" into milliseconds or `Duration`.

/// Time constants in milliseconds.
pub const SEC_MS: u64 = 1_000;
pub const MIN_MS: u64 = SEC_MS * 60;
pub const HOUR_MS: u64 = MIN_MS * 60;
pub const DAY_MS: u64 = HOUR_MS * 24;
pub const WEEK_MS: u64 = DAY_MS * 7;

/// Parse a TTL string and return the value in milliseconds.
///
/// Supports `"30s"`, `"15m"`, `"24h"`, `"7d"`, `"2w"` and long forms
/// like `"90 seconds"` or `"1 day"`. TTLs are always positive.
pub fn ms(value: &str) -> Result<u64, String> {
    let value = value.trim();

    let re = regex::Regex::new(
        r"(?i)^(\d+(?:\.\d+)?)\s*(seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w)$",
    )
    .unwrap();

    let caps = re.captures(value).ok_or_else(|| {
        format!("invalid duration \"{value}\"; use formats like \"30s\", \"15m\", \"7d\"")
    })?;

    let n: f64 = caps[1]
        .parse()
        .map_err(|_| format!("invalid number in \"{value}\""))?;

    let multiplier = match caps[2].to_lowercase().as_str() {
        "weeks" | "week" | "w" => WEEK_MS,
        "days" | "day" | "d" => DAY_MS,
        "hours" | "hour" | "hrs" | "hr" | "h" => HOUR_MS,
        "minutes" | "minute" | "mins" | "min" | "m" => MIN_MS,
        "seconds" | "second" | "secs" | "sec" | "s" => SEC_MS,
        unit => return Err(format!("unknown time unit \"{unit}\"")),
    };

    Ok((n * multiplier as f64) as u64)
}

/// Parse a TTL string into a `std::time::Duration`.
pub fn duration(value: &str) -> Result<std::time::Duration, String> {
    Ok(std::time::Duration::from_millis(ms(value)?))
}

/// Parse a TTL string into whole seconds, rounding to the nearest.
pub fn sec(value: &str) -> Result<u64, String> {
    let millis = ms(value)?;
    Ok((millis as f64 / 1000.0).round() as u64)
}
