// Amount parser — best-effort free-text-to-number conversion. Total
// and deterministic: every input yields a number, unparseable ones
// yield 0.
//
// Handles parenthesized negatives, rupee currency tokens, regional
// magnitude suffixes (lakh = 1e5, crore = 1e7), and US-style thousand
// separators. When both comma and dot appear, commas are assumed to be
// separators; European-style "1.234,56" therefore misparses. That is
// inherited behavior downstream displays depend on.

use serde_json::Value;

const LAKH: f64 = 100_000.0;
const CRORE: f64 = 10_000_000.0;

/// Parse an arbitrary JSON cell value into an amount.
pub fn parse_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_amount_str(s),
        _ => 0.0,
    }
}

/// Parse a raw string into an amount.
pub fn parse_amount_str(raw: &str) -> f64 {
    // Exotic whitespace becomes plain spaces.
    let normalized: String = raw
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    let mut text = normalized.trim().to_string();
    if text.is_empty() {
        return 0.0;
    }

    // Parenthesized values denote negatives: "(123.45)" → -123.45.
    let mut paren_negative = false;
    if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        paren_negative = true;
        text = text[1..text.len() - 1].to_string();
    }

    // Currency tokens and trailing slash-dash markers.
    let currency = regex::Regex::new(r"(?i)(inr|rupees|rs|₹|/-)").unwrap();
    let text = currency.replace_all(&text, "");

    // Anything outside the working charset is dropped.
    let text: String = text
        .chars()
        .filter(|c| {
            c.is_ascii_digit()
                || c.is_ascii_alphabetic()
                || matches!(c, '.' | ',' | '-' | ' ')
        })
        .collect();

    // Regional magnitude suffixes on a numeric prefix.
    let suffix = regex::Regex::new(r"(?i)^\s*(-?[0-9.,]+)\s*(l|lakhs?|c|cr|crores?)\s*$").unwrap();
    let (number_part, multiplier) = match suffix.captures(&text) {
        Some(caps) => {
            let unit = caps[2].to_lowercase();
            let m = if unit.starts_with('c') { CRORE } else { LAKH };
            (caps[1].to_string(), m)
        }
        None => (text.trim().to_string(), 1.0),
    };

    // Commas are always separators, never decimals.
    let mut cleaned: String = number_part
        .chars()
        .filter(|&c| c != ',' && c != ' ')
        .collect();

    // Only a single leading negative sign is honored.
    let negative_sign = cleaned.starts_with('-');
    cleaned.retain(|c| c != '-');

    let mut amount: f64 = cleaned.parse().unwrap_or(0.0);
    if !amount.is_finite() {
        return 0.0;
    }
    if negative_sign {
        amount = -amount;
    }
    amount *= multiplier;
    if paren_negative && amount > 0.0 {
        amount = -amount;
    }
    amount
}
