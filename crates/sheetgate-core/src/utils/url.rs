// URL utilities — spreadsheet id/gid extraction, deep-link query
// parameters, and destination classification.

/// Extract the spreadsheet id from a share URL.
///
/// Looks for the `/spreadsheets/d/<id>/` path segment.
pub fn extract_spreadsheet_id(url: &str) -> Option<String> {
    let re = regex::Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").unwrap();
    re.captures(url).map(|caps| caps[1].to_string())
}

/// Extract the worksheet gid from a share URL.
///
/// Accepts both the query form (`?gid=123`) and the fragment form
/// (`#gid=123`).
pub fn extract_gid(url: &str) -> Option<u64> {
    let re = regex::Regex::new(r"[?#&]gid=(\d+)").unwrap();
    re.captures(url).and_then(|caps| caps[1].parse().ok())
}

/// Read the `next` query parameter from the current location, used for
/// deep-link redirect-after-auth.
pub fn next_param(location: &str) -> Option<String> {
    let parsed = parse_lenient(location)?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

/// Whether a destination is an in-app path (versus a full URL).
///
/// A single leading slash means internal; protocol-relative `//host`
/// and absolute URLs are external.
pub fn is_internal_path(destination: &str) -> bool {
    destination.starts_with('/') && !destination.starts_with("//")
}

/// The path a token issued for `destination` is scoped to.
///
/// Internal destinations scope to their path without query or
/// fragment; external URLs scope to the parsed path component.
pub fn destination_scope(destination: &str) -> String {
    if is_internal_path(destination) {
        let end = destination
            .find(|c| c == '?' || c == '#')
            .unwrap_or(destination.len());
        return destination[..end].to_string();
    }
    match url::Url::parse(destination) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => destination.to_string(),
    }
}

/// Parse an absolute URL, falling back to a placeholder base for
/// path-relative locations like `/members?next=/reports`.
fn parse_lenient(location: &str) -> Option<url::Url> {
    if let Ok(parsed) = url::Url::parse(location) {
        return Some(parsed);
    }
    let base = url::Url::parse("http://sheetgate.invalid").ok()?;
    base.join(location).ok()
}
