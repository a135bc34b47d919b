//! Download file names and RideWithGPS route page URLs.

/// Longest file stem produced by [`sanitize_file_name`], in characters.
pub const MAX_FILE_STEM_CHARS: usize = 100;

const ROUTE_PAGE_PREFIX: &str = "https://ridewithgps.com/routes/";

/// Make a route name safe to use as a file stem.
///
/// Characters that are illegal on common file systems become `-`, every run
/// of whitespace becomes a single `_`, and the result is capped at
/// [`MAX_FILE_STEM_CHARS`].
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => out.push('-'),
            _ => out.push(c),
        }
    }

    out.chars().take(MAX_FILE_STEM_CHARS).collect()
}

/// File name offered for the downloaded GPX.
///
/// Falls back to `route-<timestamp_millis>` when the route has no name.
pub fn suggested_file_name(route_name: Option<&str>, timestamp_millis: u64) -> String {
    match route_name {
        Some(name) if !name.is_empty() => format!("{}.gpx", sanitize_file_name(name)),
        _ => format!("route-{timestamp_millis}.gpx"),
    }
}

/// Extract the route id from a route page URL such as
/// `https://ridewithgps.com/routes/12345`.
///
/// Anything else (other hosts, query strings, trailing segments) is `None`.
pub fn route_id_from_url(url: &str) -> Option<&str> {
    let id = url.strip_prefix(ROUTE_PAGE_PREFIX)?;
    (!id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())).then_some(id)
}

/// JSON endpoint serving the route record for `route_id`.
pub fn route_json_url(route_id: &str) -> String {
    format!("{ROUTE_PAGE_PREFIX}{route_id}.json")
}
