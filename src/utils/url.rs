//! Helpers for building endpoint URLs from the configured API base.
//!
//! The base URL usually comes from user configuration, so it may carry
//! trailing slashes. Endpoint names never should.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use whispi::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://functions.example.net/"),
///     "https://functions.example.net"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash between them.
///
/// ```
/// use whispi::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://functions.example.net/", "/getUserChats"),
///     "https://functions.example.net/getUserChats"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Check that a user-supplied base URL is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<String, String> {
    let normalized = normalize_base_url(base_url);
    match reqwest::Url::parse(&normalized) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(normalized),
        Ok(url) => Err(format!(
            "Unsupported URL scheme '{}' (expected http or https)",
            url.scheme()
        )),
        Err(err) => Err(format!("Invalid URL '{normalized}': {err}")),
    }
}
