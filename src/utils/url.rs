//! URL utilities for consistent URL handling
//!
//! This module provides utilities for normalizing URLs to prevent issues
//! with trailing slashes when constructing API endpoints.

use crate::api::ThreadId;

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use graphchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:2024"), "http://localhost:2024");
/// assert_eq!(normalize_base_url("http://localhost:2024///"), "http://localhost:2024");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use graphchat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:2024/", "/runs/stream"),
///     "http://localhost:2024/runs/stream"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// `{base}/threads/{id}` or `{base}/threads/{id}/{suffix}`, with the id
/// percent-encoded so it always stays a single path segment.
pub fn thread_endpoint(base_url: &str, thread_id: &ThreadId, suffix: &str) -> String {
    let encoded = urlencoding::encode(thread_id.as_str());
    let suffix = suffix.trim_matches('/');
    if suffix.is_empty() {
        construct_api_url(base_url, &format!("threads/{encoded}"))
    } else {
        construct_api_url(base_url, &format!("threads/{encoded}/{suffix}"))
    }
}
