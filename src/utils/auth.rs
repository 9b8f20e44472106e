//! Authentication utilities for API requests

pub const API_KEY_HEADER: &str = "x-api-key";

/// Attach the orchestration service credential to a request.
///
/// A missing or blank key leaves the request untouched; local dev servers
/// run without authentication.
pub fn add_auth_headers(
    request: reqwest::RequestBuilder,
    api_key: Option<&str>,
) -> reqwest::RequestBuilder {
    match api_key.map(str::trim).filter(|key| !key.is_empty()) {
        Some(key) => request.header(API_KEY_HEADER, key),
        None => request,
    }
}
