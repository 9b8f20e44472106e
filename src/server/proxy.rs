//! `/api/{*path}`: pass-through to the orchestration service for clients
//! that talk to it directly (thread management, state reads).

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, Uri};
use axum::response::Response;
use tracing::{debug, error};

use crate::server::error::ApiError;
use crate::server::AppState;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::{construct_api_url, normalize_base_url};

const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

pub struct UpstreamProxy {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamProxy {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            api_key,
        }
    }

    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let url = construct_api_url(&self.base_url, path);
        match query.filter(|query| !query.is_empty()) {
            Some(query) => format!("{url}?{query}"),
            None => url,
        }
    }
}

pub async fn forward(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let Some(proxy) = state.proxy.as_ref() else {
        return Err(ApiError::NotFound(format!("/api/{path}")));
    };
    let target_url = proxy.target_url(&path, uri.query());
    debug!(method = %method, target = %target_url, "proxying request");

    let mut request = proxy.client.request(method, &target_url);
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value.clone());
        }
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = add_auth_headers(request, proxy.api_key.as_deref())
        .send()
        .await
        .map_err(|err| {
            error!("Failed to reach {}: {:?}", target_url, err);
            ApiError::bad_gateway(format!("failed to reach orchestration service: {err}"))
        })?;

    let mut response = Response::builder().status(upstream.status());
    if let Some(content_type) = upstream.headers().get(header::CONTENT_TYPE) {
        response = response.header(header::CONTENT_TYPE, content_type.clone());
    }
    response
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|err| ApiError::Internal(err.to_string()))
}
