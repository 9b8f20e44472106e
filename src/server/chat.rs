//! `POST /api/chat`: threadless run relayed as raw SSE.

use std::time::Duration;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use futures_util::StreamExt;
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info};

use crate::api::ChatRequest;
use crate::server::error::ApiError;
use crate::server::AppState;

pub async fn relay_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    // Accepted for front-end compatibility; threadless runs do not forward them.
    if request.system.is_some() || request.tools.is_some() {
        debug!(
            has_system = request.system.is_some(),
            tools = request.tools.as_ref().map_or(0, |tools| tools.len()),
            "ignoring system prompt and tools on threadless run"
        );
    }

    let deadline = deadline_after(state.max_duration);
    let message_count = request.messages.len();
    let run = timeout_at(deadline, state.relay.open_run(None, request.messages))
        .await
        .map_err(|_| {
            ApiError::gateway_timeout(format!(
                "no response from orchestration service within {}s",
                state.max_duration.as_secs()
            ))
        })??;
    info!(
        messages = message_count,
        assistant_id = %state.relay.assistant_id(),
        "relaying threadless run"
    );

    // Chunks are forwarded as received; the body ends at the deadline.
    let body = run.body.take_until(sleep_until(deadline));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, run.content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body))
        .map_err(|err| {
            error!("Failed to build SSE response: {:?}", err);
            ApiError::Internal(err.to_string())
        })
}

/// `now + window`, or a deadline far enough out to never fire when the
/// window does not fit in an `Instant`.
fn deadline_after(window: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(window)
        .unwrap_or_else(|| now + Duration::from_secs(86_400 * 365 * 30))
}
