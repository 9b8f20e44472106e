//! HTTP client for a LangGraph-compatible orchestration service.

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::json;
use tracing::debug;

use crate::api::{RunPayload, Thread, ThreadId, ThreadState};
use crate::core::backend::{OrchestrationBackend, RunRequest, RunStream};
use crate::core::error::RelayError;
use crate::core::stream::EVENT_STREAM_CONTENT_TYPE;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::{construct_api_url, normalize_base_url, thread_endpoint};

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        add_auth_headers(self.client.request(method, url), self.api_key.as_deref())
    }

    /// Pass successful responses through; turn anything else into a
    /// classified [`RelayError`] carrying a summary of the body.
    async fn check(
        response: reqwest::Response,
        thread_id: Option<&ThreadId>,
    ) -> Result<reqwest::Response, RelayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                debug!(status = status.as_u16(), error = %err, "failed to read error response body");
                String::new()
            }
        };
        debug!(status = status.as_u16(), body = %body, "orchestration service returned an error");
        Err(RelayError::from_status(status.as_u16(), &body, thread_id))
    }
}

#[async_trait]
impl OrchestrationBackend for HttpBackend {
    async fn create_thread(&self) -> Result<Thread, RelayError> {
        let response = self
            .request(Method::POST, construct_api_url(&self.base_url, "threads"))
            .json(&json!({}))
            .send()
            .await?;
        let response = Self::check(response, None).await?;
        Ok(response.json::<Thread>().await?)
    }

    async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError> {
        let response = self
            .request(
                Method::GET,
                thread_endpoint(&self.base_url, thread_id, "state"),
            )
            .send()
            .await?;
        let response = Self::check(response, Some(thread_id)).await?;
        Ok(response.json::<ThreadState>().await?)
    }

    async fn stream_run(&self, request: RunRequest) -> Result<RunStream, RelayError> {
        let url = match &request.thread_id {
            Some(thread_id) => thread_endpoint(&self.base_url, thread_id, "runs/stream"),
            None => construct_api_url(&self.base_url, "runs/stream"),
        };
        let payload = RunPayload {
            assistant_id: &request.assistant_id,
            input: &request.input,
            stream_mode: request.stream_mode,
        };

        let response = self
            .request(Method::POST, url)
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .json(&payload)
            .send()
            .await?;
        let response = Self::check(response, request.thread_id.as_ref()).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(EVENT_STREAM_CONTENT_TYPE)
            .to_string();
        let body = response.bytes_stream().map_err(RelayError::from).boxed();

        Ok(RunStream { content_type, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Message;
    use crate::core::stream::StreamEvent;
    use crate::utils::test_utils::{spawn_mock_langgraph, spawn_router};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Router;

    fn backend(base_url: &str, api_key: Option<&str>) -> HttpBackend {
        HttpBackend::new(
            reqwest::Client::new(),
            base_url,
            api_key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn create_thread_posts_empty_object_with_key() {
        let mock = spawn_mock_langgraph().await;
        let backend = backend(&mock.base_url, Some("secret"));

        let thread = backend.create_thread().await.unwrap();
        assert!(!thread.thread_id.as_str().is_empty());

        let captured = mock.requests();
        assert_eq!(captured[0].method, "POST");
        assert_eq!(captured[0].path, "/threads");
        assert_eq!(captured[0].body, json!({}));
        assert_eq!(captured[0].api_key.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn new_thread_state_is_empty() {
        let mock = spawn_mock_langgraph().await;
        let backend = backend(&mock.base_url, None);

        let thread = backend.create_thread().await.unwrap();
        let state = backend.get_thread_state(&thread.thread_id).await.unwrap();
        assert!(state.messages().is_empty());

        let captured = mock.requests();
        assert_eq!(captured[1].method, "GET");
        assert_eq!(captured[1].path, format!("/threads/{}/state", thread.thread_id));
        assert!(captured.iter().all(|req| req.api_key.is_none()));
    }

    #[tokio::test]
    async fn missing_thread_maps_to_not_found() {
        let mock = spawn_mock_langgraph().await;
        let backend = backend(&mock.base_url, None);
        let id = ThreadId::new("missing");

        let err = backend.get_thread_state(&id).await.unwrap_err();
        assert!(matches!(err, RelayError::ThreadNotFound(ref found) if *found == id));

        let err = backend
            .stream_run(RunRequest::new(Some(id), "agent", vec![Message::user("hi")]))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RelayError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn threadless_run_streams_events() {
        let mock = spawn_mock_langgraph().await;
        let backend = backend(&mock.base_url, None);

        let run = backend
            .stream_run(RunRequest::threadless("agent", vec![Message::user("Hello")]))
            .await
            .unwrap();
        assert!(run.content_type.starts_with(EVENT_STREAM_CONTENT_TYPE));

        let events: Vec<StreamEvent> = run.into_events().try_collect().await.unwrap();
        assert!(events.iter().any(StreamEvent::is_assistant_delta));
        assert_eq!(events.last(), Some(&StreamEvent::End));

        let captured = mock.requests();
        let run_request = captured.last().unwrap();
        assert_eq!(run_request.path, "/runs/stream");
        assert_eq!(run_request.body["assistant_id"], "agent");
        assert_eq!(run_request.body["stream_mode"], "messages");
        assert_eq!(run_request.body["input"]["messages"][0]["content"], "Hello");
    }

    #[tokio::test]
    async fn thread_scoped_run_uses_thread_path() {
        let mock = spawn_mock_langgraph().await;
        let backend = backend(&mock.base_url, None);
        let thread = backend.create_thread().await.unwrap();

        let run = backend
            .stream_run(RunRequest::new(
                Some(thread.thread_id.clone()),
                "agent",
                vec![Message::user("ping")],
            ))
            .await
            .unwrap();
        let _: Vec<StreamEvent> = run.into_events().try_collect().await.unwrap();

        let captured = mock.requests();
        assert_eq!(
            captured.last().unwrap().path,
            format!("/threads/{}/runs/stream", thread.thread_id)
        );
        let state = backend.get_thread_state(&thread.thread_id).await.unwrap();
        assert_eq!(state.messages().len(), 2);
    }

    #[tokio::test]
    async fn rejected_credential_maps_to_unauthorized() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let base_url = spawn_router(Router::new().route(
                "/threads",
                post(move || async move { (status, r#"{"detail":"Invalid API key"}"#) }),
            ))
            .await;

            let err = backend(&base_url, Some("wrong")).create_thread().await.unwrap_err();
            match err {
                RelayError::Unauthorized { status: code, message } => {
                    assert_eq!(code, status.as_u16());
                    assert_eq!(message, "Invalid API key");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn server_error_maps_to_upstream() {
        let base_url = spawn_router(Router::new().route(
            "/runs/stream",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "graph exploded") }),
        ))
        .await;

        let err = backend(&base_url, None)
            .stream_run(RunRequest::threadless("agent", vec![Message::user("hi")]))
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RelayError::Upstream { status: 500, ref message } if message == "graph exploded"
        ));
    }

    #[tokio::test]
    async fn malformed_state_maps_to_decode() {
        let base_url = spawn_router(Router::new().route(
            "/threads/{id}/state",
            get(|| async { "not json" }),
        ))
        .await;

        let err = backend(&base_url, None)
            .get_thread_state(&ThreadId::new("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Decode(_)));
    }

    #[tokio::test]
    async fn truncated_error_body_still_classifies_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Promise more body than is sent, then hang up.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nshort")
                .await;
        });

        let err = backend(&format!("http://{addr}"), None)
            .create_thread()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RelayError::Upstream { status: 500, ref message } if message == "<empty>"
        ));
    }

    #[tokio::test]
    async fn unreachable_service_maps_to_connect() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = backend(&format!("http://{addr}"), None)
            .create_thread()
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Connect(_)));
    }

    #[test]
    fn base_url_is_normalized() {
        let backend = backend("http://localhost:2024///", None);
        assert_eq!(backend.base_url(), "http://localhost:2024");
    }
}
