use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{RunInput, Thread, ThreadId, ThreadState};
use crate::core::backend::{OrchestrationBackend, RunRequest, RunStream};
use crate::core::error::RelayError;
use crate::core::memory::InMemoryBackend;
use crate::core::stream::EVENT_STREAM_CONTENT_TYPE;

/// Serve `router` on an ephemeral localhost port and return its base URL.
pub async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// A LangGraph-shaped HTTP server backed by [`InMemoryBackend`].
pub struct MockLangGraph {
    pub base_url: String,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockLangGraph {
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct MockState {
    backend: Arc<InMemoryBackend>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockState {
    fn record(&self, method: &str, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
        self.captured.lock().unwrap().push(CapturedRequest {
            method: method.to_string(),
            path: uri.path().to_string(),
            api_key: headers
                .get("x-api-key")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            body: serde_json::from_slice(body).unwrap_or(Value::Null),
        });
    }
}

#[derive(Deserialize)]
struct MockRunBody {
    assistant_id: String,
    input: RunInput,
}

pub async fn spawn_mock_langgraph() -> MockLangGraph {
    let state = MockState {
        backend: Arc::new(InMemoryBackend::new()),
        captured: Arc::new(Mutex::new(Vec::new())),
    };
    let captured = state.captured.clone();

    let router = Router::new()
        .route("/threads", post(mock_create_thread))
        .route("/threads/{id}/state", get(mock_thread_state))
        .route("/threads/{id}/runs/stream", post(mock_thread_run))
        .route("/runs/stream", post(mock_threadless_run))
        .with_state(state);

    MockLangGraph {
        base_url: spawn_router(router).await,
        captured,
    }
}

fn mock_error(err: RelayError) -> Response {
    let status = match err {
        RelayError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"detail": err.to_string()}))).into_response()
}

fn mock_stream(run: RunStream) -> Response {
    ([(header::CONTENT_TYPE, run.content_type)], Body::from_stream(run.body)).into_response()
}

async fn mock_create_thread(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record("POST", &uri, &headers, &body);
    match state.backend.create_thread().await {
        Ok(thread) => Json(thread).into_response(),
        Err(err) => mock_error(err),
    }
}

async fn mock_thread_state(
    State(state): State<MockState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    state.record("GET", &uri, &headers, &[]);
    match state.backend.get_thread_state(&ThreadId::new(id)).await {
        Ok(thread_state) => Json(thread_state).into_response(),
        Err(err) => mock_error(err),
    }
}

async fn mock_run(state: MockState, thread_id: Option<ThreadId>, body: &[u8]) -> Response {
    let Ok(payload) = serde_json::from_slice::<MockRunBody>(body) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    let request = RunRequest::new(thread_id, payload.assistant_id, payload.input.messages);
    match state.backend.stream_run(request).await {
        Ok(run) => mock_stream(run),
        Err(err) => mock_error(err),
    }
}

async fn mock_thread_run(
    State(state): State<MockState>,
    Path(id): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record("POST", &uri, &headers, &body);
    mock_run(state, Some(ThreadId::new(id)), &body).await
}

async fn mock_threadless_run(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record("POST", &uri, &headers, &body);
    mock_run(state, None, &body).await
}

/// How [`FailingBackend`] fails every call.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Connect,
    Unauthorized,
    NotFound,
    Upstream,
    Decode,
    /// Never answers.
    Hang,
}

pub struct FailingBackend {
    failure: Failure,
}

impl FailingBackend {
    pub fn new(failure: Failure) -> Self {
        Self { failure }
    }

    async fn fail<T>(&self, thread_id: Option<&ThreadId>) -> Result<T, RelayError> {
        Err(match self.failure {
            Failure::Connect => RelayError::Connect("connection refused".to_string()),
            Failure::Unauthorized => RelayError::Unauthorized {
                status: 401,
                message: "Invalid API key".to_string(),
            },
            Failure::NotFound => RelayError::ThreadNotFound(
                thread_id.cloned().unwrap_or_else(|| ThreadId::new("unknown")),
            ),
            Failure::Upstream => RelayError::Upstream {
                status: 500,
                message: "graph exploded".to_string(),
            },
            Failure::Decode => RelayError::Decode("expected value".to_string()),
            Failure::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                RelayError::Connect("gave up".to_string())
            }
        })
    }
}

#[async_trait]
impl OrchestrationBackend for FailingBackend {
    async fn create_thread(&self) -> Result<Thread, RelayError> {
        self.fail(None).await
    }

    async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError> {
        self.fail(Some(thread_id)).await
    }

    async fn stream_run(&self, request: RunRequest) -> Result<RunStream, RelayError> {
        self.fail(request.thread_id.as_ref()).await
    }
}

/// Replays a fixed list of body chunks for every run.
pub struct ScriptedBackend {
    chunks: Vec<Bytes>,
    content_type: String,
    /// When set, the body stalls forever after the scripted chunks.
    stall: bool,
}

impl ScriptedBackend {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            content_type: EVENT_STREAM_CONTENT_TYPE.to_string(),
            stall: false,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }
}

#[async_trait]
impl OrchestrationBackend for ScriptedBackend {
    async fn create_thread(&self) -> Result<Thread, RelayError> {
        Err(RelayError::Connect("scripted backend has no threads".to_string()))
    }

    async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError> {
        Err(RelayError::ThreadNotFound(thread_id.clone()))
    }

    async fn stream_run(&self, _request: RunRequest) -> Result<RunStream, RelayError> {
        let scripted = stream::iter(self.chunks.clone().into_iter().map(Ok));
        let body = if self.stall {
            scripted.chain(stream::pending()).boxed()
        } else {
            scripted.boxed()
        };
        Ok(RunStream {
            content_type: self.content_type.clone(),
            body,
        })
    }
}
