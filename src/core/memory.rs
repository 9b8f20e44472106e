//! In-process stand-in for the orchestration service.
//!
//! Threads live in a map for the lifetime of the backend. Each run echoes
//! the last user message back as an assistant reply, streamed word by word
//! in the same SSE framing the real service uses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::{Message, Thread, ThreadId, ThreadState, ThreadValues};
use crate::core::backend::{OrchestrationBackend, RunRequest, RunStream};
use crate::core::error::RelayError;
use crate::core::stream::EVENT_STREAM_CONTENT_TYPE;

#[derive(Default)]
pub struct InMemoryBackend {
    threads: Mutex<HashMap<ThreadId, Vec<Message>>>,
    next_thread: AtomicU64,
    next_run: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_count(&self) -> usize {
        self.lock_threads().len()
    }

    fn lock_threads(&self) -> std::sync::MutexGuard<'_, HashMap<ThreadId, Vec<Message>>> {
        // A poisoned map still holds consistent data: every write is a single push.
        self.threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_to(messages: &[Message]) -> String {
        match messages.iter().rev().find(|message| message.is_user()) {
            Some(message) => format!("You said: {}", message.text()),
            None => "Hello! How can I help?".to_string(),
        }
    }

    fn frame(event: &str, data: &Value) -> Bytes {
        Bytes::from(format!("event: {event}\ndata: {data}\n\n"))
    }
}

#[async_trait]
impl OrchestrationBackend for InMemoryBackend {
    async fn create_thread(&self) -> Result<Thread, RelayError> {
        let n = self.next_thread.fetch_add(1, Ordering::Relaxed) + 1;
        let thread_id = ThreadId::new(format!("thread-{n:08}"));
        self.lock_threads().insert(thread_id.clone(), Vec::new());

        let now = Utc::now();
        Ok(Thread {
            thread_id,
            created_at: Some(now),
            updated_at: Some(now),
            status: Some("idle".to_string()),
            metadata: json!({}),
        })
    }

    async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError> {
        let threads = self.lock_threads();
        let messages = threads
            .get(thread_id)
            .ok_or_else(|| RelayError::ThreadNotFound(thread_id.clone()))?;
        Ok(ThreadState {
            values: ThreadValues {
                messages: messages.clone(),
                ..ThreadValues::default()
            },
            ..ThreadState::default()
        })
    }

    async fn stream_run(&self, request: RunRequest) -> Result<RunStream, RelayError> {
        let run = self.next_run.fetch_add(1, Ordering::Relaxed) + 1;
        let run_id = format!("run-{run:08}");
        let reply = Self::reply_to(&request.input.messages);

        if let Some(thread_id) = &request.thread_id {
            let mut threads = self.lock_threads();
            let history = threads
                .get_mut(thread_id)
                .ok_or_else(|| RelayError::ThreadNotFound(thread_id.clone()))?;
            history.extend(request.input.messages.iter().cloned());
            history.push(Message::assistant(reply.clone()).with_id(run_id.clone()));
        }
        debug!(
            run_id = %run_id,
            thread_id = ?request.thread_id.as_ref().map(ThreadId::as_str),
            assistant_id = %request.assistant_id,
            "starting in-memory run"
        );

        let node = json!({"langgraph_node": request.assistant_id, "run_id": run_id});
        let mut frames = vec![Self::frame(
            "metadata",
            &json!({"run_id": run_id, "thread_id": request.thread_id}),
        )];
        frames.extend(reply.split_inclusive(' ').map(|fragment| {
            Self::frame(
                "messages",
                &json!([
                    {"type": "AIMessageChunk", "content": fragment, "id": run_id},
                    node
                ]),
            )
        }));
        frames.push(Self::frame("end", &Value::Null));

        Ok(RunStream {
            content_type: EVENT_STREAM_CONTENT_TYPE.to_string(),
            body: stream::iter(frames.into_iter().map(Ok)).boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stream::StreamEvent;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn thread_scoped_run_records_history() {
        let backend = InMemoryBackend::new();
        let thread = backend.create_thread().await.unwrap();

        let run = backend
            .stream_run(RunRequest::new(
                Some(thread.thread_id.clone()),
                "agent",
                vec![Message::user("ping")],
            ))
            .await
            .unwrap();
        let events: Vec<StreamEvent> = run.into_events().try_collect().await.unwrap();
        let text: String = events.iter().filter_map(StreamEvent::delta_text).collect();
        assert_eq!(text, "You said: ping");

        let state = backend.get_thread_state(&thread.thread_id).await.unwrap();
        let texts: Vec<_> = state.messages().iter().map(Message::text).collect();
        assert_eq!(texts, vec!["ping", "You said: ping"]);
    }

    #[tokio::test]
    async fn unknown_thread_is_rejected_without_creating_one() {
        let backend = InMemoryBackend::new();
        let missing = ThreadId::new("nope");

        let result = backend
            .stream_run(RunRequest::new(
                Some(missing.clone()),
                "agent",
                vec![Message::user("hi")],
            ))
            .await;
        assert!(matches!(result, Err(RelayError::ThreadNotFound(id)) if id == missing));
        assert_eq!(backend.thread_count(), 0);
    }

    #[tokio::test]
    async fn threadless_runs_leave_no_trace() {
        let backend = InMemoryBackend::new();
        let run = backend
            .stream_run(RunRequest::threadless("agent", vec![Message::user("hi")]))
            .await
            .unwrap();
        assert_eq!(run.content_type, EVENT_STREAM_CONTENT_TYPE);
        assert_eq!(backend.thread_count(), 0);
    }
}
