//! The seam between the relays and the remote orchestration service.
//!
//! Everything the relays need from the service goes through
//! [`OrchestrationBackend`]: creating a thread, reading its state, and
//! starting a streamed run. [`crate::api::client::HttpBackend`] talks to the
//! real service; [`crate::core::memory::InMemoryBackend`] stands in for it
//! in tests and offline mode.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::api::{Message, RunInput, StreamMode, Thread, ThreadId, ThreadState};
use crate::core::error::RelayError;
use crate::core::stream::{decode_events, EventStream};

/// Raw response body of a streamed run, chunked as the transport delivered it.
pub type ByteStream = BoxStream<'static, Result<Bytes, RelayError>>;

pub type SharedBackend = Arc<dyn OrchestrationBackend>;

#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// `None` starts a threadless run.
    pub thread_id: Option<ThreadId>,
    pub assistant_id: String,
    pub input: RunInput,
    pub stream_mode: StreamMode,
}

impl RunRequest {
    pub fn new(
        thread_id: Option<ThreadId>,
        assistant_id: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            thread_id,
            assistant_id: assistant_id.into(),
            input: RunInput { messages },
            stream_mode: StreamMode::Messages,
        }
    }

    pub fn threadless(assistant_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self::new(None, assistant_id, messages)
    }
}

/// An in-flight run: the upstream content type and its undecoded body.
pub struct RunStream {
    pub content_type: String,
    pub body: ByteStream,
}

impl RunStream {
    pub fn into_events(self) -> EventStream {
        decode_events(self.body)
    }
}

#[async_trait]
pub trait OrchestrationBackend: Send + Sync {
    async fn create_thread(&self) -> Result<Thread, RelayError>;

    async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError>;

    async fn stream_run(&self, request: RunRequest) -> Result<RunStream, RelayError>;
}
