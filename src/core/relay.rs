//! Streamed runs against a thread (or threadless), exposed as a lazy,
//! cancellable sequence of [`StreamEvent`]s.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{Message, ThreadId};
use crate::core::backend::{RunRequest, RunStream, SharedBackend};
use crate::core::error::RelayError;
use crate::core::stream::{EventStream, StreamEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendMessage {
    /// `None` runs threadless.
    pub thread_id: Option<ThreadId>,
    pub messages: Vec<Message>,
}

#[derive(Clone)]
pub struct MessageRelay {
    backend: SharedBackend,
    assistant_id: String,
}

impl MessageRelay {
    pub fn new(backend: SharedBackend, assistant_id: impl Into<String>) -> Self {
        Self {
            backend,
            assistant_id: assistant_id.into(),
        }
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    /// Start a run and return its undecoded body.
    pub async fn open_run(
        &self,
        thread_id: Option<ThreadId>,
        messages: Vec<Message>,
    ) -> Result<RunStream, RelayError> {
        debug!(
            thread_id = ?thread_id.as_ref().map(ThreadId::as_str),
            assistant_id = %self.assistant_id,
            messages = messages.len(),
            "starting streamed run"
        );
        self.backend
            .stream_run(RunRequest::new(thread_id, self.assistant_id.clone(), messages))
            .await
    }

    /// Start a run and decode its events. An unknown thread id fails here
    /// rather than creating a thread.
    pub async fn send_message(&self, request: SendMessage) -> Result<MessageStream, RelayError> {
        let SendMessage {
            thread_id,
            messages,
        } = request;
        let run = self.open_run(thread_id, messages).await?;
        Ok(MessageStream::new(run.into_events()))
    }
}

/// Events of one run, in arrival order. Cancelling only stops local
/// consumption; the remote run is left to finish on its own.
pub struct MessageStream {
    events: EventStream,
    cancel: CancellationToken,
}

impl MessageStream {
    pub fn new(events: EventStream) -> Self {
        let cancel = CancellationToken::new();
        let events = events.take_until(cancel.clone().cancelled_owned()).boxed();
        Self { events, cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A handle that cancels this stream from elsewhere (e.g. a Ctrl+C task).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drain the stream, concatenating assistant delta text.
    pub async fn collect_text(mut self) -> Result<String, RelayError> {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            if let Some(delta) = event?.delta_text() {
                text.push_str(&delta);
            }
        }
        Ok(text)
    }
}

impl Stream for MessageStream {
    type Item = Result<StreamEvent, RelayError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}
