use tracing::info;

use crate::api::{Interrupt, Message, ThreadId};
use crate::core::error::RelayError;
use crate::core::relay::{MessageRelay, MessageStream, SendMessage};
use crate::core::threads::ThreadClient;

/// What a caller needs to redraw a conversation after switching to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadSnapshot {
    pub messages: Vec<Message>,
    pub interrupts: Vec<Interrupt>,
}

/// One user's conversation: remembers which thread it is on and creates one
/// on first send.
pub struct ChatSession {
    threads: ThreadClient,
    relay: MessageRelay,
    thread_id: Option<ThreadId>,
}

impl ChatSession {
    pub fn new(threads: ThreadClient, relay: MessageRelay) -> Self {
        Self {
            threads,
            relay,
            thread_id: None,
        }
    }

    pub fn with_thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    pub async fn stream(&mut self, messages: Vec<Message>) -> Result<MessageStream, RelayError> {
        let thread_id = match &self.thread_id {
            Some(thread_id) => thread_id.clone(),
            None => self.switch_to_new_thread().await?,
        };
        self.relay
            .send_message(SendMessage {
                thread_id: Some(thread_id),
                messages,
            })
            .await
    }

    pub async fn switch_to_new_thread(&mut self) -> Result<ThreadId, RelayError> {
        let thread = self.threads.create_thread().await?;
        self.thread_id = Some(thread.thread_id.clone());
        Ok(thread.thread_id)
    }

    /// Load `thread_id` and make it current. On failure the current thread
    /// is left as it was.
    pub async fn switch_to_thread(
        &mut self,
        thread_id: ThreadId,
    ) -> Result<ThreadSnapshot, RelayError> {
        let state = self.threads.get_thread_state(&thread_id).await?;
        info!(thread_id = %thread_id, messages = state.messages().len(), "switched thread");
        let interrupts = state.pending_interrupts();
        self.thread_id = Some(thread_id);
        Ok(ThreadSnapshot {
            messages: state.values.messages,
            interrupts,
        })
    }
}
