use tracing::{debug, info};

use crate::api::{Thread, ThreadId, ThreadState};
use crate::core::backend::SharedBackend;
use crate::core::error::RelayError;

/// Creates conversation threads and reads their state. Holds no state of
/// its own between calls.
#[derive(Clone)]
pub struct ThreadClient {
    backend: SharedBackend,
}

impl ThreadClient {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    pub async fn create_thread(&self) -> Result<Thread, RelayError> {
        let thread = self.backend.create_thread().await?;
        info!(thread_id = %thread.thread_id, "created thread");
        Ok(thread)
    }

    /// Current state of `thread_id`. An unknown id surfaces as
    /// [`RelayError::ThreadNotFound`].
    pub async fn get_thread_state(&self, thread_id: &ThreadId) -> Result<ThreadState, RelayError> {
        debug!(thread_id = %thread_id, "fetching thread state");
        self.backend.get_thread_state(thread_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::InMemoryBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn new_thread_has_no_messages() {
        let client = ThreadClient::new(Arc::new(InMemoryBackend::new()));
        let thread = client.create_thread().await.unwrap();

        let state = client.get_thread_state(&thread.thread_id).await.unwrap();
        assert!(state.values.messages.is_empty());
    }

    #[tokio::test]
    async fn state_reads_are_idempotent() {
        let client = ThreadClient::new(Arc::new(InMemoryBackend::new()));
        let thread = client.create_thread().await.unwrap();

        let first = client.get_thread_state(&thread.thread_id).await.unwrap();
        let second = client.get_thread_state(&thread.thread_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_thread_propagates_not_found() {
        let client = ThreadClient::new(Arc::new(InMemoryBackend::new()));
        let err = client
            .get_thread_state(&ThreadId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn each_thread_gets_a_distinct_id() {
        let client = ThreadClient::new(Arc::new(InMemoryBackend::new()));
        let a = client.create_thread().await.unwrap();
        let b = client.create_thread().await.unwrap();
        assert_ne!(a.thread_id, b.thread_id);
    }
}
