//! Shared chat state.
//!
//! The client registry and the message log sit behind one mutex so that
//! registration, posting, snapshots and the persistence task's reads are
//! serialized. The lock is never held across I/O.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use webchat_shared::{Client, Message};
use webchat_store::PersistMode;

use crate::message_log::MessageLog;
use crate::registry::ClientRegistry;

#[derive(Debug, Default)]
struct ChatInner {
    registry: ClientRegistry,
    log: MessageLog,
}

/// Records a flush should write, captured atomically with the log length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFlush {
    pub records: Vec<Message>,
    /// Log length at the moment the records were taken.
    pub len: usize,
}

#[derive(Clone, Default)]
pub struct ChatState {
    inner: Arc<Mutex<ChatInner>>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_client(&self, client: Client) {
        let mut inner = self.inner.lock().await;
        inner.registry.add(client);
        debug!(total = inner.registry.len(), "Registry size");
    }

    pub async fn find_client(&self, address: &str, name: &str) -> bool {
        self.inner.lock().await.registry.find(address, name)
    }

    pub async fn clients(&self) -> Vec<Client> {
        self.inner.lock().await.registry.clients().to_vec()
    }

    /// Append a message and return the new log length.
    pub async fn post_message(&self, author: &str, body: &str) -> usize {
        let len = self.inner.lock().await.log.append(author, body);
        debug!(author = %author, len, "Message posted");
        len
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.lock().await.log.snapshot()
    }

    pub async fn message_count(&self) -> usize {
        self.inner.lock().await.log.len()
    }

    pub async fn restore_messages(&self, records: Vec<Message>) -> usize {
        self.inner.lock().await.log.restore(records)
    }

    /// Records to persist given the current watermark. `records` is empty
    /// when nothing was appended since the watermark.
    pub async fn pending_flush(&self, mode: PersistMode, watermark: usize) -> PendingFlush {
        let inner = self.inner.lock().await;
        let len = inner.log.len();
        PendingFlush {
            records: inner.log.slice(mode.range(watermark, len)),
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_posts_keep_arrival_order() {
        let state = ChatState::new();
        for i in 0..3 {
            state.add_client(Client::new(format!("user{i}"), "10.0.0.1")).await;
        }
        for i in 0..5 {
            state.post_message("user0", &format!("msg {i}")).await;
        }

        let messages = state.messages().await;
        assert_eq!(messages.len(), 5);
        for (i, m) in messages.iter().enumerate() {
            assert_eq!(m.body, format!("msg {i}"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_posts_are_all_kept() {
        let state = ChatState::new();
        let mut handles = Vec::new();
        for task in 0..8 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    state.post_message(&format!("t{task}"), &i.to_string()).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(state.message_count().await, 200);
    }

    #[tokio::test]
    async fn test_pending_flush_suffix_and_cumulative() {
        let state = ChatState::new();
        state.post_message("a", "1").await;
        state.post_message("a", "2").await;
        state.post_message("a", "3").await;

        let suffix = state.pending_flush(PersistMode::Suffix, 2).await;
        assert_eq!(suffix.len, 3);
        assert_eq!(suffix.records.len(), 1);
        assert_eq!(suffix.records[0].body, "3");

        let full = state.pending_flush(PersistMode::Cumulative, 2).await;
        assert_eq!(full.records.len(), 3);

        let none = state.pending_flush(PersistMode::Cumulative, 3).await;
        assert!(none.records.is_empty());
        assert_eq!(none.len, 3);
    }

    #[tokio::test]
    async fn test_clients_listing() {
        let state = ChatState::new();
        state.add_client(Client::new("alice", "10.0.0.1")).await;
        state.add_client(Client::new("bob", "10.0.0.2")).await;

        let clients = state.clients().await;
        assert_eq!(clients, vec![Client::new("alice", "10.0.0.1"), Client::new("bob", "10.0.0.2")]);
        assert!(state.find_client("10.0.0.2", "bob").await);
    }
}
