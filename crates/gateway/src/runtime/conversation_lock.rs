//! Per-conversation serialization.
//!
//! Only one reply pipeline runs per chat at a time; a second message for
//! the same chat waits until the first pipeline has sent (or given up).
//! Different chats never block each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Each chat id maps to a `Semaphore(1)`.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `chat_id`. The lock is released when the
    /// returned permit is dropped.
    pub async fn acquire(&self, chat_id: &str) -> Result<OwnedSemaphorePermit, AcquireError> {
        let sem = {
            let mut locks = self.locks.lock();
            locks
                .entry(chat_id.to_owned())
                .or_insert_with(|| Arc::new(Semaphore::new(1)))
                .clone()
        };
        sem.acquire_owned().await
    }

    /// Number of tracked conversations.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop locks nobody holds or waits on.
    pub fn prune_idle(&self) {
        let mut locks = self.locks.lock();
        // The map's own reference is the only one left for idle entries;
        // permits and waiters each hold a clone.
        locks.retain(|_, sem| Arc::strong_count(sem) > 1);
    }
}
