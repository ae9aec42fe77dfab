use std::collections::HashMap;

use tokio::sync::Mutex;

/// Pending user messages awaiting an admin reply, keyed by user id.
///
/// Holds at most one message per user: a newer message replaces an unread one.
/// There is deliberately no read that leaves the entry in place; the only way
/// to see a message is to take it.
#[derive(Default)]
pub struct MessageStore {
    pending: Mutex<HashMap<String, String>>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the pending message for `user_id`
    pub async fn put(&self, user_id: String, text: String) {
        let mut pending = self.pending.lock().await;
        pending.insert(user_id, text);
    }

    /// Remove and return the pending message for `user_id`, if any
    pub async fn take_and_clear(&self, user_id: &str) -> Option<String> {
        let mut pending = self.pending.lock().await;
        pending.remove(user_id)
    }

    /// Number of users with an unanswered message
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}
