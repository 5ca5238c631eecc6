use prorab_core::history::History;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Per-session conversation histories, keyed by `channel:sender_id`.
///
/// Cloneable handle over shared state. Callers get a snapshot, mutate it,
/// and put it back; the gateway serializes turns per sender, so a session's
/// read-modify-write never interleaves with itself.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, History>>>,
    capacity: usize,
}

impl SessionStore {
    /// Create a store whose histories hold at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    /// Snapshot the history for a session. Empty history if absent.
    pub async fn get(&self, session_id: &str) -> History {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| History::new(self.capacity))
    }

    /// Store the history for a session.
    pub async fn put(&self, session_id: &str, history: History) {
        self.sessions
            .lock()
            .await
            .insert(session_id.to_string(), history);
    }

    /// Clear a session back to an empty history.
    pub async fn reset(&self, session_id: &str) {
        debug!("resetting session {session_id}");
        self.sessions.lock().await.remove(session_id);
    }

    /// Number of sessions with stored history.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prorab_core::history::HistoryEntry;

    #[tokio::test]
    async fn test_get_absent_is_empty() {
        let store = SessionStore::new(20);
        let h = store.get("telegram:42").await;
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 20);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let store = SessionStore::new(20);
        let mut h = store.get("telegram:42").await;
        h.push(HistoryEntry::user("Привет"));
        h.push(HistoryEntry::assistant("Здорово"));
        store.put("telegram:42", h).await;

        let back = store.get("telegram:42").await;
        assert_eq!(back.len(), 2);
        assert_eq!(back.entries()[0].text, "Привет");
    }

    #[tokio::test]
    async fn test_reset_clears_regardless_of_prior_state() {
        let store = SessionStore::new(20);
        let mut h = store.get("telegram:42").await;
        for i in 0..10 {
            h.push(HistoryEntry::user(format!("m{i}")));
        }
        store.put("telegram:42", h).await;
        assert_eq!(store.get("telegram:42").await.len(), 10);

        store.reset("telegram:42").await;
        assert!(store.get("telegram:42").await.is_empty());

        // Resetting an absent session is a no-op.
        store.reset("telegram:unknown").await;
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new(20);
        let mut a = store.get("telegram:1").await;
        a.push(HistoryEntry::user("only for 1"));
        store.put("telegram:1", a).await;

        assert!(store.get("telegram:2").await.is_empty());
        assert_eq!(store.session_count().await, 1);
    }
}
