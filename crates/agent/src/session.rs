use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use moveline_core::domain::session::{CallId, CallSession};

/// Keyed store of live call sessions. Turns are strictly sequential per call
/// (the telephony transport does not deliver the next turn until the current
/// response is produced), so mutation follows a snapshot/commit discipline:
/// no lock is held across an external call.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, CallSession>>,
}

impl SessionStore {
    /// Returns the existing session or creates one at the greeting stage.
    pub async fn create(
        &self,
        call_id: &CallId,
        caller_contact: &str,
        now: DateTime<Utc>,
    ) -> CallSession {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(call_id.0.clone())
            .or_insert_with(|| CallSession::start(call_id.clone(), caller_contact, now))
            .clone()
    }

    pub async fn snapshot(&self, call_id: &CallId) -> Option<CallSession> {
        let sessions = self.sessions.read().await;
        sessions.get(&call_id.0).cloned()
    }

    pub async fn commit(&self, session: CallSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.call_id.0.clone(), session);
    }

    pub async fn remove(&self, call_id: &CallId) -> Option<CallSession> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&call_id.0)
    }

    /// Drops sessions idle past `max_idle` and returns them for teardown
    /// (transcript dispatch, logging).
    pub async fn expire_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> Vec<CallSession> {
        let mut sessions = self.sessions.write().await;
        let expired_ids: Vec<String> = sessions
            .iter()
            .filter(|(_, session)| session.idle_since(now) > max_idle)
            .map(|(id, _)| id.clone())
            .collect();
        expired_ids.iter().filter_map(|id| sessions.remove(id)).collect()
    }

    pub async fn active_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use moveline_core::domain::session::CallId;
    use moveline_core::script::states::CallStage;

    use super::SessionStore;

    #[tokio::test]
    async fn create_is_idempotent_per_call_id() {
        let store = SessionStore::default();
        let call_id = CallId("CA-1".to_owned());

        let first = store.create(&call_id, "+15125550123", Utc::now()).await;
        let second = store.create(&call_id, "+15125550999", Utc::now()).await;

        assert_eq!(first.caller_contact, "+15125550123");
        assert_eq!(second.caller_contact, "+15125550123", "existing session wins");
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn snapshot_commit_round_trips_mutations() {
        let store = SessionStore::default();
        let call_id = CallId("CA-2".to_owned());
        store.create(&call_id, "+15125550123", Utc::now()).await;

        let mut session = store.snapshot(&call_id).await.expect("session exists");
        session.stage = CallStage::MainMenu;
        store.commit(session).await;

        let reloaded = store.snapshot(&call_id).await.expect("session exists");
        assert_eq!(reloaded.stage, CallStage::MainMenu);
    }

    #[tokio::test]
    async fn idle_sessions_are_expired_and_returned() {
        let store = SessionStore::default();
        let stale_started = Utc::now() - Duration::seconds(3600);
        store.create(&CallId("CA-old".to_owned()), "+15125550001", stale_started).await;
        store.create(&CallId("CA-new".to_owned()), "+15125550002", Utc::now()).await;

        let expired = store.expire_idle(Utc::now(), Duration::seconds(600)).await;

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].call_id.0, "CA-old");
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn remove_returns_the_final_session_state() {
        let store = SessionStore::default();
        let call_id = CallId("CA-3".to_owned());
        store.create(&call_id, "+15125550123", Utc::now()).await;

        let removed = store.remove(&call_id).await;
        assert!(removed.is_some());
        assert!(store.snapshot(&call_id).await.is_none());
    }
}
