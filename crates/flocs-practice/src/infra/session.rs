//! Practice sessions
//!
//! A session groups the tasks a learner does in one sitting. The next task
//! after `timeout` of inactivity starts a new session with its counter reset.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use tracing::info;

use flocs_common::{FlocsError, LearnerId, Result, SessionId};

/// Snapshot of a learner's current session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    /// Number of tasks assigned in this session (1 for the first)
    pub task_counter: u32,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SessionState {
    fn start(now: DateTime<Utc>) -> Self {
        Self {
            session_id: SessionId::new(),
            task_counter: 1,
            started_at: now,
            last_activity: now,
        }
    }
}

/// Session bookkeeping collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionTracker: Send + Sync {
    /// Advance the learner's task counter, opening a new session if needed
    async fn next_task_in_session(&self, learner: LearnerId) -> Result<SessionState>;

    /// Current session without advancing it
    async fn current_session(&self, learner: LearnerId) -> Result<Option<SessionState>>;
}

/// In-memory session tracker with an inactivity timeout
pub struct InMemorySessionTracker {
    sessions: DashMap<LearnerId, SessionState>,
    timeout: Duration,
}

impl InMemorySessionTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            timeout,
        }
    }

    /// Tracker timing out after `minutes` of inactivity
    pub fn with_timeout_minutes(minutes: i64) -> Result<Self> {
        Duration::try_minutes(minutes)
            .map(Self::new)
            .ok_or_else(|| {
                FlocsError::Config(format!("session timeout of {minutes} minutes is out of range"))
            })
    }

    /// Advance the counter as of `now`
    pub fn next_task_at(&self, learner: LearnerId, now: DateTime<Utc>) -> SessionState {
        match self.sessions.entry(learner) {
            Entry::Vacant(vacant) => {
                let state = vacant.insert(SessionState::start(now));
                info!(%learner, session = %state.session_id, "Started first practice session");
                state.value().clone()
            }
            Entry::Occupied(mut occupied) => {
                let state = occupied.get_mut();
                if now - state.last_activity > self.timeout {
                    *state = SessionState::start(now);
                    info!(%learner, session = %state.session_id, "Started new practice session");
                } else {
                    state.task_counter += 1;
                    state.last_activity = now;
                }
                state.clone()
            }
        }
    }
}

impl Default for InMemorySessionTracker {
    fn default() -> Self {
        Self::new(Duration::minutes(crate::DEFAULT_SESSION_TIMEOUT_MINUTES))
    }
}

#[async_trait]
impl SessionTracker for InMemorySessionTracker {
    async fn next_task_in_session(&self, learner: LearnerId) -> Result<SessionState> {
        Ok(self.next_task_at(learner, Utc::now()))
    }

    async fn current_session(&self, learner: LearnerId) -> Result<Option<SessionState>> {
        Ok(self.sessions.get(&learner).map(|s| s.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_advances_within_session() {
        let tracker = InMemorySessionTracker::with_timeout_minutes(30).unwrap();
        let t0 = Utc::now();

        let first = tracker.next_task_at(LearnerId(1), t0);
        let second = tracker.next_task_at(LearnerId(1), t0 + Duration::minutes(5));

        assert_eq!(first.task_counter, 1);
        assert_eq!(second.task_counter, 2);
        assert_eq!(first.session_id, second.session_id);
    }

    #[test]
    fn test_timeout_starts_new_session() {
        let tracker = InMemorySessionTracker::with_timeout_minutes(30).unwrap();
        let t0 = Utc::now();

        let first = tracker.next_task_at(LearnerId(1), t0);
        tracker.next_task_at(LearnerId(1), t0 + Duration::minutes(10));
        let later = tracker.next_task_at(LearnerId(1), t0 + Duration::minutes(50));

        assert_ne!(first.session_id, later.session_id);
        assert_eq!(later.task_counter, 1);
    }

    #[test]
    fn test_out_of_range_timeout_rejected() {
        let err = InMemorySessionTracker::with_timeout_minutes(i64::MAX)
            .err()
            .unwrap();
        assert!(matches!(err, FlocsError::Config(_)));
    }

    #[tokio::test]
    async fn test_sessions_are_per_learner() {
        let tracker = InMemorySessionTracker::default();
        tracker.next_task_in_session(LearnerId(1)).await.unwrap();
        tracker.next_task_in_session(LearnerId(1)).await.unwrap();

        assert!(tracker.current_session(LearnerId(2)).await.unwrap().is_none());
        let current = tracker.current_session(LearnerId(1)).await.unwrap().unwrap();
        assert_eq!(current.task_counter, 2);
    }
}
