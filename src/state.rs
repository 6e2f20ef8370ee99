use crate::admin::AdminGate;
use crate::board::Board;
use crate::storage::LocalPrefs;
use crate::store::HitStore;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::info;

pub type SharedBoard = Arc<Board>;

pub const SESSION_IDLE: Duration = Duration::from_secs(30 * 60);
pub const MAX_SESSIONS: usize = 10_000;

struct Session {
    board: SharedBoard,
    last_seen: Instant,
}

/// One board per browser, keyed by rater id.
#[derive(Clone)]
pub struct AppState {
    pub store: Option<Arc<dyn HitStore>>,
    pub passcode: Arc<str>,
    idle: Duration,
    capacity: usize,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn HitStore>>, passcode: &str) -> Self {
        Self {
            store,
            passcode: Arc::from(passcode),
            idle: SESSION_IDLE,
            capacity: MAX_SESSIONS,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Boards unused for `idle` are dropped, and at most `capacity` are kept.
    pub fn with_session_limits(mut self, idle: Duration, capacity: usize) -> Self {
        self.idle = idle;
        self.capacity = capacity.max(1);
        self
    }

    fn board_for(&self, prefs: &LocalPrefs) -> SharedBoard {
        Arc::new(Board::new(
            self.store.clone(),
            prefs.rater_id.clone(),
            AdminGate::from_flag(prefs.is_admin),
            Arc::clone(&self.passcode),
        ))
    }

    /// The browser's board, and whether it was created by this call.
    ///
    /// A rater id generated for this request is not registered until the
    /// browser sends it back, so cookie-less callers get a throwaway board.
    pub async fn session(&self, prefs: &LocalPrefs) -> (SharedBoard, bool) {
        if prefs.fresh {
            return (self.board_for(prefs), true);
        }

        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        if let Some(session) = sessions.get_mut(&prefs.rater_id) {
            if now.duration_since(session.last_seen) < self.idle {
                session.last_seen = now;
                return (Arc::clone(&session.board), false);
            }
        }

        let before = sessions.len();
        sessions.retain(|_, session| now.duration_since(session.last_seen) < self.idle);
        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_seen)
                .map(|(rater_id, _)| rater_id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
        }
        if sessions.len() < before {
            info!(evicted = before - sessions.len(), "dropped idle board sessions");
        }

        info!(sessions = sessions.len() + 1, "new board session");
        let board = self.board_for(prefs);
        sessions.insert(
            prefs.rater_id.clone(),
            Session {
                board: Arc::clone(&board),
                last_seen: now,
            },
        );
        (board, true)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
