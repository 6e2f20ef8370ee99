//! Per-browser board session: the in-memory hit list and every action that
//! reads or writes it through the data service.
//!
//! Local state only changes after the service has confirmed a write. The one
//! exception is [`Board::load`], which replaces the whole list. The state lock
//! is never held while a service call is in flight, so a slow write leaves the
//! rest of the session readable.

use crate::admin::AdminGate;
use crate::errors::BoardError;
use crate::models::{BoardStats, Hit, HitFields, HitRow, Notice, RatingRow};
use crate::stats::build_stats;
use crate::store::{HitStore, StoreError};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

/// How many of the most recent hits a page load shows.
pub const LOAD_LIMIT: usize = 50;

pub struct Board {
    rater_id: String,
    passcode: Arc<str>,
    store: Option<Arc<dyn HitStore>>,
    state: Mutex<BoardState>,
}

pub struct BoardState {
    hits: Vec<Hit>,
    gate: AdminGate,
    editing: Option<i64>,
    notices: Vec<Notice>,
}

impl BoardState {
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn hit(&self, id: i64) -> Option<&Hit> {
        self.hits.iter().find(|hit| hit.id == id)
    }

    pub fn gate(&self) -> AdminGate {
        self.gate
    }

    pub fn is_admin(&self) -> bool {
        self.gate.is_admin()
    }

    /// The hit currently open in the edit form, if it is still listed.
    pub fn editing(&self) -> Option<&Hit> {
        self.editing.and_then(|id| self.hit(id))
    }

    pub fn stats(&self) -> BoardStats {
        build_stats(&self.hits)
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Queues the toast for an action's outcome.
    pub fn report(&mut self, outcome: Result<Notice, BoardError>) {
        match outcome {
            Ok(notice) => self.push_notice(notice),
            Err(err) => {
                if let Some(notice) = err.notice() {
                    self.push_notice(notice);
                }
            }
        }
    }

    fn require_admin(&self) -> Result<(), BoardError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(BoardError::AdminRequired)
        }
    }

    fn position(&self, id: i64) -> Result<usize, BoardError> {
        self.hits
            .iter()
            .position(|hit| hit.id == id)
            .ok_or(BoardError::UnknownHit(id))
    }

    fn replace(&mut self, hits: Vec<Hit>) {
        self.hits = hits;
        if self.editing.is_some_and(|id| self.hit(id).is_none()) {
            self.editing = None;
        }
    }
}

impl Board {
    pub fn new(
        store: Option<Arc<dyn HitStore>>,
        rater_id: impl Into<String>,
        gate: AdminGate,
        passcode: Arc<str>,
    ) -> Self {
        Self {
            rater_id: rater_id.into(),
            passcode,
            store,
            state: Mutex::new(BoardState {
                hits: Vec::new(),
                gate,
                editing: None,
                notices: Vec::new(),
            }),
        }
    }

    /// Locks the session state. Do not hold the guard across a board action.
    pub async fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().await
    }

    pub async fn report(&self, outcome: Result<Notice, BoardError>) {
        self.state.lock().await.report(outcome);
    }

    pub async fn push_notice(&self, notice: Notice) {
        self.state.lock().await.push_notice(notice);
    }

    fn store(&self) -> Result<&dyn HitStore, BoardError> {
        self.store.as_deref().ok_or(BoardError::NotConfigured)
    }

    /// Replaces the list with the newest hits and their ratings.
    ///
    /// Without a configured store the list shows the built-in sample hits.
    pub async fn load(&self) -> Result<usize, BoardError> {
        let Some(store) = self.store.as_deref() else {
            self.state.lock().await.replace(sample_hits());
            return Err(BoardError::NotConfigured);
        };

        let rows = match store.list_recent(LOAD_LIMIT).await {
            Ok(rows) => rows,
            Err(err) => {
                error!("hits select failed on {}: {err}", store.backend_tag());
                self.state.lock().await.replace(Vec::new());
                return Err(BoardError::rejected("load hits from server", err));
            }
        };

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut ratings = if ids.is_empty() {
            HashMap::new()
        } else {
            match store.ratings_for(&ids).await {
                Ok(values) => group_ratings(values.into_iter().map(|v| (v.hit_id, v.rating))),
                Err(err) => {
                    warn!("ratings select failed, showing hits unrated: {err}");
                    HashMap::new()
                }
            }
        };

        let hits: Vec<Hit> = rows
            .into_iter()
            .map(|row| {
                let values = ratings.remove(&row.id).unwrap_or_default();
                Hit::from_row(row, values)
            })
            .collect();
        let count = hits.len();
        self.state.lock().await.replace(hits);

        info!("loaded {count} hits");
        Ok(count)
    }

    pub async fn create(&self, fields: HitFields) -> Result<Notice, BoardError> {
        let store = self.store()?;
        if fields.reason.is_empty() {
            return Err(BoardError::MissingReason);
        }

        let row = store.insert_hit(&fields).await.map_err(|err| {
            error!("hits insert failed: {err}");
            BoardError::rejected("submit hit", err)
        })?;

        info!(hit_id = row.id, "hit created");
        let mut state = self.state.lock().await;
        // a reload that finished meanwhile may already list it
        state.hits.retain(|hit| hit.id != row.id);
        state.hits.insert(0, Hit::from_row(row, Vec::new()));
        Ok(Notice::success(
            "Hit submitted successfully! Now get your friends to rate it! 🎯",
        ))
    }

    pub async fn start_edit(&self, id: i64) -> Result<(), BoardError> {
        let mut state = self.state.lock().await;
        state.require_admin()?;
        state.position(id)?;
        state.editing = Some(id);
        Ok(())
    }

    pub async fn cancel_edit(&self) {
        self.state.lock().await.editing = None;
    }

    /// Overwrites the editable fields of the current edit target.
    pub async fn update(&self, fields: HitFields) -> Result<Notice, BoardError> {
        let id = {
            let state = self.state.lock().await;
            state.require_admin()?;
            let id = state.editing.ok_or(BoardError::NoEditTarget)?;
            state.position(id)?;
            id
        };
        let store = self.store()?;
        if fields.reason.is_empty() {
            return Err(BoardError::MissingReason);
        }

        store.update_hit(id, &fields).await.map_err(|err| {
            error!("hits update failed for {id}: {err}");
            BoardError::rejected("update hit", err)
        })?;

        let mut state = self.state.lock().await;
        if let Ok(index) = state.position(id) {
            state.hits[index].apply(&fields);
        }
        if state.editing == Some(id) {
            state.editing = None;
        }
        Ok(Notice::success("Hit updated."))
    }

    pub async fn delete(&self, id: i64, confirmed: bool) -> Result<Notice, BoardError> {
        {
            let state = self.state.lock().await;
            state.require_admin()?;
            state.position(id)?;
        }
        if !confirmed {
            return Err(BoardError::NotConfirmed);
        }
        let store = self.store()?;

        store.delete_hit(id).await.map_err(|err| {
            error!("hits delete failed for {id}: {err}");
            BoardError::rejected("delete hit", err)
        })?;

        let mut state = self.state.lock().await;
        state.hits.retain(|hit| hit.id != id);
        if state.editing == Some(id) {
            state.editing = None;
        }
        Ok(Notice::success("Hit deleted."))
    }

    pub async fn rate(&self, id: i64, rating: i64) -> Result<Notice, BoardError> {
        self.state.lock().await.position(id)?;
        let Some(value) = u8::try_from(rating).ok().filter(|v| (1..=5).contains(v)) else {
            return Err(BoardError::InvalidRating(rating));
        };
        let store = self.store()?;

        let row = RatingRow {
            hit_id: id,
            rater_id: self.rater_id.clone(),
            rating: value,
        };
        match store.insert_rating(&row).await {
            Ok(()) => {}
            Err(StoreError::Conflict(message)) => {
                info!(hit_id = id, "duplicate rating rejected: {message}");
                return Err(BoardError::AlreadyRated);
            }
            Err(err) => {
                error!("hit_ratings insert failed for {id}: {err}");
                return Err(BoardError::rejected("submit rating", err));
            }
        }

        let mut state = self.state.lock().await;
        if let Ok(index) = state.position(id) {
            state.hits[index].push_rating(value);
        }
        Ok(Notice::success(format!("Hit rated {value} stars! ⭐")))
    }

    pub async fn login(&self, passcode: &str) -> Result<Notice, BoardError> {
        if self.state.lock().await.gate.login(passcode, &self.passcode) {
            Ok(Notice::success("Admin enabled."))
        } else {
            Err(BoardError::WrongPasscode)
        }
    }

    pub async fn logout(&self) -> Notice {
        let mut state = self.state.lock().await;
        state.gate.logout();
        state.editing = None;
        Notice::success("Logged out.")
    }
}

fn group_ratings(values: impl Iterator<Item = (i64, u8)>) -> HashMap<i64, Vec<u8>> {
    let mut grouped: HashMap<i64, Vec<u8>> = HashMap::new();
    for (hit_id, rating) in values {
        grouped.entry(hit_id).or_default().push(rating);
    }
    grouped
}

/// Preview content for a board with no data service behind it.
fn sample_hits() -> Vec<Hit> {
    let now = Utc::now();
    vec![
        Hit::from_row(
            HitRow {
                id: 1,
                reason: "Made a terrible dad joke about programming".to_string(),
                kind: "slap".to_string(),
                description: Some(
                    "Nick said 'Why do programmers prefer dark mode? Because light attracts bugs!' \
                     Cam delivered a swift but fair slap."
                        .to_string(),
                ),
                created_at: now - Duration::days(1),
            },
            vec![5, 4, 5, 3, 4],
        ),
        Hit::from_row(
            HitRow {
                id: 2,
                reason: "Left dirty dishes in the sink".to_string(),
                kind: "poke".to_string(),
                description: Some(
                    "Classic offense. Cam responded with repeated annoying pokes until Nick cleaned up."
                        .to_string(),
                ),
                created_at: now - Duration::days(2),
            },
            vec![4, 3, 4],
        ),
    ]
}
