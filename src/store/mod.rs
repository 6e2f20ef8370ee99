//! Client side of the remote data service.
//!
//! The service owns two collections, `hits` and `hit_ratings`, and is the
//! authority for ids, timestamps, ordering and the one-rating-per-rater rule.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::models::{HitFields, HitRow, RatingRow, RatingValue};
use async_trait::async_trait;
use thiserror::Error;

/// Postgres SQLSTATE for a unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Rejected { code: Option<String>, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("no data")]
    Empty,
}

#[async_trait]
pub trait HitStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Most recently created hits first, at most `limit` rows.
    async fn list_recent(&self, limit: usize) -> Result<Vec<HitRow>, StoreError>;

    /// Every rating whose `hit_id` is in `hit_ids`.
    async fn ratings_for(&self, hit_ids: &[i64]) -> Result<Vec<RatingValue>, StoreError>;

    async fn insert_hit(&self, fields: &HitFields) -> Result<HitRow, StoreError>;

    async fn update_hit(&self, id: i64, fields: &HitFields) -> Result<(), StoreError>;

    async fn delete_hit(&self, id: i64) -> Result<(), StoreError>;

    /// Fails with [`StoreError::Conflict`] when the rater already rated the hit.
    async fn insert_rating(&self, row: &RatingRow) -> Result<(), StoreError>;
}
