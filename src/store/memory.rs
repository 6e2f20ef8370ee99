use super::{HitStore, StoreError, UNIQUE_VIOLATION};
use crate::models::{HitFields, HitRow, RatingRow, RatingValue};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    next_id: i64,
    hits: Vec<HitRow>,
    ratings: Vec<RatingRow>,
}

/// In-process stand-in for the data service with the same constraints.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HitStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<HitRow>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows = tables.hits.clone();
        // ids break ties between rows stamped in the same instant
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn ratings_for(&self, hit_ids: &[i64]) -> Result<Vec<RatingValue>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ratings
            .iter()
            .filter(|row| hit_ids.contains(&row.hit_id))
            .map(|row| RatingValue {
                hit_id: row.hit_id,
                rating: row.rating,
            })
            .collect())
    }

    async fn insert_hit(&self, fields: &HitFields) -> Result<HitRow, StoreError> {
        if fields.reason.is_empty() {
            return Err(StoreError::Rejected {
                code: Some("23502".to_string()),
                message: "null value in column \"reason\" violates not-null constraint".to_string(),
            });
        }

        let mut tables = self.tables.lock().await;
        tables.next_id += 1;
        let row = HitRow {
            id: tables.next_id,
            reason: fields.reason.clone(),
            kind: fields.kind.clone(),
            description: fields.description.clone(),
            created_at: Utc::now(),
        };
        tables.hits.push(row.clone());
        Ok(row)
    }

    async fn update_hit(&self, id: i64, fields: &HitFields) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        // an update matching no row is not an error for the service either
        if let Some(row) = tables.hits.iter_mut().find(|row| row.id == id) {
            row.reason = fields.reason.clone();
            row.kind = fields.kind.clone();
            row.description = fields.description.clone();
        }
        Ok(())
    }

    async fn delete_hit(&self, id: i64) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        tables.hits.retain(|row| row.id != id);
        tables.ratings.retain(|row| row.hit_id != id);
        Ok(())
    }

    async fn insert_rating(&self, row: &RatingRow) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.hits.iter().any(|hit| hit.id == row.hit_id) {
            return Err(StoreError::Rejected {
                code: Some("23503".to_string()),
                message: format!("hit {} does not exist", row.hit_id),
            });
        }
        if tables
            .ratings
            .iter()
            .any(|existing| existing.hit_id == row.hit_id && existing.rater_id == row.rater_id)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate key value violates unique constraint ({UNIQUE_VIOLATION})"
            )));
        }
        tables.ratings.push(row.clone());
        Ok(())
    }
}
