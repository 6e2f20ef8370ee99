use super::{HitStore, StoreError, UNIQUE_VIOLATION};
use crate::models::{HitFields, HitRow, RatingRow, RatingValue};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

const HIT_COLUMNS: &str = "id,reason,type,description,created_at";

/// PostgREST-style client for the hosted `hits` / `hit_ratings` tables.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    code: Option<String>,
    message: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(classify_error(status, &body))
}

pub(crate) fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    let message = payload.message.unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.to_string()
        } else {
            body.trim().to_string()
        }
    });

    let is_conflict = match payload.code.as_deref() {
        Some(code) => code == UNIQUE_VIOLATION,
        None => status == StatusCode::CONFLICT,
    };
    if is_conflict {
        StoreError::Conflict(message)
    } else {
        StoreError::Rejected {
            code: payload.code,
            message,
        }
    }
}

fn in_filter(ids: &[i64]) -> String {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    format!("in.({joined})")
}

#[async_trait]
impl HitStore for RestStore {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<HitRow>, StoreError> {
        let limit = limit.to_string();
        let response = self
            .request(Method::GET, "hits")
            .query(&[
                ("select", HIT_COLUMNS),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn ratings_for(&self, hit_ids: &[i64]) -> Result<Vec<RatingValue>, StoreError> {
        let filter = in_filter(hit_ids);
        let response = self
            .request(Method::GET, "hit_ratings")
            .query(&[("select", "hit_id,rating"), ("hit_id", filter.as_str())])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn insert_hit(&self, fields: &HitFields) -> Result<HitRow, StoreError> {
        let response = self
            .request(Method::POST, "hits")
            .query(&[("select", HIT_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await?;
        let rows: Vec<HitRow> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or(StoreError::Empty)
    }

    async fn update_hit(&self, id: i64, fields: &HitFields) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let response = self
            .request(Method::PATCH, "hits")
            .query(&[("id", filter.as_str())])
            .json(fields)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_hit(&self, id: i64) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        let response = self
            .request(Method::DELETE, "hits")
            .query(&[("id", filter.as_str())])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn insert_rating(&self, row: &RatingRow) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, "hit_ratings")
            .json(row)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Query,
        http::HeaderMap,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;

    #[test]
    fn unique_violation_code_is_a_conflict() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"hit_ratings_pkey\"","details":null,"hint":null}"#;
        let err = classify_error(StatusCode::CONFLICT, body);
        assert!(matches!(err, StoreError::Conflict(ref msg) if msg.starts_with("duplicate key")));
    }

    #[test]
    fn other_codes_are_rejections_with_the_service_message() {
        let body = r#"{"code":"42501","message":"permission denied for table hits"}"#;
        match classify_error(StatusCode::UNAUTHORIZED, body) {
            StoreError::Rejected { code, message } => {
                assert_eq!(code.as_deref(), Some("42501"));
                assert_eq!(message, "permission denied for table hits");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_json_bodies_are_passed_through() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "upstream down");
    }

    #[test]
    fn in_filter_lists_ids() {
        assert_eq!(in_filter(&[3, 1, 2]), "in.(3,1,2)");
    }

    async fn list_hits(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        assert_eq!(headers.get("apikey").unwrap(), "anon");
        assert_eq!(params.get("order").map(String::as_str), Some("created_at.desc"));
        assert_eq!(params.get("limit").map(String::as_str), Some("50"));
        Json(serde_json::json!([{
            "id": 7,
            "reason": "X",
            "type": "poke",
            "description": null,
            "created_at": "2026-01-05T10:00:00.123456+00:00"
        }]))
    }

    async fn duplicate_rating() -> (StatusCode, Json<serde_json::Value>) {
        (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "code": "23505", "message": "duplicate key value" })),
        )
    }

    #[tokio::test]
    async fn talks_to_a_postgrest_endpoint() {
        let router = Router::new()
            .route("/rest/v1/hits", get(list_hits))
            .route("/rest/v1/hit_ratings", post(duplicate_rating));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let store = RestStore::new(&format!("http://{addr}/"), "anon").unwrap();
        let rows = store.list_recent(50).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 7);
        assert_eq!(rows[0].kind, "poke");

        let err = store
            .insert_rating(&RatingRow {
                hit_id: 7,
                rater_id: "r1".to_string(),
                rating: 3,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
