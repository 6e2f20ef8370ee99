use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitType {
    Slap,
    Poke,
    NerfGun,
    ThrowingMisc,
    Pillow,
    Other,
}

impl HitType {
    pub const ALL: [HitType; 6] = [
        HitType::Slap,
        HitType::Poke,
        HitType::NerfGun,
        HitType::ThrowingMisc,
        HitType::Pillow,
        HitType::Other,
    ];

    /// Unrecognized categories display as `Other`.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "slap" => HitType::Slap,
            "poke" => HitType::Poke,
            "nerf_gun" => HitType::NerfGun,
            "throwing_misc" => HitType::ThrowingMisc,
            "pillow" => HitType::Pillow,
            _ => HitType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HitType::Slap => "slap",
            HitType::Poke => "poke",
            HitType::NerfGun => "nerf_gun",
            HitType::ThrowingMisc => "throwing_misc",
            HitType::Pillow => "pillow",
            HitType::Other => "other",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            HitType::Slap => "🖐️",
            HitType::Poke => "👉",
            HitType::NerfGun => "🔫",
            HitType::ThrowingMisc => "🦝",
            HitType::Pillow => "🛏️",
            HitType::Other => "❓",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HitType::Slap => "Classic Slap",
            HitType::Poke => "Annoying Poke",
            HitType::NerfGun => "Nerf Gun",
            HitType::ThrowingMisc => "Throwing Misc Things (Raccoon)",
            HitType::Pillow => "Pillow Attack",
            HitType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    pub id: i64,
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ratings: Vec<u8>,
    pub average_rating: f64,
}

impl Hit {
    pub fn from_row(row: HitRow, ratings: Vec<u8>) -> Self {
        let average_rating = average(&ratings);
        Self {
            id: row.id,
            reason: row.reason,
            kind: row.kind,
            description: row.description,
            created_at: row.created_at,
            ratings,
            average_rating,
        }
    }

    pub fn hit_type(&self) -> HitType {
        HitType::from_raw(&self.kind)
    }

    pub fn push_rating(&mut self, rating: u8) {
        self.ratings.push(rating);
        self.average_rating = average(&self.ratings);
    }

    pub fn apply(&mut self, fields: &HitFields) {
        self.reason = fields.reason.clone();
        self.kind = fields.kind.clone();
        self.description = fields.description.clone();
    }
}

pub fn average(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    f64::from(sum) / ratings.len() as f64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitRow {
    pub id: i64,
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitFields {
    pub reason: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
}

impl HitFields {
    pub fn new(reason: &str, kind: &str, description: &str) -> Self {
        let description = description.trim();
        Self {
            reason: reason.trim().to_string(),
            kind: kind.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRow {
    pub hit_id: i64,
    pub rater_id: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingValue {
    pub hit_id: i64,
    pub rating: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BoardStats {
    pub total_hits: usize,
    pub average_rating: f64,
    pub most_common_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HitForm {
    #[serde(default)]
    pub reason: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

impl HitForm {
    pub fn fields(&self) -> HitFields {
        HitFields::new(&self.reason, &self.kind, &self.description)
    }
}

#[derive(Debug, Deserialize)]
pub struct RateForm {
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirmed: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasscodeForm {
    #[serde(default)]
    pub passcode: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub view: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub notice: Option<Notice>,
    pub is_admin: bool,
    pub hits: Vec<Hit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_empty_ratings_is_zero() {
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        assert_eq!(average(&[4, 2]), 3.0);
        assert!((average(&[5, 4, 5, 3, 4]) - 4.2).abs() < 1e-9);
    }

    #[test]
    fn unknown_type_falls_back_to_other() {
        assert_eq!(HitType::from_raw("catapult"), HitType::Other);
        assert_eq!(HitType::from_raw("nerf_gun").label(), "Nerf Gun");
    }

    #[test]
    fn blank_description_is_dropped() {
        let fields = HitFields::new("  X ", "poke", "   ");
        assert_eq!(fields.reason, "X");
        assert_eq!(fields.description, None);
    }

    #[test]
    fn hit_form_without_reason_still_parses() {
        let form: HitForm = serde_json::from_str(r#"{"type": "poke"}"#).unwrap();
        assert!(form.fields().reason.is_empty());

        let rate: RateForm = serde_json::from_str(r#"{"rating": 300}"#).unwrap();
        assert_eq!(rate.rating, 300);
    }
}
