use crate::models::Notice;
use crate::store::StoreError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<BoardError> for AppError {
    fn from(err: BoardError) -> Self {
        let status = match &err {
            BoardError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            BoardError::Rejected { .. } => StatusCode::BAD_GATEWAY,
            BoardError::AlreadyRated => StatusCode::CONFLICT,
            BoardError::UnknownHit(_) => StatusCode::NOT_FOUND,
            BoardError::AdminRequired | BoardError::WrongPasscode => StatusCode::FORBIDDEN,
            BoardError::NoEditTarget => StatusCode::CONFLICT,
            BoardError::InvalidRating(_) | BoardError::MissingReason | BoardError::NotConfirmed => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = axum::Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

/// Why a board action did not take effect.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Data service is not configured yet.")]
    NotConfigured,

    #[error("Could not {action}. ({message})")]
    Rejected { action: &'static str, message: String },

    #[error("You've already rated this hit! 🌟")]
    AlreadyRated,

    #[error("hit {0} is not on the board")]
    UnknownHit(i64),

    #[error("Admin access required.")]
    AdminRequired,

    #[error("Wrong passcode.")]
    WrongPasscode,

    #[error("Pick a hit to edit first.")]
    NoEditTarget,

    #[error("Ratings go from 1 to 5 stars, got {0}.")]
    InvalidRating(i64),

    #[error("A reason is required.")]
    MissingReason,

    #[error("Delete was not confirmed.")]
    NotConfirmed,
}

impl BoardError {
    pub fn rejected(action: &'static str, err: StoreError) -> Self {
        Self::Rejected {
            action,
            message: err.to_string(),
        }
    }

    /// Toast for this failure. Actions on hits no longer listed and declined
    /// confirmations stay silent.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            BoardError::UnknownHit(_) | BoardError::NotConfirmed => None,
            other => Some(Notice::error(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_carries_the_service_message() {
        let err = BoardError::rejected(
            "submit hit",
            StoreError::Rejected {
                code: None,
                message: "permission denied".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Could not submit hit. (permission denied)");
        assert_eq!(AppError::from(err).status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn out_of_range_rating_is_a_bad_request() {
        let err = AppError::from(BoardError::InvalidRating(300));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Ratings go from 1 to 5 stars, got 300.");
    }

    #[test]
    fn unknown_hit_has_no_notice() {
        assert!(BoardError::UnknownHit(3).notice().is_none());
        assert!(BoardError::AlreadyRated.notice().is_some());
    }
}
