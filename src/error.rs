use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A match against {opponent} on this date already exists")]
    Duplicate { opponent: String },

    #[error("Match not found: {id}")]
    NotFound { id: String },

    /// The record write landed but the stats snapshot could not be refreshed.
    #[error("Match {record_id} was saved but stats recomputation failed: {source}")]
    StatsRecompute {
        record_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Duplicate { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_message_names_opponent() {
        let err = AppError::Duplicate { opponent: "India".to_string() };
        assert!(err.to_string().contains("India"));
    }

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Duplicate { opponent: "x".into() }, StatusCode::CONFLICT),
            (AppError::NotFound { id: "1".into() }, StatusCode::NOT_FOUND),
            (AppError::Store("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn recompute_failure_keeps_cause() {
        let err = AppError::StatsRecompute {
            record_id: "abc".into(),
            source: Box::new(AppError::Store("offline".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("offline"));
    }
}
