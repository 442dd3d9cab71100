//! API error taxonomy
//!
//! Every failure a handler can produce maps to one `ApiError` variant with
//! its own status code. The response body keeps the nested
//! `{"error": {"<Kind>": "<message>"}}` envelope the JSON clients expect.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidForm(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Not Found",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::InvalidForm(_) => "Bad Request",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Storage(_) => "Internal Server Error",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return ApiError::Conflict("A cafe with that name already exists.".to_string());
            }
        }
        ApiError::Storage(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();

        // Storage details stay in the logs, not in the response.
        let message = match &self {
            ApiError::Storage(e) => {
                tracing::error!("storage error: {e}");
                "Something went wrong on our end.".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": { kind: message } }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::NotFound(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden(String::new()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidForm(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict(String::new()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Storage(sqlx::Error::PoolClosed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn non_database_sqlx_errors_map_to_storage() {
        let err: ApiError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, ApiError::Storage(_)));
    }
}
