use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum CookedError {
    #[error("Login required")]
    AuthRequired,

    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unsupported action: {0}")]
    Unsupported(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IntoResponse for CookedError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CookedError::AuthRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            CookedError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            CookedError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CookedError::Unsupported(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CookedError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type CookedResult<T> = Result<T, CookedError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: CookedError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn auth_required_returns_401() {
        assert_eq!(
            response_status(CookedError::AuthRequired),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(
            response_status(CookedError::NotFound("p1".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn validation_returns_400() {
        assert_eq!(
            response_status(CookedError::Validation("story is required".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_returns_500() {
        assert_eq!(
            response_status(CookedError::Storage("disk full".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
