use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fxfedi::ResolveError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by route handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::Resolve(e) => match e {
                ResolveError::MalformedUrl { .. } => StatusCode::BAD_REQUEST,
                ResolveError::DisallowedDomain { .. } | ResolveError::NotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                ResolveError::RobotsDisallowed { .. } => StatusCode::FORBIDDEN,
                ResolveError::UnsupportedType { .. } | ResolveError::MissingUrl => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            },
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MissingParameter(_) => "MISSING_PARAMETER",
            ApiError::Resolve(e) => match e {
                ResolveError::MalformedUrl { .. } => "MALFORMED_URL",
                ResolveError::DisallowedDomain { .. } => "DISALLOWED_DOMAIN",
                ResolveError::RobotsDisallowed { .. } => "ROBOTS_DISALLOWED",
                ResolveError::NotFound { .. } => "NOT_FOUND",
                ResolveError::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
                ResolveError::MissingUrl => "MISSING_URL",
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            tracing::debug!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(ResolveError::MalformedUrl {
                    input: "x".to_string(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(ResolveError::DisallowedDomain {
                    host: "a.png".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(ResolveError::NotFound {
                    url: "https://a.example/".to_string(),
                    source: None,
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(ResolveError::RobotsDisallowed {
                    url: "https://a.example/".to_string(),
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(ResolveError::UnsupportedType {
                    kind: "Question".to_string(),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (ApiError::from(ResolveError::MissingUrl), StatusCode::UNPROCESSABLE_ENTITY),
            (ApiError::MissingParameter("uri"), StatusCode::BAD_REQUEST),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{}", error);
        }
    }
}
