//! HTTP error mapping.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use grievance_core::GrievanceError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed actor headers.
    Unauthorized(String),
    Core(GrievanceError),
}

impl From<GrievanceError> for AppError {
    fn from(err: GrievanceError) -> Self {
        Self::Core(err)
    }
}

// Extractor rejections are malformed client input. Route them through the
// core taxonomy so the body carries `invalid_argument` like any other 400.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Core(GrievanceError::InvalidArgument(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Core(GrievanceError::InvalidArgument(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Core(GrievanceError::InvalidArgument(rejection.body_text()))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Core(err) => StatusCode::from_u16(err.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, message) = match &self {
            Self::Unauthorized(msg) => ("unauthorized", msg.clone()),
            Self::Core(err @ GrievanceError::Unexpected(_)) => {
                tracing::error!("request failed: {err:#}");
                (err.kind(), "internal error".to_string())
            }
            Self::Core(err) => (err.kind(), err.to_string()),
        };
        (status, Json(json!({ "error": kind, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_errors_to_status() {
        let cases = [
            (GrievanceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                GrievanceError::InvalidArgument("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (GrievanceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                GrievanceError::Unexpected(anyhow::anyhow!("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
        assert_eq!(
            AppError::Unauthorized("no actor".into()).status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
