//! Mapping of errors to HTTP responses.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use restx_core::{RestxError, Value};

/// Error returned by a request handler
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A core error raised while serving the request
    #[error(transparent)]
    Restx(#[from] RestxError),

    /// The request body could not be used
    #[error("Invalid request body: {0}")]
    BadBody(String),

    /// A static file path tries to leave the static directory
    #[error("Invalid path specifier: {0}")]
    InvalidPath(String),

    /// Nothing is served at the requested URI
    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    /// Status code the error is answered with
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Restx(err) => status_for(err),
            Self::BadBody(_) | Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Status code for a core error
#[must_use]
pub fn status_for(err: &RestxError) -> StatusCode {
    match err {
        RestxError::UnknownName { .. } => StatusCode::NOT_FOUND,
        RestxError::DuplicateName { .. } => StatusCode::CONFLICT,
        RestxError::MissingParameter { .. }
        | RestxError::TypeMismatch { .. }
        | RestxError::InvalidMethod { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, Json(Value::String(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restx_core::{NameKind, SchemaObject};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&RestxError::unknown(NameKind::Resource, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&RestxError::DuplicateName {
                kind: NameKind::Resource,
                name: "x".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&RestxError::MissingParameter { name: "x".into() }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&RestxError::malformed(SchemaObject::Component, "bad")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadBody("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidPath("../x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
    }
}
