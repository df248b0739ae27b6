//! API errors and their HTTP representation

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::fmt;

/// An error returned to the client as `{"message": ...}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// JSON response carrying this error
    pub fn into_response(self) -> Response<Full<Bytes>> {
        crate::api::json_response(
            self.status,
            &ErrorBody {
                message: &self.message,
            },
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<mathquest_core::Error> for ApiError {
    fn from(err: mathquest_core::Error) -> Self {
        use mathquest_core::Error;

        match err {
            Error::TopicNotFound(_) => Self::not_found("Topic not found"),
            Error::TopicLocked(_) => Self::new(StatusCode::FORBIDDEN, "Topic is locked"),
            Error::InvalidId(_) | Error::Validation(_) => Self::bad_request(err.to_string()),
            Error::Storage(detail) => {
                tracing::error!(error = %detail, "storage failure");
                Self::internal("Storage failure")
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("Invalid request body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathquest_core::Error;

    #[test]
    fn test_core_error_status() {
        let cases = [
            (Error::TopicNotFound("9".into()), StatusCode::NOT_FOUND),
            (Error::TopicLocked("3".into()), StatusCode::FORBIDDEN),
            (Error::InvalidId("abc".into()), StatusCode::BAD_REQUEST),
            (Error::Validation("grade".into()), StatusCode::BAD_REQUEST),
            (Error::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_storage_detail_not_leaked() {
        let api = ApiError::from(Error::Storage("/var/db locked".into()));
        assert!(!api.message.contains("/var/db"));
    }
}
