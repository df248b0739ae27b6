//! Acting user resolution
//!
//! The server never authenticates. An upstream layer sets the identity
//! header; without it, reads fall back to the placeholder user and writes
//! fall back to a `userId` carried in the request body.

use crate::config::{ConfigError, IdentityConfig};
use crate::error::ApiError;
use hyper::header::{HeaderMap, HeaderName};
use mathquest_core::UserId;

/// Resolves the user a request acts for
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    header: HeaderName,
    placeholder: Option<UserId>,
}

impl IdentityResolver {
    pub fn new(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(config.user_header.trim().as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("invalid user header: {}", config.user_header))
        })?;
        Ok(Self {
            header,
            placeholder: config.placeholder_user.map(UserId::new),
        })
    }

    /// Authenticated user from the identity header
    ///
    /// A header that is present but not a valid ID is rejected rather than
    /// falling through to a weaker source.
    pub fn authenticated(&self, headers: &HeaderMap) -> Result<Option<UserId>, ApiError> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(None);
        };
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .map(Some)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized - invalid user identity"))
    }

    /// User for a read: header, then the placeholder
    pub fn reader(&self, headers: &HeaderMap) -> Result<UserId, ApiError> {
        match self.authenticated(headers)? {
            Some(id) => Ok(id),
            None => {
                let id = self
                    .placeholder
                    .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;
                tracing::debug!(user_id = %id, "using placeholder user");
                Ok(id)
            }
        }
    }

    /// User for a write: header, then the `userId` from the body
    pub fn writer(&self, headers: &HeaderMap, body_user: Option<u64>) -> Result<UserId, ApiError> {
        if let Some(id) = self.authenticated(headers)? {
            return Ok(id);
        }
        match body_user {
            Some(0) => Err(ApiError::bad_request("Invalid userId: 0")),
            Some(raw) => Ok(UserId::new(raw)),
            None => Err(ApiError::unauthorized("Unauthorized - no user ID provided")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn resolver(placeholder: Option<u64>) -> IdentityResolver {
        IdentityResolver::new(&IdentityConfig {
            user_header: "x-user-id".to_string(),
            placeholder_user: placeholder,
        })
        .unwrap()
    }

    fn with_header(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_header_wins() {
        let r = resolver(Some(1));
        assert_eq!(r.reader(&with_header("5")).unwrap(), UserId::new(5));
        assert_eq!(r.writer(&with_header("5"), Some(9)).unwrap(), UserId::new(5));
    }

    #[test]
    fn test_reader_placeholder() {
        assert_eq!(resolver(Some(1)).reader(&HeaderMap::new()).unwrap(), UserId::new(1));
        let err = resolver(None).reader(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_writer_body_fallback() {
        let r = resolver(Some(1));
        assert_eq!(r.writer(&HeaderMap::new(), Some(3)).unwrap(), UserId::new(3));
        assert_eq!(r.writer(&HeaderMap::new(), None).unwrap_err().status.as_u16(), 401);
        assert_eq!(r.writer(&HeaderMap::new(), Some(0)).unwrap_err().status.as_u16(), 400);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let r = resolver(Some(1));
        assert_eq!(r.reader(&with_header("abc")).unwrap_err().status.as_u16(), 401);
        assert_eq!(r.reader(&with_header("0")).unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_bad_header_name() {
        let config = IdentityConfig {
            user_header: "bad header".to_string(),
            placeholder_user: None,
        };
        assert!(IdentityResolver::new(&config).is_err());
    }
}
