//! Error types for the tutoring API client.
//!
//! # Design
//! Transport failures and non-2xx responses collapse into one variant,
//! `Request`, whose `Display` is exactly the best-effort message: the
//! backend's `detail` field, the transport's own message, or
//! `HTTP error! status: <code>`. The status code rides along for logging
//! and is `None` when no response was received.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors returned by `TutorClient` parse methods and `ApiService` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed: the network was unreachable or the server
    /// answered with a non-2xx status.
    #[error("{message}")]
    Request { message: String, status: Option<u16> },

    /// A 2xx response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The request record was rejected before it was sent.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The session token could not be read from or written to its store.
    #[error("token storage failed: {0}")]
    Storage(String),
}

impl ApiError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ApiError::Request {
            message: message.into(),
            status: None,
        }
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_displays_message_verbatim() {
        let err = ApiError::Request {
            message: "Incorrect email or password".to_string(),
            status: Some(401),
        };
        assert_eq!(err.to_string(), "Incorrect email or password");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn transport_error_has_no_status() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "connection refused");
    }
}
