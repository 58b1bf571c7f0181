//! Error types for the REST provider.

use thiserror::Error;

use crate::client::ApiError;
use crate::identifier::IdentifierError;

/// Errors that can occur while running a resource lifecycle operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The remote entity behind a well-formed identifier no longer exists.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The identifier could not be encoded or decoded.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// The operation needs an identifier but the state has none.
    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A resource definition is malformed.
    #[error("Definition error: {0}")]
    Definition(String),

    /// The remote API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The resource was created but the follow-up update call failed.
    ///
    /// The entity exists remotely; `id` and `state` describe it so the caller
    /// can keep managing it.
    #[error("Resource {id} was created but the follow-up update failed: {source}")]
    PartialCreate {
        /// The identifier of the created entity.
        id: String,
        /// The resource state recorded from the create response.
        state: serde_json::Value,
        /// The error returned by the update call.
        #[source]
        source: Box<ProviderError>,
    },

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant that carries
    /// one directly.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::InvalidIdentifier(_err) => "invalid identifier (see Display output)",
            Self::MissingIdentifier(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Definition(msg) => msg,
            Self::Api(err) => err.message(),
            Self::PartialCreate { id, .. } => id,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// Whether this error means the remote entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api(ApiError::NotFound(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::IdentifierFormat;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("CA123/123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: CA123/123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");
    }

    #[test]
    fn test_identifier_errors_say_invalid() {
        let decode = IdentifierFormat::new()
            .with_string("call_sid")
            .with_int64("sid")
            .decode("CA123")
            .unwrap_err();
        let err: ProviderError = decode.into();
        assert!(err.to_string().starts_with("invalid identifier"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_api_errors_pass_through() {
        let err: ProviderError = ApiError::Rejected {
            status: 400,
            message: "Status is required".to_string(),
        }
        .into();
        assert_eq!(
            format!("{}", err),
            "Request rejected (400): Status is required"
        );
        assert_eq!(err.message(), "Status is required");
    }

    #[test]
    fn test_is_not_found() {
        assert!(ProviderError::NotFound("x".to_string()).is_not_found());
        assert!(ProviderError::Api(ApiError::NotFound("x".to_string())).is_not_found());
        assert!(!ProviderError::Api(ApiError::Transport("reset".to_string())).is_not_found());
    }

    #[test]
    fn test_partial_create_display() {
        let err = ProviderError::PartialCreate {
            id: "CA123/123".to_string(),
            state: serde_json::json!({"id": "CA123/123"}),
            source: Box::new(ApiError::Transport("connection reset".to_string()).into()),
        };
        let display = format!("{}", err);
        assert!(display.contains("CA123/123"));
        assert!(display.contains("connection reset"));
        assert_eq!(err.message(), "CA123/123");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("resource-123".to_string());
        assert_eq!(err.message(), "resource-123");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");
    }
}
