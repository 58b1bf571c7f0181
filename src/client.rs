//! The outbound seam between lifecycle adapters and remote API clients.
//!
//! An adapter never talks HTTP itself. Each resource type is bound to a
//! [`ResourceApi`] implementation that performs one remote call per method and
//! returns the raw entity as a JSON object. Retries, pagination, timeouts and
//! authentication all live on the far side of this trait.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ProviderError;

/// The JSON object returned by a remote call.
pub type ApiEntity = Map<String, Value>;

/// Failures reported by a remote API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The addressed entity does not exist.
    #[error("Remote entity not found: {0}")]
    NotFound(String),

    /// The API answered with a non-success status.
    #[error("Request rejected ({status}): {message}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// The error message from the API.
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::Rejected { message, .. } => message,
            Self::Transport(msg) => msg,
        }
    }
}

/// Body parameters for a create or update call.
///
/// Only attributes present in state are carried. An absent attribute is never
/// turned into an empty or `null` parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestParams(Map<String, Value>);

impl RequestParams {
    /// Create empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Insert a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Look up a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether the parameter is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Deserialize the parameters into a typed request struct.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_value(Value::Object(self.0.clone()))?)
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// URL path parameters addressing an entity or its parent collection.
pub type PathParams = RequestParams;

/// Remote operations backing one resource type.
///
/// `create` receives the parent path parameters (the entity does not exist
/// yet); `fetch`, `update` and `delete` receive the full key decoded from the
/// identifier plus any optional path parameters set in state.
#[async_trait::async_trait]
pub trait ResourceApi: Send + Sync {
    /// Create the remote entity.
    async fn create(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError>;

    /// Fetch the remote entity.
    async fn fetch(&self, path: &PathParams) -> Result<ApiEntity, ProviderError>;

    /// Update the remote entity.
    async fn update(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError>;

    /// Delete the remote entity.
    async fn delete(&self, path: &PathParams) -> Result<(), ProviderError>;
}

/// Convert a typed API response into an [`ApiEntity`].
pub fn to_entity<T: Serialize>(value: &T) -> Result<ApiEntity, ProviderError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::Validation(format!(
            "Expected an object from the API, got {}",
            other
        ))),
    }
}

/// Read a required string path parameter.
pub fn path_str<'a>(path: &'a PathParams, name: &str) -> Result<&'a str, ProviderError> {
    path.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::Validation(format!("Missing path parameter '{}'", name)))
}

/// Read a required int64 path parameter.
pub fn path_i64(path: &PathParams, name: &str) -> Result<i64, ProviderError> {
    path.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| ProviderError::Validation(format!("Missing path parameter '{}'", name)))
}
