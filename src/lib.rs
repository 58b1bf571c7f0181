//! Hemmer REST Provider
//!
//! This crate binds entities of a REST API to declaratively managed Hemmer
//! resources. Each resource type is described by a static table of attributes
//! and an identifier format; one generic lifecycle adapter then runs create,
//! read, update, delete and import for every type.
//!
//! # Overview
//!
//! - **Identifier codec** ([`identifier`]): composite identifiers such as
//!   `CA123/123`, encoded and decoded against a typed template
//! - **Attribute classifier** ([`classify`]): derives required/optional/computed
//!   schema flags from where an attribute lives in the API
//! - **Lifecycle adapter** ([`adapter`]): the create saga, read, update, delete
//!   and import over any [`ResourceApi`](client::ResourceApi) client
//! - **State projection** ([`projection`]): state to request parameters and
//!   responses back into state
//! - **Provider** ([`provider`]): the [`ProviderService`] surface over a
//!   registry of adapters
//! - **Resources** ([`resources`]): concrete resource types, such as
//!   `twilio_api_accounts_calls_recordings`
//!
//! # Quick Start
//!
//! ```ignore
//! use hemmer_rest_provider::{resources::call_recording, Provider, ProviderService};
//!
//! // `client` implements call_recording::CallRecordingsApi over HTTP
//! let provider = Provider::new().with_resource(call_recording::adapter(client)?);
//!
//! provider.configure(serde_json::json!({"account_sid": "AC...", "auth_token": "..."})).await?;
//! let state = provider
//!     .create(call_recording::TYPE_NAME, serde_json::json!({"call_sid": "CA123"}))
//!     .await?;
//! assert_eq!(state["id"], "CA123/1");
//! ```
//!
//! # Identifiers
//!
//! Resource state carries its identifier under the `id` key. The identifier is
//! the ordered key values joined with `/`; decoding checks both the segment
//! count and each segment's type, and every failure message starts with
//! `invalid identifier`.
//!
//! # Logging
//!
//! All operations emit `tracing` events. Call [`init_logging`] once at startup
//! to write them to stderr, filtered by `RUST_LOG`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod projection;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod state;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use adapter::{LifecycleResource, ResourceAdapter};
pub use classify::{classify, AttributeRole, AttributeSpec};
pub use client::{ApiEntity, ApiError, PathParams, RequestParams, ResourceApi};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use identifier::{IdentifierError, IdentifierFormat, KeyKind, KeyValue, ResourceKey};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{Provider, ProviderService};
pub use resource::ResourceDefinition;
pub use schema::ProviderSchema;
pub use state::ResourceState;
pub use types::{ImportedResource, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
