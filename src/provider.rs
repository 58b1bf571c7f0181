//! The inbound seam: the operations the declarative framework invokes.
//!
//! [`ProviderService`] is what a framework host calls, with resource state as
//! JSON. [`Provider`] implements it as a registry of lifecycle adapters keyed
//! by resource type name, converting JSON state to and from
//! [`ResourceState`] around every call.
//!
//! # Example
//!
//! ```
//! use hemmer_rest_provider::adapter::ResourceAdapter;
//! use hemmer_rest_provider::provider::{Provider, ProviderService};
//! use hemmer_rest_provider::resources::call_recording;
//! use hemmer_rest_provider::testing::MockResourceApi;
//!
//! let provider = Provider::new().with_resource(ResourceAdapter::new(
//!     call_recording::definition().unwrap(),
//!     MockResourceApi::new(),
//! ));
//! assert_eq!(provider.metadata().resources, vec![call_recording::TYPE_NAME.to_string()]);
//! ```

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use crate::adapter::LifecycleResource;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::state::ResourceState;
use crate::types::{ImportedResource, ProviderMetadata};
use crate::validation::validate;

/// Operations a provider exposes to the declarative framework.
///
/// State crosses this boundary as JSON objects carrying the identifier under
/// the `id` key.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Return the provider's schema including all resources.
    fn schema(&self) -> ProviderSchema;

    /// Return provider metadata. By default, this is derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.schema().resources.into_keys().collect();
        resources.sort();
        ProviderMetadata { resources }
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&self.schema().provider, &config))
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource's configuration against its schema.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = self.schema();
        let resource = schema
            .resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))?;
        Ok(validate(resource, &config))
    }

    /// Create a new resource, returning its state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Read the current state of a resource.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Import existing infrastructure into management.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError>;
}

/// Convert an error into the diagnostics reported for it.
pub fn error_to_diagnostics(err: &ProviderError) -> Vec<Diagnostic> {
    let summary = match err {
        ProviderError::Configuration(_) => "Invalid provider configuration",
        ProviderError::Validation(_) => "Invalid resource configuration",
        ProviderError::NotFound(_) => "Resource not found",
        ProviderError::PartialCreate { .. } => "Resource partially created",
        _ => "Provider operation failed",
    };
    vec![Diagnostic::error(summary).with_detail(err.to_string())]
}

/// A provider serving a fixed set of resource types.
pub struct Provider {
    resources: BTreeMap<String, Box<dyn LifecycleResource>>,
    config: RwLock<Option<ProviderConfig>>,
}

impl Provider {
    /// Create a provider with no resource types.
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            config: RwLock::new(None),
        }
    }

    /// Register a resource type under its definition's type name.
    ///
    /// A later registration of the same type name replaces the earlier one.
    pub fn with_resource(mut self, resource: impl LifecycleResource + 'static) -> Self {
        let type_name = resource.definition().type_name().to_string();
        self.resources.insert(type_name, Box::new(resource));
        self
    }

    /// The registered adapter for `resource_type`.
    pub fn resource(&self, resource_type: &str) -> Result<&dyn LifecycleResource, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    /// The configuration stored by the last successful `configure`.
    pub async fn config(&self) -> Option<ProviderConfig> {
        self.config.read().await.clone()
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl ProviderService for Provider {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(ProviderConfig::schema()),
            |schema, (name, resource)| schema.with_resource(name.clone(), resource.definition().schema()),
        )
    }

    #[instrument(skip_all, name = "provider.configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        info!("Configure called");
        let diagnostics = validate(&ProviderConfig::schema(), &config);
        if diagnostics.iter().any(Diagnostic::is_error) {
            error!(count = diagnostics.len(), "Provider configuration is invalid");
            return Ok(diagnostics);
        }

        match ProviderConfig::from_value(config) {
            Ok(resolved) => {
                info!(account_sid = %resolved.account_sid, host = %resolved.api_host(), "Provider configured");
                *self.config.write().await = Some(resolved);
                Ok(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                Ok(error_to_diagnostics(&e))
            },
        }
    }

    #[instrument(skip(self, planned_state), name = "provider.create")]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        info!("Create called");
        let resource = self.resource(resource_type)?;
        let mut state = ResourceState::from_value(planned_state)?;

        match resource.create(&mut state).await {
            Ok(id) => {
                info!(id = %id, "Create completed successfully");
                Ok(state.into_value())
            },
            Err(e) => {
                error!(error = %e, "Create failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, current_state), name = "provider.read")]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        debug!("Read called");
        let resource = self.resource(resource_type)?;
        let mut state = ResourceState::from_value(current_state)?;

        match resource.read(&mut state).await {
            Ok(()) => {
                debug!("Read completed successfully");
                Ok(state.into_value())
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, prior_state, planned_state), name = "provider.update")]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        info!("Update called");
        let resource = self.resource(resource_type)?;
        let mut state = ResourceState::with_prior(planned_state, prior_state)?;

        match resource.update(&mut state).await {
            Ok(called) => {
                info!(remote_call = called, "Update completed successfully");
                Ok(state.into_value())
            },
            Err(e) => {
                error!(error = %e, "Update failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self, current_state), name = "provider.delete")]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        info!("Delete called");
        let resource = self.resource(resource_type)?;
        let mut state = ResourceState::from_value(current_state)?;

        match resource.delete(&mut state).await {
            Ok(()) => {
                info!("Delete completed successfully");
                Ok(())
            },
            Err(e) => {
                error!(error = %e, "Delete failed");
                Err(e)
            },
        }
    }

    #[instrument(skip(self), name = "provider.import_resource")]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        info!("Import called");
        let resource = self.resource(resource_type)?;
        let mut state = ResourceState::new();

        match resource.import(id, &mut state).await {
            Ok(()) => {
                info!("Import completed");
                Ok(vec![ImportedResource::new(resource_type, state.into_value())])
            },
            Err(e) => {
                error!(error = %e, "Import failed");
                Err(e)
            },
        }
    }
}
