//! Testing utilities for providers and resource adapters.
//!
//! [`ProviderTester`] drives a [`ProviderService`] the way the declarative
//! framework would, without any transport in between. [`MockResourceApi`]
//! stands in for a remote client: results are queued per operation and every
//! call is recorded so tests can assert exactly what was sent.
//!
//! # Example
//!
//! ```
//! use hemmer_rest_provider::adapter::ResourceAdapter;
//! use hemmer_rest_provider::provider::Provider;
//! use hemmer_rest_provider::resources::call_recording;
//! use hemmer_rest_provider::testing::{MockResourceApi, ProviderTester};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let api = MockResourceApi::new();
//! api.push_create(Ok(json!({"call_sid": "CA1", "sid": 7}).as_object().cloned().unwrap()));
//!
//! let provider = Provider::new()
//!     .with_resource(ResourceAdapter::new(call_recording::definition().unwrap(), api));
//! let tester = ProviderTester::new(provider);
//!
//! let state = tester
//!     .create(call_recording::TYPE_NAME, json!({"call_sid": "CA1"}))
//!     .await
//!     .unwrap();
//! assert_eq!(state["id"], "CA1/7");
//! # });
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::client::{ApiEntity, ApiError, PathParams, RequestParams, ResourceApi};
use crate::error::ProviderError;
use crate::provider::ProviderService;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::types::ImportedResource;

/// A test harness for provider implementations.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a new tester for the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get a mutable reference to the underlying provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    /// Get the provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Get the list of resource type names.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration.
    ///
    /// Returns `Err` with the error diagnostics if there are any.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Validate a resource configuration.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Create a new resource.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read the current state of a resource.
    pub async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update an existing resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import an existing resource.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// Run a create lifecycle: create → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.create(resource_type, config).await?;
        self.read(resource_type, created_state).await
    }

    /// Run an update lifecycle: update → read.
    ///
    /// Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let updated_state = self
            .update(resource_type, prior_state, planned_state)
            .await?;
        self.read(resource_type, updated_state).await
    }

    /// Run a full CRUD lifecycle: create → read → update → read → delete.
    ///
    /// `updated_config` is merged over the created state, so it only needs
    /// the attributes that change. Returns the state after the update
    /// (before delete).
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created_state = self.lifecycle_create(resource_type, initial_config).await?;

        let mut planned_state = created_state.clone();
        if let (Value::Object(planned), Value::Object(changes)) = (&mut planned_state, updated_config) {
            planned.extend(changes);
        }

        let updated_state = self
            .lifecycle_update(resource_type, created_state, planned_state)
            .await?;

        self.delete(resource_type, updated_state.clone()).await?;

        Ok(updated_state)
    }
}

/// Error type for test operations that may fail with diagnostics.
#[derive(Debug)]
pub enum TestError {
    /// The operation failed with diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The operation failed with a provider error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "Operation failed with {} diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  [{:?}] {}", diag.severity, diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that diagnostics contain no errors.
///
/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();

    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert that diagnostics contain at least one error.
///
/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    let has_errors = diagnostics.iter().any(Diagnostic::is_error);

    assert!(has_errors, "Expected at least one error, but got none");
}

/// Assert that diagnostics contain an error with the given summary substring.
///
/// # Panics
///
/// Panics if no error diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    let has_matching_error = diagnostics
        .iter()
        .any(|d| d.is_error() && d.summary.contains(substring));

    assert!(
        has_matching_error,
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

// =========================================================================
// Mock Client
// =========================================================================

/// A call recorded by [`MockResourceApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `create(path, params)`.
    Create {
        /// The path parameters.
        path: PathParams,
        /// The body parameters.
        params: RequestParams,
    },
    /// `fetch(path)`.
    Fetch {
        /// The path parameters.
        path: PathParams,
    },
    /// `update(path, params)`.
    Update {
        /// The path parameters.
        path: PathParams,
        /// The body parameters.
        params: RequestParams,
    },
    /// `delete(path)`.
    Delete {
        /// The path parameters.
        path: PathParams,
    },
}

#[derive(Debug, Default)]
struct MockInner {
    creates: VecDeque<Result<ApiEntity, ProviderError>>,
    fetches: VecDeque<Result<ApiEntity, ProviderError>>,
    updates: VecDeque<Result<ApiEntity, ProviderError>>,
    deletes: VecDeque<Result<(), ProviderError>>,
    calls: Vec<MockCall>,
}

/// A [`ResourceApi`] returning queued results and recording every call.
///
/// Each instance is scoped to one test. A call with nothing queued fails with
/// [`ApiError::Transport`], so an unexpected call surfaces as an error rather
/// than a hang.
#[derive(Debug, Default)]
pub struct MockResourceApi {
    inner: Mutex<MockInner>,
}

impl MockResourceApi {
    /// Create a mock with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        // A panicking test must not poison the mock for its assertions
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue the result of the next `create` call.
    pub fn push_create(&self, result: Result<ApiEntity, ProviderError>) {
        self.lock().creates.push_back(result);
    }

    /// Queue the result of the next `fetch` call.
    pub fn push_fetch(&self, result: Result<ApiEntity, ProviderError>) {
        self.lock().fetches.push_back(result);
    }

    /// Queue the result of the next `update` call.
    pub fn push_update(&self, result: Result<ApiEntity, ProviderError>) {
        self.lock().updates.push_back(result);
    }

    /// Queue the result of the next `delete` call.
    pub fn push_delete(&self, result: Result<(), ProviderError>) {
        self.lock().deletes.push_back(result);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }
}

fn unqueued<T>(operation: &str) -> Result<T, ProviderError> {
    Err(ApiError::Transport(format!("no {} response queued", operation)).into())
}

#[async_trait::async_trait]
impl ResourceApi for MockResourceApi {
    async fn create(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall::Create {
            path: path.clone(),
            params: params.clone(),
        });
        inner.creates.pop_front().unwrap_or_else(|| unqueued("create"))
    }

    async fn fetch(&self, path: &PathParams) -> Result<ApiEntity, ProviderError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall::Fetch { path: path.clone() });
        inner.fetches.pop_front().unwrap_or_else(|| unqueued("fetch"))
    }

    async fn update(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall::Update {
            path: path.clone(),
            params: params.clone(),
        });
        inner.updates.pop_front().unwrap_or_else(|| unqueued("update"))
    }

    async fn delete(&self, path: &PathParams) -> Result<(), ProviderError> {
        let mut inner = self.lock();
        inner.calls.push(MockCall::Delete { path: path.clone() });
        inner.deletes.pop_front().unwrap_or_else(|| unqueued("delete"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Schema};
    use serde_json::json;

    // A provider that echoes state back, for testing the tester
    struct EchoProvider;

    #[async_trait::async_trait]
    impl ProviderService for EchoProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new()
                .with_provider_config(
                    Schema::v0().with_attribute("api_key", Attribute::optional_string()),
                )
                .with_resource(
                    "test_resource",
                    Schema::v0()
                        .with_attribute("name", Attribute::required_string())
                        .with_attribute("sid", Attribute::computed_string()),
                )
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![Diagnostic::warning("Nothing to configure")])
        }

        async fn create(
            &self,
            _resource_type: &str,
            mut planned_state: Value,
        ) -> Result<Value, ProviderError> {
            planned_state["id"] = json!("generated-id");
            Ok(planned_state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(current_state)
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn delete(
            &self,
            _resource_type: &str,
            _current_state: Value,
        ) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn import_resource(
            &self,
            resource_type: &str,
            id: &str,
        ) -> Result<Vec<ImportedResource>, ProviderError> {
            Ok(vec![ImportedResource::new(resource_type, json!({"id": id}))])
        }
    }

    #[tokio::test]
    async fn test_tester_configure_ignores_warnings() {
        let tester = ProviderTester::new(EchoProvider);
        assert!(tester.configure(json!({"api_key": "test"})).await.is_ok());
    }

    #[tokio::test]
    async fn test_tester_validate_resource_config_uses_schema() {
        let tester = ProviderTester::new(EchoProvider);
        assert!(tester
            .validate_resource_config("test_resource", json!({"name": "a"}))
            .await
            .is_ok());

        let err = tester
            .validate_resource_config("test_resource", json!({"sid": "x"}))
            .await
            .unwrap_err();
        match err {
            TestError::Diagnostics(diags) => {
                assert_error_contains(&diags, "Missing required attribute 'name'");
                assert_error_contains(&diags, "Cannot set computed attribute 'sid'");
            },
            other => panic!("expected diagnostics, got {}", other),
        }
    }

    #[test]
    fn test_tester_resource_types() {
        let tester = ProviderTester::new(EchoProvider);
        assert_eq!(tester.resource_types(), vec!["test_resource".to_string()]);
        assert!(tester.schema().resources.contains_key("test_resource"));
    }

    #[tokio::test]
    async fn test_tester_lifecycle_crud() {
        let tester = ProviderTester::new(EchoProvider);
        let final_state = tester
            .lifecycle_crud(
                "test_resource",
                json!({"name": "initial"}),
                json!({"name": "updated"}),
            )
            .await
            .unwrap();

        assert_eq!(final_state["name"], "updated");
        assert_eq!(final_state["id"], "generated-id");
    }

    #[tokio::test]
    async fn test_tester_import() {
        let tester = ProviderTester::new(EchoProvider);
        let imported = tester.import_resource("test_resource", "abc").await.unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].id(), Some("abc"));
    }

    #[test]
    fn test_mock_records_calls_in_order() {
        let api = MockResourceApi::new();
        api.push_fetch(Ok(ApiEntity::new()));
        api.push_delete(Ok(()));

        let path = RequestParams::new().with("sid", json!(1));
        tokio_test::block_on(async {
            api.fetch(&path).await.unwrap();
            api.delete(&path).await.unwrap();
        });

        assert_eq!(
            api.calls(),
            vec![
                MockCall::Fetch { path: path.clone() },
                MockCall::Delete { path },
            ]
        );
    }

    #[test]
    fn test_mock_unqueued_call_fails() {
        let api = MockResourceApi::new();
        let err = tokio_test::block_on(api.update(&RequestParams::new(), &RequestParams::new()))
            .unwrap_err();
        assert!(err.to_string().contains("no update response queued"));
        assert_eq!(api.calls().len(), 1);
    }

    #[test]
    fn test_assert_no_errors() {
        let diagnostics = vec![Diagnostic::warning("Just a warning")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_no_errors(&diagnostics);
    }

    #[test]
    fn test_assert_has_errors() {
        let diagnostics = vec![Diagnostic::error("An error")];
        assert_has_errors(&diagnostics);
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("call_sid"),
            Diagnostic::error("Second error").with_detail("More info"),
        ]);

        let display = format!("{}", err);
        assert!(display.contains("First error"));
        assert!(display.contains("Second error"));
        assert!(display.contains("call_sid"));
        assert!(display.contains("More info"));
    }
}
