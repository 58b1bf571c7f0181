//! The generic lifecycle adapter.
//!
//! One [`ResourceAdapter`] serves every instance of a resource type. It holds
//! only the immutable [`ResourceDefinition`] and a client handle, so concurrent
//! operations on different instances share nothing mutable.
//!
//! # Create choreography
//!
//! Some APIs accept part of a resource's configuration only on their update
//! endpoint. Create therefore runs as a two-step saga:
//!
//! 1. The create call carries the path keys and every create-eligible input
//!    set in state. Its response yields the identifier, which is recorded in
//!    state together with the response attributes.
//! 2. If any update-only input is set, a single update call carries exactly
//!    those inputs, addressed by the identifier from step 1.
//!
//! There is no rollback. When step 2 fails the entity already exists remotely,
//! so the error is [`ProviderError::PartialCreate`] and the state keeps the
//! identifier for later reconciliation.
//!
//! # Not found
//!
//! A remote not-found during [`read`](ResourceAdapter::read) is reported as
//! [`ProviderError::NotFound`], never as an identifier error; the framework
//! decides whether to drop the resource. During
//! [`delete`](ResourceAdapter::delete) it counts as success.

use tracing::{debug, info, instrument, warn};

use crate::client::{PathParams, ResourceApi};
use crate::error::ProviderError;
use crate::identifier::ResourceKey;
use crate::projection::{from_response, to_request};
use crate::resource::ResourceDefinition;
use crate::state::ResourceState;

/// Lifecycle operations of one resource type, independent of its client.
///
/// This is the object-safe face of [`ResourceAdapter`] used by the
/// [`Provider`](crate::provider::Provider) registry.
#[async_trait::async_trait]
pub trait LifecycleResource: Send + Sync {
    /// The resource definition.
    fn definition(&self) -> &ResourceDefinition;

    /// Create the remote entity, returning its identifier.
    async fn create(&self, state: &mut ResourceState) -> Result<String, ProviderError>;

    /// Refresh state from the remote entity.
    async fn read(&self, state: &mut ResourceState) -> Result<(), ProviderError>;

    /// Push changed update-eligible attributes. Returns whether a call was made.
    async fn update(&self, state: &mut ResourceState) -> Result<bool, ProviderError>;

    /// Delete the remote entity.
    async fn delete(&self, state: &mut ResourceState) -> Result<(), ProviderError>;

    /// Adopt an existing entity by identifier.
    async fn import(&self, raw_id: &str, state: &mut ResourceState) -> Result<(), ProviderError>;
}

/// Runs lifecycle operations for one resource type against its client.
#[derive(Debug)]
pub struct ResourceAdapter<C> {
    definition: ResourceDefinition,
    api: C,
}

impl<C: ResourceApi> ResourceAdapter<C> {
    /// Create an adapter for `definition` backed by `api`.
    pub fn new(definition: ResourceDefinition, api: C) -> Self {
        Self { definition, api }
    }

    /// The resource definition.
    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    /// The underlying client.
    pub fn api(&self) -> &C {
        &self.api
    }

    /// Create the remote entity and record it in `state`.
    #[instrument(skip_all, fields(resource_type = %self.definition.type_name()))]
    pub async fn create(&self, state: &mut ResourceState) -> Result<String, ProviderError> {
        let definition = &self.definition;
        self.check_required(state)?;

        let path = to_request(state, definition.path_attributes());
        let params = to_request(state, definition.create_attributes());
        let follow_up = to_request(state, definition.update_only_attributes());

        let names: Vec<&str> = params.names().collect();
        debug!(params = ?names, "Calling create");
        let entity = self.api.create(&path, &params).await?;

        let key = {
            let current: &ResourceState = state;
            definition
                .identifier()
                .key_from(|name| {
                    entity
                        .get(name)
                        .filter(|v| !v.is_null())
                        .or_else(|| current.get(name))
                })?
        };
        let id = definition.identifier().encode(&key)?;
        state.set_id(id.clone());
        from_response(definition, &entity, state);
        info!(id = %id, "Created remote entity");

        if follow_up.is_empty() {
            return Ok(id);
        }

        let path = self.entity_path(&key, state);
        let names: Vec<&str> = follow_up.names().collect();
        debug!(id = %id, params = ?names, "Calling follow-up update");
        match self.api.update(&path, &follow_up).await {
            Ok(entity) => {
                from_response(definition, &entity, state);
                info!(id = %id, "Applied update-only attributes");
                Ok(id)
            },
            Err(err) => {
                warn!(id = %id, error = %err, "Entity created but follow-up update failed");
                Err(ProviderError::PartialCreate {
                    id,
                    state: state.to_value(),
                    source: Box::new(err),
                })
            },
        }
    }

    /// Refresh `state` from the remote entity its identifier points at.
    #[instrument(skip_all, fields(resource_type = %self.definition.type_name()))]
    pub async fn read(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let (id, key) = self.decode_state_id(state)?;
        let path = self.entity_path(&key, state);

        debug!(id = %id, "Calling fetch");
        let entity = match self.api.fetch(&path).await {
            Ok(entity) => entity,
            Err(err) if err.is_not_found() => {
                return Err(ProviderError::NotFound(format!(
                    "{} '{}' no longer exists",
                    self.definition.type_name(),
                    id
                )))
            },
            Err(err) => return Err(err),
        };

        from_response(&self.definition, &entity, state);
        debug!(id = %id, "Read remote entity");
        Ok(())
    }

    /// Push update-eligible attributes when any of them changed.
    ///
    /// Returns `false` without calling the API when nothing changed.
    #[instrument(skip_all, fields(resource_type = %self.definition.type_name()))]
    pub async fn update(&self, state: &mut ResourceState) -> Result<bool, ProviderError> {
        let definition = &self.definition;
        let changed: Vec<&str> = definition
            .update_attributes()
            .filter(|a| state.has_changed(&a.name))
            .map(|a| a.name.as_str())
            .collect();
        if changed.is_empty() {
            debug!("No update-eligible attribute changed");
            return Ok(false);
        }

        self.check_required(state)?;
        let (id, key) = self.decode_state_id(state)?;
        let params = to_request(state, definition.update_attributes());
        if params.is_empty() {
            debug!(id = %id, ?changed, "Changed attributes were all unset, nothing to send");
            return Ok(false);
        }

        let path = self.entity_path(&key, state);
        debug!(id = %id, ?changed, "Calling update");
        let entity = self.api.update(&path, &params).await?;
        from_response(definition, &entity, state);
        info!(id = %id, "Updated remote entity");
        Ok(true)
    }

    /// Delete the remote entity. An entity that is already gone is not an
    /// error.
    #[instrument(skip_all, fields(resource_type = %self.definition.type_name()))]
    pub async fn delete(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        let (id, key) = self.decode_state_id(state)?;
        let path = self.entity_path(&key, state);

        debug!(id = %id, "Calling delete");
        match self.api.delete(&path).await {
            Ok(()) => info!(id = %id, "Deleted remote entity"),
            Err(err) if err.is_not_found() => {
                warn!(id = %id, "Remote entity already gone, treating delete as done")
            },
            Err(err) => return Err(err),
        }

        state.clear_id();
        Ok(())
    }

    /// Adopt an existing entity: decode `raw_id`, set the key attributes and
    /// read the rest.
    ///
    /// `state` is only modified when the whole import succeeds.
    #[instrument(skip_all, fields(resource_type = %self.definition.type_name(), id = %raw_id))]
    pub async fn import(&self, raw_id: &str, state: &mut ResourceState) -> Result<(), ProviderError> {
        let key = self.definition.identifier().decode(raw_id)?;

        let mut imported = state.clone();
        for (name, value) in key.iter() {
            imported.set(name, value.to_json());
        }
        imported.set_id(self.definition.identifier().encode(&key)?);
        self.read(&mut imported).await?;

        *state = imported;
        info!("Imported remote entity");
        Ok(())
    }

    fn check_required(&self, state: &ResourceState) -> Result<(), ProviderError> {
        let missing = self.definition.missing_required(state);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::Validation(format!(
                "Missing required attribute(s) for {}: {}",
                self.definition.type_name(),
                missing.join(", ")
            )))
        }
    }

    fn decode_state_id(&self, state: &ResourceState) -> Result<(String, ResourceKey), ProviderError> {
        let id = state
            .id()
            .ok_or_else(|| ProviderError::MissingIdentifier(self.definition.type_name().to_string()))?;
        let key = self.definition.identifier().decode(id)?;
        Ok((id.to_string(), key))
    }

    /// Path parameters addressing an existing entity: path attributes set in
    /// state, overridden by the decoded key.
    fn entity_path(&self, key: &ResourceKey, state: &ResourceState) -> PathParams {
        let mut path = to_request(state, self.definition.path_attributes());
        for (name, value) in key.iter() {
            path.insert(name, value.to_json());
        }
        path
    }
}

#[async_trait::async_trait]
impl<C: ResourceApi> LifecycleResource for ResourceAdapter<C> {
    fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    async fn create(&self, state: &mut ResourceState) -> Result<String, ProviderError> {
        ResourceAdapter::create(self, state).await
    }

    async fn read(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        ResourceAdapter::read(self, state).await
    }

    async fn update(&self, state: &mut ResourceState) -> Result<bool, ProviderError> {
        ResourceAdapter::update(self, state).await
    }

    async fn delete(&self, state: &mut ResourceState) -> Result<(), ProviderError> {
        ResourceAdapter::delete(self, state).await
    }

    async fn import(&self, raw_id: &str, state: &mut ResourceState) -> Result<(), ProviderError> {
        ResourceAdapter::import(self, raw_id, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{AttributeRole, AttributeSpec};
    use crate::client::{ApiError, RequestParams};
    use crate::schema::AttributeType;
    use crate::testing::{MockCall, MockResourceApi};
    use serde_json::json;

    fn definition() -> ResourceDefinition {
        ResourceDefinition::builder("example_child")
            .attribute(AttributeSpec::new("parent_sid", AttributeType::String, AttributeRole::path_key()))
            .attribute(AttributeSpec::new(
                "scope",
                AttributeType::String,
                AttributeRole::optional_path_key(),
            ))
            .attribute(AttributeSpec::new("label", AttributeType::String, AttributeRole::create_input()))
            .attribute(AttributeSpec::new(
                "color",
                AttributeType::String,
                AttributeRole::create_update_input(),
            ))
            .attribute(AttributeSpec::new("mode", AttributeType::String, AttributeRole::update_input()))
            .attribute(AttributeSpec::new("sid", AttributeType::Int64, AttributeRole::response_only()))
            .attribute(AttributeSpec::new("revision", AttributeType::Int64, AttributeRole::response_only()))
            .identifier(["parent_sid", "sid"])
            .build()
            .unwrap()
    }

    fn adapter(api: MockResourceApi) -> ResourceAdapter<MockResourceApi> {
        ResourceAdapter::new(definition(), api)
    }

    fn entity(value: serde_json::Value) -> crate::client::ApiEntity {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_single_call_without_update_only_inputs() {
        let api = MockResourceApi::new();
        api.push_create(Ok(entity(json!({"parent_sid": "P1", "sid": 5, "revision": 1}))));
        let adapter = adapter(api);

        let mut state =
            ResourceState::from_value(json!({"parent_sid": "P1", "label": "a"})).unwrap();
        let id = adapter.create(&mut state).await.unwrap();

        assert_eq!(id, "P1/5");
        assert_eq!(state.id(), Some("P1/5"));
        assert_eq!(state.get("revision"), Some(&json!(1)));
        assert_eq!(
            adapter.api().calls(),
            vec![MockCall::Create {
                path: RequestParams::new().with("parent_sid", json!("P1")),
                params: RequestParams::new().with("label", json!("a")),
            }]
        );
    }

    #[tokio::test]
    async fn test_create_sends_update_only_inputs_in_follow_up() {
        let api = MockResourceApi::new();
        api.push_create(Ok(entity(json!({"sid": 5, "revision": 1}))));
        api.push_update(Ok(entity(json!({"sid": 5, "revision": 2, "mode": "fast"}))));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({
            "parent_sid": "P1",
            "scope": "S1",
            "label": "a",
            "color": "red",
            "mode": "fast"
        }))
        .unwrap();
        let id = adapter.create(&mut state).await.unwrap();

        // parent_sid is not echoed by the response, so it comes from state
        assert_eq!(id, "P1/5");
        assert_eq!(state.get("revision"), Some(&json!(2)));
        assert_eq!(
            adapter.api().calls(),
            vec![
                MockCall::Create {
                    path: RequestParams::new()
                        .with("parent_sid", json!("P1"))
                        .with("scope", json!("S1")),
                    params: RequestParams::new()
                        .with("color", json!("red"))
                        .with("label", json!("a")),
                },
                MockCall::Update {
                    path: RequestParams::new()
                        .with("parent_sid", json!("P1"))
                        .with("scope", json!("S1"))
                        .with("sid", json!(5)),
                    params: RequestParams::new().with("mode", json!("fast")),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_create_partial_failure_keeps_identifier() {
        let api = MockResourceApi::new();
        api.push_create(Ok(entity(json!({"parent_sid": "P1", "sid": 5}))));
        api.push_update(Err(ApiError::Rejected {
            status: 400,
            message: "bad mode".to_string(),
        }
        .into()));
        let adapter = adapter(api);

        let mut state =
            ResourceState::from_value(json!({"parent_sid": "P1", "mode": "warp"})).unwrap();
        let err = adapter.create(&mut state).await.unwrap_err();

        match err {
            ProviderError::PartialCreate { id, state: recorded, source } => {
                assert_eq!(id, "P1/5");
                assert_eq!(recorded["id"], "P1/5");
                assert!(source.to_string().contains("bad mode"));
            },
            other => panic!("expected partial create, got {:?}", other),
        }
        assert_eq!(state.id(), Some("P1/5"));
        assert_eq!(state.get("sid"), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_create_requires_required_attributes() {
        let adapter = adapter(MockResourceApi::new());
        let mut state = ResourceState::from_value(json!({"label": "a"})).unwrap();
        let err = adapter.create(&mut state).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(ref m) if m.contains("parent_sid")));
        assert!(adapter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_propagates_remote_failure() {
        let api = MockResourceApi::new();
        api.push_create(Err(ApiError::Transport("reset".to_string()).into()));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"parent_sid": "P1"})).unwrap();
        let err = adapter.create(&mut state).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api(ApiError::Transport(_))));
        assert_eq!(state.id(), None);
    }

    #[tokio::test]
    async fn test_read_not_found_is_distinct() {
        let api = MockResourceApi::new();
        api.push_fetch(Err(ApiError::NotFound("gone".to_string()).into()));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"id": "P1/5"})).unwrap();
        let err = adapter.read(&mut state).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert!(!err.to_string().contains("invalid"));
    }

    #[tokio::test]
    async fn test_read_malformed_identifier() {
        let adapter = adapter(MockResourceApi::new());
        let mut state = ResourceState::from_value(json!({"id": "P1"})).unwrap();
        let err = adapter.read(&mut state).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidIdentifier(_)));
        assert!(adapter.api().calls().is_empty());

        let mut state = ResourceState::new();
        let err = adapter.read(&mut state).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingIdentifier(_)));
    }

    #[tokio::test]
    async fn test_update_is_noop_without_changes() {
        let adapter = adapter(MockResourceApi::new());
        let mut state = ResourceState::with_prior(
            json!({"id": "P1/5", "parent_sid": "P1", "color": "red", "label": "new"}),
            json!({"id": "P1/5", "parent_sid": "P1", "color": "red", "label": "old"}),
        )
        .unwrap();

        assert!(!adapter.update(&mut state).await.unwrap());
        assert!(adapter.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_update_eligible_subset() {
        let api = MockResourceApi::new();
        api.push_update(Ok(entity(json!({"parent_sid": "P1", "sid": 5, "revision": 3}))));
        let adapter = adapter(api);

        let mut state = ResourceState::with_prior(
            json!({"parent_sid": "P1", "label": "a", "color": "blue", "mode": "slow"}),
            json!({"id": "P1/5", "parent_sid": "P1", "label": "a", "color": "red", "mode": "slow"}),
        )
        .unwrap();

        assert!(adapter.update(&mut state).await.unwrap());
        assert_eq!(state.get("revision"), Some(&json!(3)));
        assert_eq!(
            adapter.api().calls(),
            vec![MockCall::Update {
                path: RequestParams::new()
                    .with("parent_sid", json!("P1"))
                    .with("sid", json!(5)),
                params: RequestParams::new()
                    .with("color", json!("blue"))
                    .with("mode", json!("slow")),
            }]
        );
    }

    #[tokio::test]
    async fn test_delete_treats_missing_as_success() {
        let api = MockResourceApi::new();
        api.push_delete(Err(ApiError::NotFound("gone".to_string()).into()));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"id": "P1/5"})).unwrap();
        adapter.delete(&mut state).await.unwrap();
        assert_eq!(state.id(), None);
    }

    #[tokio::test]
    async fn test_delete_propagates_other_failures() {
        let api = MockResourceApi::new();
        api.push_delete(Err(ApiError::Rejected {
            status: 403,
            message: "forbidden".to_string(),
        }
        .into()));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"id": "P1/5"})).unwrap();
        assert!(adapter.delete(&mut state).await.is_err());
        assert_eq!(state.id(), Some("P1/5"));
    }

    #[tokio::test]
    async fn test_import_failure_leaves_state_untouched() {
        let api = MockResourceApi::new();
        api.push_fetch(Err(ApiError::NotFound("gone".to_string()).into()));
        let adapter = adapter(api);

        let mut state = ResourceState::new();
        assert!(adapter.import("P1", &mut state).await.is_err());
        assert!(adapter.import("P1/5", &mut state).await.is_err());
        assert_eq!(state, ResourceState::new());
    }

    #[tokio::test]
    async fn test_create_falls_back_to_state_for_null_key_fields() {
        let api = MockResourceApi::new();
        api.push_create(Ok(entity(json!({"parent_sid": null, "sid": 5, "revision": null}))));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"parent_sid": "P1"})).unwrap();
        let id = adapter.create(&mut state).await.unwrap();

        assert_eq!(id, "P1/5");
        assert_eq!(state.get("parent_sid"), Some(&json!("P1")));
    }

    #[tokio::test]
    async fn test_import_records_canonical_identifier() {
        let api = MockResourceApi::new();
        api.push_fetch(Ok(entity(json!({"parent_sid": "P1", "sid": 5}))));
        let adapter = adapter(api);

        let mut state = ResourceState::new();
        adapter.import("P1/+005", &mut state).await.unwrap();
        assert_eq!(state.id(), Some("P1/5"));
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let api = MockResourceApi::new();
        let remote = entity(json!({"parent_sid": "P1", "sid": 5, "revision": 4}));
        api.push_fetch(Ok(remote.clone()));
        api.push_fetch(Ok(remote));
        let adapter = adapter(api);

        let mut state = ResourceState::from_value(json!({"id": "P1/5"})).unwrap();
        adapter.read(&mut state).await.unwrap();
        let first = state.clone();
        adapter.read(&mut state).await.unwrap();
        assert_eq!(state, first);
    }
}
