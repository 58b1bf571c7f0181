//! `twilio_api_accounts_calls_recordings`: a recording of an in-progress call.
//!
//! Endpoints (relative to `/2010-04-01/Accounts/{AccountSid}`):
//!
//! | Operation | Method & path                              |
//! |-----------|--------------------------------------------|
//! | create    | `POST /Calls/{CallSid}/Recordings`         |
//! | fetch     | `GET /Calls/{CallSid}/Recordings/{Sid}`    |
//! | update    | `POST /Calls/{CallSid}/Recordings/{Sid}`   |
//! | delete    | `DELETE /Calls/{CallSid}/Recordings/{Sid}` |
//!
//! The account segment defaults to the configured account and may be
//! overridden per resource with `path_account_sid`. `pause_behavior` and
//! `status` are only accepted by the update endpoint, so setting either at
//! creation triggers a follow-up update.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::ResourceAdapter;
use crate::classify::{AttributeRole, AttributeSpec};
use crate::client::{
    path_i64, path_str, to_entity, ApiEntity, ApiError, PathParams, RequestParams, ResourceApi,
};
use crate::error::ProviderError;
use crate::resource::ResourceDefinition;
use crate::schema::AttributeType;

/// The resource type name.
pub const TYPE_NAME: &str = "twilio_api_accounts_calls_recordings";

const PATH_ACCOUNT_SID: &str = "path_account_sid";
const CALL_SID: &str = "call_sid";
const SID: &str = "sid";

/// The attribute table and identifier of call recordings.
///
/// The identifier is `{call_sid}/{sid}`.
pub fn definition() -> Result<ResourceDefinition, ProviderError> {
    use AttributeType as T;

    let create = AttributeRole::create_input;
    let update = AttributeRole::update_input;
    let response = AttributeRole::response_only;

    ResourceDefinition::builder(TYPE_NAME)
        .description("A recording of a call in progress")
        .attribute(
            AttributeSpec::new(PATH_ACCOUNT_SID, T::String, AttributeRole::optional_path_key())
                .with_description("The account that owns the call; defaults to the configured account"),
        )
        .attribute(
            AttributeSpec::new(CALL_SID, T::String, AttributeRole::path_key())
                .with_description("The call to record"),
        )
        .attribute(AttributeSpec::new(
            "recording_status_callback_event",
            T::list(T::String),
            create(),
        ))
        .attribute(AttributeSpec::new("recording_status_callback", T::String, create()))
        .attribute(AttributeSpec::new("recording_status_callback_method", T::String, create()))
        .attribute(AttributeSpec::new("trim", T::String, create()))
        .attribute(AttributeSpec::new("recording_channels", T::String, create()))
        .attribute(AttributeSpec::new("recording_track", T::String, create()))
        .attribute(
            AttributeSpec::new("status", T::String, update())
                .with_description("in-progress, paused or stopped"),
        )
        .attribute(
            AttributeSpec::new("pause_behavior", T::String, update())
                .with_description("skip or silence; applies while the recording is paused"),
        )
        .attribute(AttributeSpec::new("account_sid", T::String, response()))
        .attribute(AttributeSpec::new("conference_sid", T::String, response()))
        .attribute(AttributeSpec::new("date_created", T::String, response()))
        .attribute(AttributeSpec::new("date_updated", T::String, response()))
        .attribute(AttributeSpec::new("start_time", T::String, response()))
        .attribute(AttributeSpec::new("duration", T::String, response()))
        .attribute(AttributeSpec::new(SID, T::Int64, response()))
        .attribute(AttributeSpec::new("price", T::Float64, response()))
        .attribute(AttributeSpec::new("price_unit", T::String, response()))
        .attribute(AttributeSpec::new("channels", T::Int64, response()))
        .attribute(AttributeSpec::new("source", T::String, response()))
        .attribute(AttributeSpec::new("error_code", T::Int64, response()))
        .attribute(AttributeSpec::new("uri", T::String, response()))
        .attribute(AttributeSpec::new("revision", T::Int64, response()))
        .identifier([CALL_SID, SID])
        .build()
}

/// A call recording as returned by the API.
///
/// Field names follow the API's JSON keys, which are also the attribute names.
/// Missing fields serialize as `null`, which clears the attribute on read.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecording {
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
    pub conference_sid: Option<String>,
    pub date_created: Option<String>,
    pub date_updated: Option<String>,
    pub start_time: Option<String>,
    pub duration: Option<String>,
    pub sid: Option<i64>,
    pub price: Option<f64>,
    pub price_unit: Option<String>,
    pub status: Option<String>,
    pub channels: Option<i64>,
    pub source: Option<String>,
    pub error_code: Option<i64>,
    pub uri: Option<String>,
    pub revision: Option<i64>,
}

/// Body of the create call.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCallRecordingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_status_callback_event: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_status_callback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_status_callback_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_channels: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_track: Option<String>,
}

/// Body of the update call.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateCallRecordingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_behavior: Option<String>,
}

/// Typed client for the call recordings endpoints.
///
/// `account_sid` is the optional account path override; `None` means the
/// account the client authenticates as.
#[async_trait::async_trait]
pub trait CallRecordingsApi: Send + Sync {
    /// Start recording a call.
    async fn create_call_recording(
        &self,
        account_sid: Option<&str>,
        call_sid: &str,
        params: &CreateCallRecordingParams,
    ) -> Result<CallRecording, ApiError>;

    /// Fetch a recording.
    async fn fetch_call_recording(
        &self,
        account_sid: Option<&str>,
        call_sid: &str,
        sid: i64,
    ) -> Result<CallRecording, ApiError>;

    /// Change the status or pause behavior of a recording.
    async fn update_call_recording(
        &self,
        account_sid: Option<&str>,
        call_sid: &str,
        sid: i64,
        params: &UpdateCallRecordingParams,
    ) -> Result<CallRecording, ApiError>;

    /// Delete a recording.
    async fn delete_call_recording(
        &self,
        account_sid: Option<&str>,
        call_sid: &str,
        sid: i64,
    ) -> Result<(), ApiError>;
}

/// Adapts a [`CallRecordingsApi`] client to [`ResourceApi`].
#[derive(Debug, Clone)]
pub struct CallRecordingsBinding<C> {
    client: C,
}

impl<C> CallRecordingsBinding<C> {
    /// Wrap a typed client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }
}

fn account_sid(path: &PathParams) -> Option<&str> {
    path.get(PATH_ACCOUNT_SID).and_then(Value::as_str)
}

#[async_trait::async_trait]
impl<C: CallRecordingsApi> ResourceApi for CallRecordingsBinding<C> {
    async fn create(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError> {
        let call_sid = path_str(path, CALL_SID)?;
        let params: CreateCallRecordingParams = params.decode()?;
        let recording = self
            .client
            .create_call_recording(account_sid(path), call_sid, &params)
            .await?;
        to_entity(&recording)
    }

    async fn fetch(&self, path: &PathParams) -> Result<ApiEntity, ProviderError> {
        let call_sid = path_str(path, CALL_SID)?;
        let sid = path_i64(path, SID)?;
        let recording = self
            .client
            .fetch_call_recording(account_sid(path), call_sid, sid)
            .await?;
        to_entity(&recording)
    }

    async fn update(
        &self,
        path: &PathParams,
        params: &RequestParams,
    ) -> Result<ApiEntity, ProviderError> {
        let call_sid = path_str(path, CALL_SID)?;
        let sid = path_i64(path, SID)?;
        let params: UpdateCallRecordingParams = params.decode()?;
        let recording = self
            .client
            .update_call_recording(account_sid(path), call_sid, sid, &params)
            .await?;
        to_entity(&recording)
    }

    async fn delete(&self, path: &PathParams) -> Result<(), ProviderError> {
        let call_sid = path_str(path, CALL_SID)?;
        let sid = path_i64(path, SID)?;
        self.client
            .delete_call_recording(account_sid(path), call_sid, sid)
            .await?;
        Ok(())
    }
}

/// A lifecycle adapter for call recordings backed by `client`.
pub fn adapter<C: CallRecordingsApi>(
    client: C,
) -> Result<ResourceAdapter<CallRecordingsBinding<C>>, ProviderError> {
    Ok(ResourceAdapter::new(definition()?, CallRecordingsBinding::new(client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_definition_builds() {
        let definition = definition().unwrap();
        assert_eq!(definition.type_name(), TYPE_NAME);
        assert_eq!(definition.identifier().template(), "{call_sid}/{sid}");

        let path: Vec<&str> = definition.path_attributes().map(|a| a.name.as_str()).collect();
        assert_eq!(path, vec!["path_account_sid", "call_sid"]);

        let update_only: Vec<&str> = definition
            .update_only_attributes()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(update_only, vec!["status", "pause_behavior"]);
    }

    #[test]
    fn test_response_fields_are_declared() {
        let definition = definition().unwrap();
        let entity = to_entity(&CallRecording {
            sid: Some(1),
            price: Some(-0.0025),
            ..Default::default()
        })
        .unwrap();
        for name in entity.keys() {
            assert!(definition.attribute(name).is_some(), "undeclared field {}", name);
        }
    }

    #[derive(Default)]
    struct LastCall {
        seen: Mutex<Option<(Option<String>, String, Option<i64>, Value)>>,
    }

    impl LastCall {
        fn record(&self, account: Option<&str>, call_sid: &str, sid: Option<i64>, body: Value) {
            *self.seen.lock().unwrap() = Some((account.map(str::to_string), call_sid.to_string(), sid, body));
        }

        fn recording(call_sid: &str, sid: i64) -> CallRecording {
            CallRecording {
                call_sid: Some(call_sid.to_string()),
                sid: Some(sid),
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl CallRecordingsApi for LastCall {
        async fn create_call_recording(
            &self,
            account_sid: Option<&str>,
            call_sid: &str,
            params: &CreateCallRecordingParams,
        ) -> Result<CallRecording, ApiError> {
            self.record(account_sid, call_sid, None, serde_json::to_value(params).unwrap());
            Ok(Self::recording(call_sid, 7))
        }

        async fn fetch_call_recording(
            &self,
            account_sid: Option<&str>,
            call_sid: &str,
            sid: i64,
        ) -> Result<CallRecording, ApiError> {
            self.record(account_sid, call_sid, Some(sid), Value::Null);
            Err(ApiError::NotFound(format!("{}/{}", call_sid, sid)))
        }

        async fn update_call_recording(
            &self,
            account_sid: Option<&str>,
            call_sid: &str,
            sid: i64,
            params: &UpdateCallRecordingParams,
        ) -> Result<CallRecording, ApiError> {
            self.record(account_sid, call_sid, Some(sid), serde_json::to_value(params).unwrap());
            Ok(Self::recording(call_sid, sid))
        }

        async fn delete_call_recording(
            &self,
            account_sid: Option<&str>,
            call_sid: &str,
            sid: i64,
        ) -> Result<(), ApiError> {
            self.record(account_sid, call_sid, Some(sid), Value::Null);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_binding_create_decodes_params() {
        let binding = CallRecordingsBinding::new(LastCall::default());
        let path = RequestParams::new()
            .with("call_sid", json!("CA1"))
            .with("path_account_sid", json!("AC9"));
        let params = RequestParams::new()
            .with("trim", json!("trim-silence"))
            .with("recording_status_callback_event", json!(["completed"]));

        let entity = binding.create(&path, &params).await.unwrap();
        assert_eq!(entity["sid"], json!(7));
        assert!(entity["revision"].is_null());

        let seen = binding.client().seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0.as_deref(), Some("AC9"));
        assert_eq!(seen.1, "CA1");
        assert_eq!(
            seen.3,
            json!({"trim": "trim-silence", "recording_status_callback_event": ["completed"]})
        );
    }

    #[tokio::test]
    async fn test_binding_update_uses_key() {
        let binding = CallRecordingsBinding::new(LastCall::default());
        let path = RequestParams::new()
            .with("call_sid", json!("CA1"))
            .with("sid", json!(7));
        let params = RequestParams::new().with("pause_behavior", json!("skip"));

        binding.update(&path, &params).await.unwrap();
        let seen = binding.client().seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0, None);
        assert_eq!(seen.2, Some(7));
        assert_eq!(seen.3, json!({"pause_behavior": "skip"}));
    }

    #[tokio::test]
    async fn test_binding_maps_not_found() {
        let binding = CallRecordingsBinding::new(LastCall::default());
        let path = RequestParams::new()
            .with("call_sid", json!("CA1"))
            .with("sid", json!(7));
        let err = binding.fetch(&path).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_binding_requires_path_keys() {
        let binding = CallRecordingsBinding::new(LastCall::default());
        let err = binding
            .delete(&RequestParams::new().with("call_sid", json!("CA1")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(ref m) if m.contains("sid")));
        assert!(binding.client().seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_binding_rejects_mistyped_params() {
        let binding = CallRecordingsBinding::new(LastCall::default());
        let path = RequestParams::new().with("call_sid", json!("CA1"));
        let params = RequestParams::new().with("trim", json!(5));
        let err = binding.create(&path, &params).await.unwrap_err();
        assert!(matches!(err, ProviderError::Serialization(_)));
    }
}
