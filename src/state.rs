//! The mutable attribute bag of one managed resource.
//!
//! The declarative framework hands resource state across the provider boundary
//! as a JSON object whose `id` key is the opaque identifier. [`ResourceState`]
//! splits that object into attribute values plus an identifier slot, and keeps
//! the prior values (when there are any) so adapters can ask whether an
//! attribute changed.

use serde_json::{Map, Value};

use crate::error::ProviderError;

/// The state key under which the identifier travels.
pub const ID_KEY: &str = "id";

/// Attribute values and identifier of one resource instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    id: Option<String>,
    values: Map<String, Value>,
    prior: Option<Map<String, Value>>,
}

impl ResourceState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from its JSON form.
    ///
    /// `null` is treated as an empty object. `null` attribute values are
    /// dropped, since an absent value and a `null` one mean the same thing.
    pub fn from_value(value: Value) -> Result<Self, ProviderError> {
        let (id, values) = split(value)?;
        Ok(Self {
            id,
            values,
            prior: None,
        })
    }

    /// Build a state from planned values and the prior state they replace.
    ///
    /// The identifier is taken from the planned state, falling back to the
    /// prior one.
    pub fn with_prior(planned: Value, prior: Value) -> Result<Self, ProviderError> {
        let (planned_id, values) = split(planned)?;
        let (prior_id, prior) = split(prior)?;
        Ok(Self {
            id: planned_id.or(prior_id),
            values,
            prior: Some(prior),
        })
    }

    /// The identifier, if the resource has one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Set the identifier.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Remove the identifier, marking the resource as gone.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Whether the attribute has a value.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set an attribute value. Setting `null` removes the attribute.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if value.is_null() {
            self.values.remove(&name);
        } else {
            self.values.insert(name, value);
        }
    }

    /// Whether the attribute differs from its prior value.
    ///
    /// Without a prior state every set attribute counts as changed.
    pub fn has_changed(&self, name: &str) -> bool {
        match &self.prior {
            Some(prior) => prior.get(name) != self.values.get(name),
            None => self.is_set(name),
        }
    }

    /// Iterate over the attribute values.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert back into the JSON form, with the identifier under `id`.
    pub fn to_value(&self) -> Value {
        let mut map = self.values.clone();
        if let Some(id) = &self.id {
            map.insert(ID_KEY.to_string(), Value::String(id.clone()));
        }
        Value::Object(map)
    }

    /// Consume into the JSON form.
    pub fn into_value(self) -> Value {
        let mut map = self.values;
        if let Some(id) = self.id {
            map.insert(ID_KEY.to_string(), Value::String(id));
        }
        Value::Object(map)
    }
}

fn split(value: Value) -> Result<(Option<String>, Map<String, Value>), ProviderError> {
    let mut map = match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ProviderError::Validation(format!(
                "Expected resource state to be an object, got {}",
                other
            )))
        },
    };

    let id = match map.remove(ID_KEY) {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if id.is_empty() => None,
        Some(Value::String(id)) => Some(id),
        Some(other) => {
            return Err(ProviderError::Validation(format!(
                "Expected '{}' to be a string, got {}",
                ID_KEY, other
            )))
        },
    };

    map.retain(|_, v| !v.is_null());
    Ok((id, map))
}
