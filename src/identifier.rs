//! Composite resource identifiers.
//!
//! Many remote entities are addressed by more than one key (for example a call
//! recording lives under a call and is addressed by `{call_sid}/{sid}`). The
//! declarative framework only stores a single opaque string per resource, so
//! this module joins the key fields with [`DELIMITER`] and splits them back,
//! validating both the segment count and the type of every segment.
//!
//! # Example
//!
//! ```
//! use hemmer_rest_provider::identifier::{IdentifierFormat, KeyValue};
//!
//! let format = IdentifierFormat::new()
//!     .with_string("call_sid")
//!     .with_int64("sid");
//!
//! let key = format.decode("CA123/123").unwrap();
//! assert_eq!(key.get("call_sid"), Some(&KeyValue::String("CA123".into())));
//! assert_eq!(key.get("sid"), Some(&KeyValue::Int64(123)));
//! assert_eq!(format.encode(&key).unwrap(), "CA123/123");
//!
//! let err = format.decode("CA123").unwrap_err();
//! assert!(err.to_string().contains("invalid"));
//! ```

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// The separator placed between key fields.
pub const DELIMITER: char = '/';

/// Errors produced while encoding or decoding an identifier.
///
/// Every message starts with `invalid identifier` so that import tooling can
/// match on the substring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier has the wrong number of segments.
    #[error("invalid identifier {id:?}: expected {expected} segment(s) in the form {template}, found {found}")]
    SegmentCount {
        /// The raw identifier.
        id: String,
        /// The `{a}/{b}` template of the expected format.
        template: String,
        /// The number of segments the format requires.
        expected: usize,
        /// The number of segments present.
        found: usize,
    },

    /// A segment could not be coerced to the type of its key field.
    #[error("invalid identifier {id:?}: segment {segment:?} for '{field}' is not a valid {kind}")]
    Segment {
        /// The raw identifier.
        id: String,
        /// The key field the segment belongs to.
        field: String,
        /// The offending segment.
        segment: String,
        /// The expected type.
        kind: KeyKind,
    },

    /// A key field is empty, missing, or of the wrong type.
    #[error("invalid identifier field '{field}': {reason}")]
    Field {
        /// The key field.
        field: String,
        /// Why the field was rejected.
        reason: String,
    },
}

/// The type of a single key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A non-empty string without the delimiter.
    String,
    /// A signed 64-bit integer.
    Int64,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::String => f.write_str("string"),
            KeyKind::Int64 => f.write_str("int64"),
        }
    }
}

/// A single typed key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// A string key.
    String(String),
    /// An integer key.
    Int64(i64),
}

impl KeyValue {
    /// The kind of this value.
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyValue::String(_) => KeyKind::String,
            KeyValue::Int64(_) => KeyKind::Int64,
        }
    }

    /// Coerce a state or response value into a key of the given kind.
    ///
    /// Integer keys accept both JSON numbers and numeric strings.
    pub fn from_json(kind: KeyKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (KeyKind::String, Value::String(s)) if !s.is_empty() => {
                Some(KeyValue::String(s.clone()))
            },
            (KeyKind::Int64, Value::Number(n)) => n.as_i64().map(KeyValue::Int64),
            (KeyKind::Int64, Value::String(s)) => s.parse().ok().map(KeyValue::Int64),
            _ => None,
        }
    }

    /// Convert this key into the JSON value stored in resource state.
    pub fn to_json(&self) -> Value {
        match self {
            KeyValue::String(s) => Value::String(s.clone()),
            KeyValue::Int64(n) => Value::from(*n),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::String(s) => f.write_str(s),
            KeyValue::Int64(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Int64(value)
    }
}

/// A named field of an identifier format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    /// The attribute this field is stored in.
    pub name: String,
    /// The type of the field.
    pub kind: KeyKind,
}

/// An ordered tuple of key values addressing one remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceKey {
    fields: Vec<(String, KeyValue)>,
}

impl ResourceKey {
    /// Create an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field to this key.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&KeyValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterate over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The number of fields in this key.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether this key has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The fixed, ordered layout of an identifier for one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentifierFormat {
    fields: Vec<KeyField>,
}

impl IdentifierFormat {
    /// Create an empty format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a string field.
    pub fn with_string(self, name: impl Into<String>) -> Self {
        self.with_field(name, KeyKind::String)
    }

    /// Append an int64 field.
    pub fn with_int64(self, name: impl Into<String>) -> Self {
        self.with_field(name, KeyKind::Int64)
    }

    /// Append a field of the given kind.
    pub fn with_field(mut self, name: impl Into<String>, kind: KeyKind) -> Self {
        self.fields.push(KeyField {
            name: name.into(),
            kind,
        });
        self
    }

    /// The fields of this format, in order.
    pub fn fields(&self) -> &[KeyField] {
        &self.fields
    }

    /// The number of segments an identifier must have.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// A human-readable template such as `{call_sid}/{sid}`.
    pub fn template(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{{{}}}", f.name))
            .collect::<Vec<_>>()
            .join(&DELIMITER.to_string())
    }

    /// Join the key fields into an identifier.
    ///
    /// The key must carry exactly the fields of this format, in order, each
    /// non-empty and of the declared kind. String fields may not contain the
    /// delimiter, otherwise decoding would not give the key back.
    pub fn encode(&self, key: &ResourceKey) -> Result<String, IdentifierError> {
        if key.len() != self.arity() {
            return Err(IdentifierError::Field {
                field: self.template(),
                reason: format!("expected {} key field(s), got {}", self.arity(), key.len()),
            });
        }

        let mut segments = Vec::with_capacity(self.arity());
        for (field, (name, value)) in self.fields.iter().zip(key.iter()) {
            if field.name != name {
                return Err(IdentifierError::Field {
                    field: field.name.clone(),
                    reason: format!("found '{}' in its position", name),
                });
            }
            if field.kind != value.kind() {
                return Err(IdentifierError::Field {
                    field: field.name.clone(),
                    reason: format!("expected {}, got {}", field.kind, value.kind()),
                });
            }
            if let KeyValue::String(s) = value {
                if s.is_empty() {
                    return Err(IdentifierError::Field {
                        field: field.name.clone(),
                        reason: "value is empty".to_string(),
                    });
                }
                if s.contains(DELIMITER) {
                    return Err(IdentifierError::Field {
                        field: field.name.clone(),
                        reason: format!("value {:?} contains '{}'", s, DELIMITER),
                    });
                }
            }
            segments.push(value.to_string());
        }

        Ok(segments.join(&DELIMITER.to_string()))
    }

    /// Split an identifier back into its typed key fields.
    pub fn decode(&self, id: &str) -> Result<ResourceKey, IdentifierError> {
        let segments: Vec<&str> = id.split(DELIMITER).collect();
        if segments.len() != self.arity() {
            return Err(IdentifierError::SegmentCount {
                id: id.to_string(),
                template: self.template(),
                expected: self.arity(),
                found: segments.len(),
            });
        }

        let mut key = ResourceKey::new();
        for (field, segment) in self.fields.iter().zip(segments) {
            let value = match field.kind {
                KeyKind::String if !segment.is_empty() => {
                    Some(KeyValue::String(segment.to_string()))
                },
                KeyKind::String => None,
                KeyKind::Int64 => segment.parse().ok().map(KeyValue::Int64),
            };
            let value = value.ok_or_else(|| IdentifierError::Segment {
                id: id.to_string(),
                field: field.name.clone(),
                segment: segment.to_string(),
                kind: field.kind,
            })?;
            key.fields.push((field.name.clone(), value));
        }

        Ok(key)
    }

    /// Assemble a key by looking up each field with `lookup`.
    ///
    /// Used to build the key from a response entity (falling back to state for
    /// fields the response does not echo).
    pub fn key_from<'a, F>(&self, mut lookup: F) -> Result<ResourceKey, IdentifierError>
    where
        F: FnMut(&str) -> Option<&'a Value>,
    {
        let mut key = ResourceKey::new();
        for field in &self.fields {
            let value = lookup(&field.name)
                .and_then(|v| KeyValue::from_json(field.kind, v))
                .ok_or_else(|| IdentifierError::Field {
                    field: field.name.clone(),
                    reason: format!("no {} value available", field.kind),
                })?;
            key.fields.push((field.name.clone(), value));
        }
        Ok(key)
    }
}
