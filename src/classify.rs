//! Attribute classification.
//!
//! Every attribute of a resource has a static role describing where it
//! appears in the remote API: in the URL path, in a create or update request
//! body, or only in responses. The role alone decides the attribute's
//! required/optional/computed flags:
//!
//! | Role                         | Required | Optional | Computed |
//! |------------------------------|----------|----------|----------|
//! | path key                     | yes      |          |          |
//! | optional path parameter      |          | yes      | yes      |
//! | required input               | yes      |          |          |
//! | optional input               |          | yes      | yes      |
//! | response only                |          |          | yes      |
//!
//! Optional inputs are also computed because the server may fill in a value
//! the caller never set, and both states must be representable.

use serde::{Deserialize, Serialize};

use crate::schema::{Attribute, AttributeFlags, AttributeType};

/// Where an attribute lives in the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRole {
    /// A URL path segment identifying the parent collection.
    PathKey {
        /// Whether the path segment must be given (e.g. `call_sid`), or may
        /// fall back to a default (e.g. an account derived from credentials).
        required: bool,
    },
    /// A request body parameter.
    Input {
        /// Whether the API requires this parameter.
        required: bool,
        /// Whether the create call accepts it.
        on_create: bool,
        /// Whether the update call accepts it.
        on_update: bool,
    },
    /// Returned by the API but never sent.
    ResponseOnly,
}

impl AttributeRole {
    /// A required path segment.
    pub fn path_key() -> Self {
        Self::PathKey { required: true }
    }

    /// An optional path segment.
    pub fn optional_path_key() -> Self {
        Self::PathKey { required: false }
    }

    /// A parameter the create call requires.
    pub fn required_create_input() -> Self {
        Self::Input {
            required: true,
            on_create: true,
            on_update: false,
        }
    }

    /// An optional parameter only the create call accepts.
    pub fn create_input() -> Self {
        Self::Input {
            required: false,
            on_create: true,
            on_update: false,
        }
    }

    /// An optional parameter only the update call accepts.
    pub fn update_input() -> Self {
        Self::Input {
            required: false,
            on_create: false,
            on_update: true,
        }
    }

    /// An optional parameter both calls accept.
    pub fn create_update_input() -> Self {
        Self::Input {
            required: false,
            on_create: true,
            on_update: true,
        }
    }

    /// A response-only attribute.
    pub fn response_only() -> Self {
        Self::ResponseOnly
    }

    /// Whether this attribute is a path segment.
    pub fn is_path(&self) -> bool {
        matches!(self, Self::PathKey { .. })
    }

    /// Whether the create call carries this attribute in its body.
    pub fn sent_on_create(&self) -> bool {
        matches!(self, Self::Input { on_create: true, .. })
    }

    /// Whether the update call carries this attribute in its body.
    pub fn sent_on_update(&self) -> bool {
        matches!(self, Self::Input { on_update: true, .. })
    }

    /// Whether only a follow-up update call can set this attribute.
    pub fn update_only(&self) -> bool {
        matches!(
            self,
            Self::Input {
                on_create: false,
                on_update: true,
                ..
            }
        )
    }
}

/// Compute the schema flags for a role.
pub fn classify(role: AttributeRole) -> AttributeFlags {
    match role {
        AttributeRole::PathKey { required: true }
        | AttributeRole::Input { required: true, .. } => AttributeFlags::required(),
        AttributeRole::PathKey { required: false } | AttributeRole::Input { .. } => {
            AttributeFlags::optional_computed()
        },
        AttributeRole::ResponseOnly => AttributeFlags::computed(),
    }
}

/// Static metadata of one resource attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// The attribute name in state (snake_case).
    pub name: String,
    /// The value type.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Where the attribute lives in the remote API.
    pub role: AttributeRole,
    /// Whether the value should be hidden in logs/UI.
    #[serde(default)]
    pub sensitive: bool,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeSpec {
    /// Create a new attribute spec.
    pub fn new(name: impl Into<String>, attr_type: AttributeType, role: AttributeRole) -> Self {
        Self {
            name: name.into(),
            attr_type,
            role,
            sensitive: false,
            description: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// The classified flags of this attribute.
    pub fn flags(&self) -> AttributeFlags {
        let flags = classify(self.role);
        if self.sensitive {
            flags.sensitive()
        } else {
            flags
        }
    }

    /// The schema attribute for this spec.
    pub fn to_attribute(&self) -> Attribute {
        let attr = Attribute::new(self.attr_type.clone(), self.flags());
        match &self.description {
            Some(description) => attr.with_description(description.clone()),
            None => attr,
        }
    }
}
