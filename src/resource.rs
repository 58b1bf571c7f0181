//! Per-type resource definitions.
//!
//! A [`ResourceDefinition`] is the data table that drives the generic
//! [`ResourceAdapter`](crate::adapter::ResourceAdapter): the ordered attribute
//! specs and the identifier layout of one resource type. Definitions are
//! built once and shared immutably by every instance of the type.

use std::collections::HashSet;

use crate::classify::AttributeSpec;
use crate::error::ProviderError;
use crate::identifier::{IdentifierFormat, KeyKind};
use crate::schema::{AttributeType, Schema};
use crate::state::{ResourceState, ID_KEY};

/// The static description of one resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    type_name: String,
    description: Option<String>,
    attributes: Vec<AttributeSpec>,
    identifier: IdentifierFormat,
}

impl ResourceDefinition {
    /// Start building a definition for `type_name`.
    pub fn builder(type_name: impl Into<String>) -> ResourceDefinitionBuilder {
        ResourceDefinitionBuilder {
            type_name: type_name.into(),
            description: None,
            attributes: Vec::new(),
            identifier: Vec::new(),
        }
    }

    /// The resource type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All attributes, in declaration order.
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The identifier layout.
    pub fn identifier(&self) -> &IdentifierFormat {
        &self.identifier
    }

    /// Whether `name` addresses the entity: a path segment or an identifier
    /// field.
    pub fn is_addressing(&self, name: &str) -> bool {
        self.identifier.fields().iter().any(|f| f.name == name)
            || self.attribute(name).is_some_and(|a| a.role.is_path())
    }

    /// Attributes that are URL path segments.
    pub fn path_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.role.is_path())
    }

    /// Attributes carried by the create call's body.
    pub fn create_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.role.sent_on_create())
    }

    /// Attributes carried by the update call's body.
    pub fn update_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.role.sent_on_update())
    }

    /// Attributes only a follow-up update call can set.
    pub fn update_only_attributes(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|a| a.role.update_only())
    }

    /// Names of required attributes missing from `state`.
    pub fn missing_required(&self, state: &ResourceState) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|a| a.flags().required && !state.is_set(&a.name))
            .map(|a| a.name.as_str())
            .collect()
    }

    /// The schema of this resource, classified from the attribute roles.
    pub fn schema(&self) -> Schema {
        let schema = self
            .attributes
            .iter()
            .fold(Schema::v0(), |schema, spec| {
                schema.with_attribute(spec.name.clone(), spec.to_attribute())
            });
        match &self.description {
            Some(description) => schema.with_description(description.clone()),
            None => schema,
        }
    }
}

/// Builder for [`ResourceDefinition`].
#[derive(Debug)]
pub struct ResourceDefinitionBuilder {
    type_name: String,
    description: Option<String>,
    attributes: Vec<AttributeSpec>,
    identifier: Vec<String>,
}

impl ResourceDefinitionBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare an attribute.
    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.push(spec);
        self
    }

    /// Declare the identifier as the given attributes, in order.
    ///
    /// Each segment's kind follows the attribute's type.
    pub fn identifier<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifier = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and build the definition.
    pub fn build(self) -> Result<ResourceDefinition, ProviderError> {
        let type_name = self.type_name;
        let invalid = |msg: String| ProviderError::Definition(format!("{}: {}", type_name, msg));

        let mut seen = HashSet::new();
        for spec in &self.attributes {
            if spec.name == ID_KEY {
                return Err(invalid(format!("attribute name '{}' is reserved", ID_KEY)));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(invalid(format!("duplicate attribute '{}'", spec.name)));
            }
        }

        if self.identifier.is_empty() {
            return Err(invalid("identifier has no fields".to_string()));
        }

        let mut identifier = IdentifierFormat::new();
        for field in &self.identifier {
            let spec = self
                .attributes
                .iter()
                .find(|a| &a.name == field)
                .ok_or_else(|| invalid(format!("identifier field '{}' is not an attribute", field)))?;
            let kind = match spec.attr_type {
                AttributeType::String => KeyKind::String,
                AttributeType::Int64 => KeyKind::Int64,
                ref other => {
                    return Err(invalid(format!(
                        "identifier field '{}' has unsupported type {:?}",
                        field, other
                    )))
                },
            };
            identifier = identifier.with_field(field.clone(), kind);
        }

        Ok(ResourceDefinition {
            type_name,
            description: self.description,
            attributes: self.attributes,
            identifier,
        })
    }
}
