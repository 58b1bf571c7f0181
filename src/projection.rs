//! Mapping between resource state and API payloads.

use tracing::trace;

use crate::classify::AttributeSpec;
use crate::client::{ApiEntity, RequestParams};
use crate::resource::ResourceDefinition;
use crate::state::ResourceState;

/// Extract the named attributes from state into request parameters.
///
/// Attributes absent from state are left out entirely.
pub fn to_request<'a, I>(state: &ResourceState, fields: I) -> RequestParams
where
    I: IntoIterator<Item = &'a AttributeSpec>,
{
    let mut params = RequestParams::new();
    for spec in fields {
        if let Some(value) = state.get(&spec.name) {
            params.insert(spec.name.clone(), value.clone());
        }
    }
    params
}

/// Write every declared attribute the response carries into state.
///
/// Values already in state are overwritten, key attributes included, and a
/// `null` clears the attribute. Addressing attributes keep their value when
/// the response reports them as `null`. Undeclared keys are skipped.
pub fn from_response(definition: &ResourceDefinition, entity: &ApiEntity, state: &mut ResourceState) {
    for (name, value) in entity {
        if value.is_null() && definition.is_addressing(name) {
            continue;
        }
        if definition.attribute(name).is_some() {
            state.set(name.clone(), value.clone());
        } else {
            trace!(
                resource_type = definition.type_name(),
                field = %name,
                "Skipping undeclared response field"
            );
        }
    }
}
