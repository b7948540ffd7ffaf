//! Named property sets on elements: lookup and find-or-create upserts.

use pavemap_step::EntityId;

use crate::error::ModelError;
use crate::model::ModelAccess;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Unwrapped nominal value, rendered as text.
    Scalar(String),
    /// Property object that carries no nominal value.
    Entity(EntityId),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            PropertyValue::Entity(_) => None,
        }
    }
}

/// Property set named `pset_name` attached to `element`, if any.
pub fn find_property_set<M: ModelAccess + ?Sized>(
    model: &M,
    element: EntityId,
    pset_name: &str,
) -> Option<EntityId> {
    model
        .property_definitions(element)?
        .iter()
        .copied()
        .find(|&pset| model.property_set_name(pset) == Some(pset_name))
}

fn find_property<M: ModelAccess + ?Sized>(model: &M, pset: EntityId, prop_name: &str) -> Option<EntityId> {
    model
        .properties(pset)
        .into_iter()
        .find(|&prop| model.property_name(prop) == Some(prop_name))
}

pub fn get_property<M: ModelAccess + ?Sized>(
    model: &M,
    element: EntityId,
    pset_name: &str,
    prop_name: &str,
) -> Option<PropertyValue> {
    let pset = find_property_set(model, element, pset_name)?;
    let prop = find_property(model, pset, prop_name)?;
    Some(match model.property_value(prop) {
        Some(value) => PropertyValue::Scalar(value),
        None => PropertyValue::Entity(prop),
    })
}

/// Existing set named `pset_name` on `element`, or a new empty one.
pub fn ensure_property_set<M: ModelAccess + ?Sized>(
    model: &mut M,
    element: EntityId,
    pset_name: &str,
) -> Result<EntityId, ModelError> {
    if let Some(pset) = find_property_set(model, element, pset_name) {
        return Ok(pset);
    }
    let pset = model.create_property_set(element, pset_name)?;
    tracing::debug!(element = %element, pset = %pset, name = pset_name, "created property set");
    Ok(pset)
}

/// Overwrite `prop_name` in place, or append it. Values are always written as `IFCTEXT`.
pub fn upsert_property<M: ModelAccess + ?Sized>(
    model: &mut M,
    pset: EntityId,
    prop_name: &str,
    value: &str,
) -> Result<EntityId, ModelError> {
    match find_property(model, pset, prop_name) {
        Some(prop) => {
            model.set_text_value(prop, value)?;
            Ok(prop)
        }
        None => model.append_text_property(pset, prop_name, value),
    }
}

pub fn add_property<M: ModelAccess + ?Sized>(
    model: &mut M,
    element: EntityId,
    pset_name: &str,
    prop_name: &str,
    value: &str,
) -> Result<EntityId, ModelError> {
    let pset = ensure_property_set(model, element, pset_name)?;
    upsert_property(model, pset, prop_name, value)
}
