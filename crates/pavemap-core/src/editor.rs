//! Single-property edits addressed by zone name and course name.

use std::collections::BTreeSet;

use pavemap_step::EntityId;

use crate::error::{MapError, Result};
use crate::events::CancelToken;
use crate::model::ModelAccess;
use crate::properties::{add_property, find_property_set, get_property, PropertyValue};
use crate::walker::{find_courses_under, find_zone, find_zones};

/// One manual edit; every field must be non-blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyEdit {
    pub zone: String,
    pub course: String,
    pub pset: String,
    pub name: String,
    pub value: String,
}

impl PropertyEdit {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("zone", &self.zone),
            ("course", &self.course),
            ("pset", &self.pset),
            ("name", &self.name),
            ("value", &self.value),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(MapError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Sorted, de-duplicated zone names.
pub fn zone_names<M: ModelAccess + ?Sized>(model: &M) -> Vec<String> {
    find_zones(model)
        .into_iter()
        .filter_map(|zone| model.name(zone).map(str::trim))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn resolve_zone<M: ModelAccess + ?Sized>(model: &M, zone: &str) -> Result<EntityId> {
    find_zone(model, zone).ok_or_else(|| MapError::ZoneNotFound(zone.to_string()))
}

fn courses_in<M: ModelAccess + ?Sized>(model: &M, zone: &str) -> Result<Vec<EntityId>> {
    let zone = resolve_zone(model, zone)?;
    Ok(find_courses_under(model, zone, &CancelToken::new())?)
}

fn resolve_course<M: ModelAccess + ?Sized>(model: &M, zone: &str, course: &str) -> Result<EntityId> {
    courses_in(model, zone)?
        .into_iter()
        .find(|&c| model.name(c) == Some(course))
        .ok_or_else(|| MapError::TechniqueNotFound(course.to_string()))
}

pub fn course_names<M: ModelAccess + ?Sized>(model: &M, zone: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = courses_in(model, zone)?
        .into_iter()
        .filter_map(|c| model.name(c).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

pub fn property_set_names<M: ModelAccess + ?Sized>(model: &M, zone: &str, course: &str) -> Result<Vec<String>> {
    let course = resolve_course(model, zone, course)?;
    let mut names: Vec<String> = model
        .property_definitions(course)
        .unwrap_or_default()
        .iter()
        .filter_map(|&pset| model.property_set_name(pset).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

/// Current value of `edit.name` in `edit.pset`; `edit.value` is ignored.
pub fn read_property<M: ModelAccess + ?Sized>(model: &M, edit: &PropertyEdit) -> Result<Option<PropertyValue>> {
    let course = resolve_course(model, &edit.zone, &edit.course)?;
    Ok(get_property(model, course, &edit.pset, &edit.name))
}

/// Add or overwrite one property; returns the property entity.
pub fn apply_edit<M: ModelAccess + ?Sized>(model: &mut M, edit: &PropertyEdit) -> Result<EntityId> {
    edit.validate()?;
    let course = resolve_course(&*model, &edit.zone, &edit.course)?;
    let existed = find_property_set(&*model, course, &edit.pset).is_some();
    let prop = add_property(model, course, &edit.pset, &edit.name, &edit.value)?;
    tracing::info!(
        zone = %edit.zone,
        course = %edit.course,
        pset = %edit.pset,
        name = %edit.name,
        value = %edit.value,
        new_pset = !existed,
        "property set"
    );
    Ok(prop)
}
