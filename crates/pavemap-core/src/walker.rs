//! Zone and course discovery over the decomposition hierarchy.
//!
//! Layout expected in road models exported from corridor tools:
//!
//! ```text
//! IfcRoad ─aggregates→ baseline (IfcRoadPart | IfcElementAssembly)
//!        ─aggregates / contains→ region (zone: ROADSEGMENT + BaselineRegion)
//!        ─...→ IfcPavement / IfcRoadPart / IfcElement ─...→ IfcCourse
//! ```

use std::collections::{BTreeMap, HashSet};

use pavemap_step::EntityId;

use crate::error::ModelError;
use crate::events::CancelToken;
use crate::model::ModelAccess;
use crate::schema::ElementKind;
use crate::{ZONE_OBJECT_TYPE, ZONE_PREDEFINED_TYPE};

/// Top-level facilities: every `IfcRoad`, or every `IfcFacility` when the
/// model has no road.
pub fn find_corridors<M: ModelAccess + ?Sized>(model: &M) -> Vec<EntityId> {
    let roads = model.by_type("IfcRoad");
    if roads.is_empty() {
        model.by_type("IfcFacility")
    } else {
        roads
    }
}

pub fn is_zone<M: ModelAccess + ?Sized>(model: &M, id: EntityId) -> bool {
    model.kind(id) == ElementKind::RoadPart
        && model.predefined_type(id) == Some(ZONE_PREDEFINED_TYPE)
        && model.object_type(id) == Some(ZONE_OBJECT_TYPE)
}

/// Zones two levels below each corridor. A region reachable through both
/// decomposition and containment is listed once per path.
pub fn find_zones<M: ModelAccess + ?Sized>(model: &M) -> Vec<EntityId> {
    let mut zones = Vec::new();
    let corridors = find_corridors(model);
    if corridors.is_empty() {
        tracing::warn!("no IfcRoad or IfcFacility found in model");
    }

    for corridor in corridors {
        tracing::debug!(
            corridor = %corridor,
            name = model.name(corridor).unwrap_or("N/A"),
            "found corridor"
        );
        for &baseline in model.decomposed_by(corridor).unwrap_or_default() {
            if !matches!(
                model.kind(baseline),
                ElementKind::RoadPart | ElementKind::ElementAssembly
            ) {
                continue;
            }
            tracing::debug!(
                baseline = %baseline,
                name = model.name(baseline).unwrap_or("N/A"),
                "found baseline"
            );
            let regions = model
                .decomposed_by(baseline)
                .unwrap_or_default()
                .iter()
                .chain(model.contained_elements(baseline).unwrap_or_default());
            zones.extend(regions.copied().filter(|&region| is_zone(model, region)));
        }
    }
    zones
}

fn zone_key<M: ModelAccess + ?Sized>(model: &M, zone: EntityId) -> Option<String> {
    let name = model.name(zone)?.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Trimmed zone name → zone. Nameless zones are skipped; on duplicate names
/// the last zone wins.
pub fn zone_index<M: ModelAccess + ?Sized>(model: &M, zones: &[EntityId]) -> BTreeMap<String, EntityId> {
    let mut index = BTreeMap::new();
    for &zone in zones {
        if let Some(key) = zone_key(model, zone) {
            if let Some(previous) = index.insert(key.clone(), zone) {
                tracing::debug!(zone = %key, %previous, replaced_by = %zone, "duplicate zone name");
            }
        }
    }
    index
}

/// First zone whose trimmed name equals `name`.
pub fn find_zone<M: ModelAccess + ?Sized>(model: &M, name: &str) -> Option<EntityId> {
    let name = name.trim();
    find_zones(model)
        .into_iter()
        .find(|&zone| zone_key(model, zone).as_deref() == Some(name))
}

/// Every course below `element`, in traversal order (decomposition children
/// first, then contained elements). Returns what was collected so far once
/// `cancel` is set.
///
/// An element shared by two parents is walked once per parent; an element
/// that reaches itself again is reported as [`ModelError::Cycle`].
pub fn find_courses_under<M: ModelAccess + ?Sized>(
    model: &M,
    element: EntityId,
    cancel: &CancelToken,
) -> Result<Vec<EntityId>, ModelError> {
    let mut courses = Vec::new();
    let mut path = HashSet::from([element]);
    collect_courses(model, element, cancel, &mut path, &mut courses)?;
    Ok(courses)
}

fn collect_courses<M: ModelAccess + ?Sized>(
    model: &M,
    element: EntityId,
    cancel: &CancelToken,
    path: &mut HashSet<EntityId>,
    out: &mut Vec<EntityId>,
) -> Result<(), ModelError> {
    if cancel.is_cancelled() {
        return Ok(());
    }
    let children = model
        .decomposed_by(element)
        .unwrap_or_default()
        .iter()
        .chain(model.contained_elements(element).unwrap_or_default());

    for &child in children {
        match model.kind(child) {
            ElementKind::Course => out.push(child),
            ElementKind::Pavement
            | ElementKind::RoadPart
            | ElementKind::ElementAssembly
            | ElementKind::Element => {
                if !path.insert(child) {
                    return Err(ModelError::Cycle(child));
                }
                collect_courses(model, child, cancel, path, out)?;
                path.remove(&child);
            }
            ElementKind::Facility | ElementKind::Other => {}
        }
    }
    Ok(())
}
