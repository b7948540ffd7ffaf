//! Capability interface over the model graph, and its IFC implementation.
//!
//! Traversal code only ever asks "does this element have children through
//! relation X" and gets `None` when it does not, so nothing reads the
//! underlying STEP records directly.

use std::collections::HashMap;
use std::path::Path;

use pavemap_step::{new_global_id, EntityId, StepEntity, StepFile, StepValue};

use crate::error::{InputKind, MapError, ModelError};
use crate::schema::{self, ElementKind};

/// Narrow read/attach contract the mapping engine works against.
pub trait ModelAccess {
    /// Instances of `type_name`, subtypes included.
    fn by_type(&self, type_name: &str) -> Vec<EntityId>;

    fn kind(&self, id: EntityId) -> ElementKind;
    fn name(&self, id: EntityId) -> Option<&str>;
    fn global_id(&self, id: EntityId) -> Option<&str>;
    fn predefined_type(&self, id: EntityId) -> Option<&str>;
    fn object_type(&self, id: EntityId) -> Option<&str>;

    /// Parts reached through whole/part decomposition.
    fn decomposed_by(&self, id: EntityId) -> Option<&[EntityId]>;
    /// Elements held through spatial containment.
    fn contained_elements(&self, id: EntityId) -> Option<&[EntityId]>;
    /// Property definitions attached to the element.
    fn property_definitions(&self, id: EntityId) -> Option<&[EntityId]>;

    /// Name of a property set; `None` when `pset` is not a property set.
    fn property_set_name(&self, pset: EntityId) -> Option<&str>;
    fn properties(&self, pset: EntityId) -> Vec<EntityId>;
    fn property_name(&self, prop: EntityId) -> Option<&str>;
    /// Unwrapped nominal value of a single-value property.
    fn property_value(&self, prop: EntityId) -> Option<String>;

    /// New empty property set attached to `owner`.
    fn create_property_set(&mut self, owner: EntityId, name: &str) -> Result<EntityId, ModelError>;
    fn clear_properties(&mut self, pset: EntityId) -> Result<(), ModelError>;
    fn append_text_property(
        &mut self,
        pset: EntityId,
        name: &str,
        value: &str,
    ) -> Result<EntityId, ModelError>;
    fn set_text_value(&mut self, prop: EntityId, value: &str) -> Result<(), ModelError>;
}

/// An IFC exchange file with inverse relation indexes.
#[derive(Debug, Clone)]
pub struct IfcModel {
    file: StepFile,
    decomposition: HashMap<EntityId, Vec<EntityId>>,
    containment: HashMap<EntityId, Vec<EntityId>>,
    definitions: HashMap<EntityId, Vec<EntityId>>,
}

impl IfcModel {
    pub fn open(path: &Path) -> Result<Self, MapError> {
        let file = StepFile::read(path).map_err(|err| MapError::Load {
            input: InputKind::Model,
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), entities = file.len(), "parsed STEP file");
        Ok(Self::from_step(file))
    }

    pub fn from_step(file: StepFile) -> Self {
        let mut model = Self {
            file,
            decomposition: HashMap::new(),
            containment: HashMap::new(),
            definitions: HashMap::new(),
        };
        model.index_relations();
        model
    }

    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        self.file.write(path).map_err(|err| MapError::Save {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn step(&self) -> &StepFile {
        &self.file
    }

    pub fn into_step(self) -> StepFile {
        self.file
    }

    fn index_relations(&mut self) {
        for entity in self.file.iter() {
            if entity.is_type(schema::REL_AGGREGATES) {
                if let Some(whole) = entity.arg(schema::AGGREGATES_RELATING).and_then(StepValue::as_ref_id) {
                    let parts = entity
                        .arg(schema::AGGREGATES_RELATED)
                        .map(StepValue::refs)
                        .unwrap_or_default();
                    self.decomposition.entry(whole).or_default().extend(parts);
                }
            } else if entity.is_type(schema::REL_CONTAINED) {
                if let Some(structure) = entity.arg(schema::CONTAINED_RELATING).and_then(StepValue::as_ref_id) {
                    let elements = entity
                        .arg(schema::CONTAINED_RELATED)
                        .map(StepValue::refs)
                        .unwrap_or_default();
                    self.containment.entry(structure).or_default().extend(elements);
                }
            } else if entity.is_type(schema::REL_DEFINES_BY_PROPERTIES) {
                if let Some(definition) = entity.arg(schema::DEFINES_RELATING).and_then(StepValue::as_ref_id) {
                    for object in entity.arg(schema::DEFINES_RELATED).map(StepValue::refs).unwrap_or_default() {
                        self.definitions.entry(object).or_default().push(definition);
                    }
                }
            }
        }
    }

    fn entity(&self, id: EntityId) -> Option<&StepEntity> {
        self.file.get(id)
    }

    fn str_attr(&self, id: EntityId, index: usize) -> Option<&str> {
        self.entity(id)?.arg(index)?.as_str()
    }

    fn expect_type(&self, id: EntityId, expected: &'static str) -> Result<(), ModelError> {
        let entity = self.entity(id).ok_or(ModelError::UnknownEntity(id))?;
        if entity.is_type(expected) {
            Ok(())
        } else {
            Err(ModelError::WrongType {
                id,
                expected,
                found: entity.type_name.clone(),
            })
        }
    }
}

fn scalar_text(value: &StepValue) -> Option<String> {
    match value {
        StepValue::Typed(_, inner) => scalar_text(inner),
        StepValue::Str(s) | StepValue::Enum(s) => Some(s.clone()),
        StepValue::Int(n) => Some(n.to_string()),
        StepValue::Real(r) => Some(r.to_string()),
        StepValue::Bool(true) => Some("True".to_string()),
        StepValue::Bool(false) => Some("False".to_string()),
        _ => None,
    }
}

impl ModelAccess for IfcModel {
    fn by_type(&self, type_name: &str) -> Vec<EntityId> {
        self.file
            .iter()
            .filter(|e| !e.is_complex() && schema::is_a(&e.type_name, type_name))
            .map(|e| e.id)
            .collect()
    }

    fn kind(&self, id: EntityId) -> ElementKind {
        self.entity(id)
            .map_or(ElementKind::Other, |e| ElementKind::classify(&e.type_name))
    }

    fn name(&self, id: EntityId) -> Option<&str> {
        self.str_attr(id, schema::ATTR_NAME)
    }

    fn global_id(&self, id: EntityId) -> Option<&str> {
        self.str_attr(id, schema::ATTR_GLOBAL_ID)
    }

    // IFC declares PredefinedType as the last attribute of every product type that has one.
    fn predefined_type(&self, id: EntityId) -> Option<&str> {
        self.entity(id)?.args.last()?.as_enum()
    }

    fn object_type(&self, id: EntityId) -> Option<&str> {
        self.str_attr(id, schema::ATTR_OBJECT_TYPE)
    }

    fn decomposed_by(&self, id: EntityId) -> Option<&[EntityId]> {
        self.decomposition.get(&id).map(Vec::as_slice)
    }

    fn contained_elements(&self, id: EntityId) -> Option<&[EntityId]> {
        self.containment.get(&id).map(Vec::as_slice)
    }

    fn property_definitions(&self, id: EntityId) -> Option<&[EntityId]> {
        self.definitions.get(&id).map(Vec::as_slice)
    }

    fn property_set_name(&self, pset: EntityId) -> Option<&str> {
        let entity = self.entity(pset)?;
        if !entity.is_type(schema::PROPERTY_SET) {
            return None;
        }
        entity.arg(schema::ATTR_NAME)?.as_str()
    }

    fn properties(&self, pset: EntityId) -> Vec<EntityId> {
        self.entity(pset)
            .and_then(|e| e.arg(schema::PSET_HAS_PROPERTIES))
            .map(StepValue::refs)
            .unwrap_or_default()
    }

    fn property_name(&self, prop: EntityId) -> Option<&str> {
        self.str_attr(prop, schema::PROP_NAME)
    }

    fn property_value(&self, prop: EntityId) -> Option<String> {
        let entity = self.entity(prop)?;
        if !entity.is_type(schema::PROPERTY_SINGLE_VALUE) {
            return None;
        }
        scalar_text(entity.arg(schema::PROP_NOMINAL_VALUE)?)
    }

    fn create_property_set(&mut self, owner: EntityId, name: &str) -> Result<EntityId, ModelError> {
        let owner_history = self
            .entity(owner)
            .ok_or(ModelError::UnknownEntity(owner))?
            .arg(schema::ATTR_OWNER_HISTORY)
            .cloned()
            .unwrap_or(StepValue::Null);

        let pset = self.file.add(
            schema::PROPERTY_SET,
            vec![
                StepValue::text(new_global_id()),
                owner_history.clone(),
                StepValue::text(name),
                StepValue::Null,
                StepValue::List(Vec::new()),
            ],
        );
        self.file.add(
            schema::REL_DEFINES_BY_PROPERTIES,
            vec![
                StepValue::text(new_global_id()),
                owner_history,
                StepValue::Null,
                StepValue::Null,
                StepValue::List(vec![StepValue::Ref(owner)]),
                StepValue::Ref(pset),
            ],
        );
        self.definitions.entry(owner).or_default().push(pset);
        Ok(pset)
    }

    fn clear_properties(&mut self, pset: EntityId) -> Result<(), ModelError> {
        self.expect_type(pset, schema::PROPERTY_SET)?;
        let entity = self.file.get_mut(pset).ok_or(ModelError::UnknownEntity(pset))?;
        set_arg(entity, schema::PSET_HAS_PROPERTIES, StepValue::List(Vec::new()));
        Ok(())
    }

    fn append_text_property(
        &mut self,
        pset: EntityId,
        name: &str,
        value: &str,
    ) -> Result<EntityId, ModelError> {
        self.expect_type(pset, schema::PROPERTY_SET)?;
        let prop = self.file.add(
            schema::PROPERTY_SINGLE_VALUE,
            vec![
                StepValue::text(name),
                StepValue::Null,
                StepValue::typed(schema::TEXT_TYPE, StepValue::text(value)),
                StepValue::Null,
            ],
        );

        let entity = self.file.get_mut(pset).ok_or(ModelError::UnknownEntity(pset))?;
        match entity.args.get_mut(schema::PSET_HAS_PROPERTIES) {
            Some(StepValue::List(items)) => items.push(StepValue::Ref(prop)),
            _ => set_arg(
                entity,
                schema::PSET_HAS_PROPERTIES,
                StepValue::List(vec![StepValue::Ref(prop)]),
            ),
        }
        Ok(prop)
    }

    fn set_text_value(&mut self, prop: EntityId, value: &str) -> Result<(), ModelError> {
        self.expect_type(prop, schema::PROPERTY_SINGLE_VALUE)?;
        let entity = self.file.get_mut(prop).ok_or(ModelError::UnknownEntity(prop))?;
        set_arg(
            entity,
            schema::PROP_NOMINAL_VALUE,
            StepValue::typed(schema::TEXT_TYPE, StepValue::text(value)),
        );
        Ok(())
    }
}

/// Overwrite attribute `index`, padding short records with `$`.
fn set_arg(entity: &mut StepEntity, index: usize, value: StepValue) {
    if entity.args.len() <= index {
        entity.args.resize(index + 1, StepValue::Null);
    }
    entity.args[index] = value;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ModelBuilder;

    #[test]
    fn relation_indexes_are_built_on_load() {
        let mut b = ModelBuilder::new();
        let road = b.road("Road");
        let part = b.road_part("Z1", "ROADSEGMENT", "BaselineRegion");
        let course = b.course("Course 1");
        b.aggregate(road, &[part]);
        b.contain(part, &[course]);
        b.code_name(course, "Tech A - 5");
        let model = b.build();

        assert_eq!(model.decomposed_by(road), Some(&[part][..]));
        assert_eq!(model.contained_elements(part), Some(&[course][..]));
        assert_eq!(model.decomposed_by(course), None);
        assert_eq!(model.property_definitions(course).map(<[_]>::len), Some(1));
        assert_eq!(model.by_type("IfcFacility"), vec![road]);
    }

    #[test]
    fn reads_root_attributes() {
        let mut b = ModelBuilder::new();
        let part = b.road_part("Z1", "ROADSEGMENT", "BaselineRegion");
        let model = b.build();

        assert_eq!(model.kind(part), ElementKind::RoadPart);
        assert_eq!(model.name(part), Some("Z1"));
        assert_eq!(model.predefined_type(part), Some("ROADSEGMENT"));
        assert_eq!(model.object_type(part), Some("BaselineRegion"));
        assert_eq!(model.global_id(part).map(str::len), Some(22));
    }

    #[test]
    fn created_property_set_is_attached_and_indexed() {
        let mut b = ModelBuilder::new();
        let course = b.course("Course 1");
        let mut model = b.build();

        let pset = model.create_property_set(course, "Excel Layer Info").unwrap();
        assert_eq!(model.property_set_name(pset), Some("Excel Layer Info"));
        assert_eq!(model.property_definitions(course), Some(&[pset][..]));

        let prop = model.append_text_property(pset, "PR_1", "foo").unwrap();
        assert_eq!(model.properties(pset), vec![prop]);
        assert_eq!(model.property_value(prop).as_deref(), Some("foo"));

        // The attachment survives a save/reload cycle.
        let reloaded = IfcModel::from_step(model.step().clone());
        assert_eq!(reloaded.property_definitions(course), Some(&[pset][..]));
    }

    #[test]
    fn mutations_check_entity_types() {
        let mut b = ModelBuilder::new();
        let course = b.course("Course 1");
        let mut model = b.build();

        assert!(matches!(
            model.clear_properties(course),
            Err(ModelError::WrongType { .. })
        ));
        assert!(matches!(
            model.create_property_set(EntityId(9999), "x"),
            Err(ModelError::UnknownEntity(EntityId(9999)))
        ));
    }
}
