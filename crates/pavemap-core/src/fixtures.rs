//! In-memory road models for unit tests.

use pavemap_step::{new_global_id, EntityId, StepFile, StepValue};

use crate::model::IfcModel;
use crate::schema;

pub struct ModelBuilder {
    file: StepFile,
    owner_history: EntityId,
}

fn e(name: &str) -> StepValue {
    StepValue::Enum(name.to_string())
}

fn opt_text(value: &str) -> StepValue {
    if value.is_empty() {
        StepValue::Null
    } else {
        StepValue::text(value)
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        let mut file = StepFile::new("IFC4X3_ADD2");
        let owner_history = file.add(
            "IFCOWNERHISTORY",
            vec![
                StepValue::Null,
                StepValue::Null,
                StepValue::Null,
                e("NOCHANGE"),
                StepValue::Null,
                StepValue::Null,
                StepValue::Null,
                StepValue::Int(0),
            ],
        );
        Self { file, owner_history }
    }

    pub fn owner_history(&self) -> EntityId {
        self.owner_history
    }

    fn root(&self, name: &str, object_type: &str) -> Vec<StepValue> {
        vec![
            StepValue::text(new_global_id()),
            StepValue::Ref(self.owner_history),
            opt_text(name),
            StepValue::Null,
            opt_text(object_type),
            StepValue::Null,
            StepValue::Null,
        ]
    }

    pub fn road(&mut self, name: &str) -> EntityId {
        let mut args = self.root(name, "");
        args.extend([StepValue::Null, e("ELEMENT"), e("NOTDEFINED")]);
        self.file.add("IFCROAD", args)
    }

    pub fn facility(&mut self, name: &str) -> EntityId {
        let mut args = self.root(name, "");
        args.extend([StepValue::Null, e("ELEMENT")]);
        self.file.add("IFCFACILITY", args)
    }

    pub fn road_part(&mut self, name: &str, predefined: &str, object_type: &str) -> EntityId {
        let mut args = self.root(name, object_type);
        args.extend([StepValue::Null, e("ELEMENT"), e("LONGITUDINAL"), e(predefined)]);
        self.file.add("IFCROADPART", args)
    }

    /// A road part satisfying the zone predicate.
    pub fn zone(&mut self, name: &str) -> EntityId {
        self.road_part(name, crate::ZONE_PREDEFINED_TYPE, crate::ZONE_OBJECT_TYPE)
    }

    pub fn assembly(&mut self, name: &str) -> EntityId {
        let mut args = self.root(name, "");
        args.extend([StepValue::Null, e("NOTDEFINED"), e("NOTDEFINED")]);
        self.file.add("IFCELEMENTASSEMBLY", args)
    }

    pub fn element(&mut self, type_name: &str, name: &str) -> EntityId {
        let mut args = self.root(name, "");
        args.extend([StepValue::Null, e("NOTDEFINED")]);
        self.file.add(type_name, args)
    }

    pub fn pavement(&mut self, name: &str) -> EntityId {
        self.element("IFCPAVEMENT", name)
    }

    pub fn course(&mut self, name: &str) -> EntityId {
        self.element("IFCCOURSE", name)
    }

    pub fn kerb(&mut self, name: &str) -> EntityId {
        self.element("IFCKERB", name)
    }

    pub fn alignment(&mut self, name: &str) -> EntityId {
        let args = self.root(name, "");
        self.file.add("IFCALIGNMENT", args)
    }

    pub fn aggregate(&mut self, whole: EntityId, parts: &[EntityId]) -> EntityId {
        let related = parts.iter().copied().map(StepValue::Ref).collect();
        self.file.add(
            schema::REL_AGGREGATES,
            vec![
                StepValue::text(new_global_id()),
                StepValue::Ref(self.owner_history),
                StepValue::Null,
                StepValue::Null,
                StepValue::Ref(whole),
                StepValue::List(related),
            ],
        )
    }

    pub fn contain(&mut self, structure: EntityId, elements: &[EntityId]) -> EntityId {
        let related = elements.iter().copied().map(StepValue::Ref).collect();
        self.file.add(
            schema::REL_CONTAINED,
            vec![
                StepValue::text(new_global_id()),
                StepValue::Ref(self.owner_history),
                StepValue::Null,
                StepValue::Null,
                StepValue::List(related),
                StepValue::Ref(structure),
            ],
        )
    }

    /// Attach a property set holding text properties.
    pub fn property_set(&mut self, owner: EntityId, name: &str, props: &[(&str, &str)]) -> EntityId {
        let mut refs = Vec::new();
        for (prop, value) in props {
            let id = self.file.add(
                schema::PROPERTY_SINGLE_VALUE,
                vec![
                    StepValue::text(*prop),
                    StepValue::Null,
                    StepValue::typed("IFCLABEL", StepValue::text(*value)),
                    StepValue::Null,
                ],
            );
            refs.push(StepValue::Ref(id));
        }
        let pset = self.file.add(
            schema::PROPERTY_SET,
            vec![
                StepValue::text(new_global_id()),
                StepValue::Ref(self.owner_history),
                StepValue::text(name),
                StepValue::Null,
                StepValue::List(refs),
            ],
        );
        self.file.add(
            schema::REL_DEFINES_BY_PROPERTIES,
            vec![
                StepValue::text(new_global_id()),
                StepValue::Ref(self.owner_history),
                StepValue::Null,
                StepValue::Null,
                StepValue::List(vec![StepValue::Ref(owner)]),
                StepValue::Ref(pset),
            ],
        );
        pset
    }

    pub fn code_name(&mut self, course: EntityId, value: &str) -> EntityId {
        self.property_set(
            course,
            crate::CODE_NAME_PSET,
            &[(crate::CODE_NAME_PROPERTY, value)],
        )
    }

    pub fn build(self) -> IfcModel {
        IfcModel::from_step(self.file)
    }
}
