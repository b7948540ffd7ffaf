//! STEP physical file ingestion for pavemap
//!
//! This crate reads and writes ISO 10303-21 exchange files (the `.ifc`
//! encoding) and keeps the DATA section in an entity store keyed by instance
//! number:
//! - HEADER records are preserved verbatim and written back unchanged
//! - DATA instances are parsed into [`StepValue`] trees (references, strings,
//!   enumerations, typed parameters, nested lists)
//! - complex (multi-type) instances are kept as-is so a file survives a
//!   read/write cycle even when it uses them
//!
//! Schema knowledge (which attribute means what) deliberately lives one layer
//! up, in `pavemap-core`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod encoding;
pub mod guid;
pub mod parser;
pub mod writer;

pub use guid::new_global_id;
pub use parser::parse_step;

// ============================================================================
// STEP value types
// ============================================================================

/// Instance number of a DATA section entity (`#42`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Ref(EntityId),
    /// Decoded string (STEP escapes already resolved).
    Str(String),
    Enum(String),
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Hex payload of a `"..."` binary literal, kept undecoded.
    Binary(String),
    /// `$`
    Null,
    /// `*`
    Omitted,
    List(Vec<StepValue>),
    /// Typed parameter such as `IFCLABEL('x')`.
    Typed(String, Box<StepValue>),
}

impl StepValue {
    pub fn text(s: impl Into<String>) -> Self {
        StepValue::Str(s.into())
    }

    pub fn typed(type_name: impl Into<String>, inner: StepValue) -> Self {
        StepValue::Typed(type_name.into(), Box::new(inner))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            StepValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<EntityId> {
        match self {
            StepValue::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StepValue::Null | StepValue::Omitted)
    }

    /// References contained in a value, in order (descends into lists and typed parameters).
    pub fn refs(&self) -> Vec<EntityId> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs(&self, out: &mut Vec<EntityId>) {
        match self {
            StepValue::Ref(id) => out.push(*id),
            StepValue::List(items) => items.iter().for_each(|v| v.collect_refs(out)),
            StepValue::Typed(_, inner) => inner.collect_refs(out),
            _ => {}
        }
    }
}

/// One DATA section instance.
///
/// Complex instances (`#7=(A() B());`) carry an empty `type_name`; each part
/// is stored as `Typed(part_name, List(args))` in `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: EntityId,
    pub type_name: String,
    pub args: Vec<StepValue>,
}

impl StepEntity {
    pub fn is_type(&self, name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(name)
    }

    pub fn is_complex(&self) -> bool {
        self.type_name.is_empty()
    }

    pub fn arg(&self, index: usize) -> Option<&StepValue> {
        self.args.get(index)
    }
}

/// A HEADER section record such as `FILE_SCHEMA(('IFC4X3_ADD2'));`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub name: String,
    pub args: Vec<StepValue>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StepError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("duplicate entity instance {0}")]
    DuplicateId(EntityId),

    #[error("no DATA section found in STEP file")]
    NoData,

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StepError>;

// ============================================================================
// Entity store
// ============================================================================

/// An in-memory STEP exchange file.
#[derive(Debug, Clone, Default)]
pub struct StepFile {
    pub header: Vec<HeaderRecord>,
    entities: BTreeMap<EntityId, StepEntity>,
}

impl StepFile {
    /// Empty file with a minimal IFC4X3 header.
    pub fn new(schema: &str) -> Self {
        let header = vec![
            HeaderRecord {
                name: "FILE_DESCRIPTION".to_string(),
                args: vec![
                    StepValue::List(vec![StepValue::text("ViewDefinition [ReferenceView]")]),
                    StepValue::text("2;1"),
                ],
            },
            HeaderRecord {
                name: "FILE_NAME".to_string(),
                args: vec![
                    StepValue::text(""),
                    StepValue::text(""),
                    StepValue::List(vec![StepValue::text("")]),
                    StepValue::List(vec![StepValue::text("")]),
                    StepValue::text("pavemap"),
                    StepValue::text("pavemap"),
                    StepValue::text(""),
                ],
            },
            HeaderRecord {
                name: "FILE_SCHEMA".to_string(),
                args: vec![StepValue::List(vec![StepValue::text(schema)])],
            },
        ];
        Self {
            header,
            entities: BTreeMap::new(),
        }
    }

    /// Read and parse a file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read(path).map_err(|source| StepError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_step(&decode_file_bytes(text))
    }

    /// Serialize to `path`, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_step_string()).map_err(|source| StepError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_step_string(&self) -> String {
        writer::write_step(self)
    }

    /// Schema identifiers from `FILE_SCHEMA`, e.g. `["IFC4X3_ADD2"]`.
    pub fn schema_identifiers(&self) -> Vec<String> {
        self.header
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case("FILE_SCHEMA"))
            .and_then(|r| r.args.first())
            .and_then(StepValue::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(StepValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut StepEntity> {
        self.entities.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.values()
    }

    /// Instances whose type name equals `type_name` exactly (case-insensitive).
    pub fn by_type(&self, type_name: &str) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.is_type(type_name))
            .map(|e| e.id)
            .collect()
    }

    /// Next free instance number.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.entities.keys().next_back().map_or(1, |id| id.0 + 1))
    }

    /// Append a new instance and return its id.
    pub fn add(&mut self, type_name: impl Into<String>, args: Vec<StepValue>) -> EntityId {
        let id = self.next_id();
        let type_name: String = type_name.into();
        self.entities.insert(
            id,
            StepEntity {
                id,
                type_name: type_name.to_ascii_uppercase(),
                args,
            },
        );
        id
    }

    /// Insert a fully formed instance (used by the parser).
    pub fn insert(&mut self, entity: StepEntity) -> Result<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(StepError::DuplicateId(entity.id));
        }
        self.entities.insert(entity.id, entity);
        Ok(())
    }
}

/// STEP is nominally ASCII. Stray bytes from sloppy exporters are most often
/// Latin-1, which maps byte-for-byte onto the first Unicode block.
fn decode_file_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

impl std::str::FromStr for StepFile {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self> {
        parse_step(s)
    }
}
