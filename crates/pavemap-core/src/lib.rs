//! pavemap core: spreadsheet-to-IFC property mapping
//!
//! Spreadsheet rows describing paving layers are joined onto the `IfcCourse`
//! elements of a road model:
//! - zones (`IfcRoadPart` baseline regions) are discovered through the
//!   spatial decomposition hierarchy ([`walker`])
//! - each course is keyed by the normalized `(technique, surface)` pair parsed
//!   from its `CodeName` ([`normalize`], [`matching`])
//! - matched rows are written into the course's `Excel Layer Info` property
//!   set ([`properties`])
//!
//! [`controller`] drives a whole run on a worker thread and reports through
//! [`events`]; [`editor`] covers one-off manual edits.

pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod events;
pub mod matching;
pub mod model;
pub mod normalize;
pub mod properties;
pub mod schema;
pub mod table;
pub mod walker;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::{default_log_path, derive_output_path, MapperConfig};
pub use controller::{run_mapping, spawn_mapping, RunController, RunRequest, RunState, RunSummary};
pub use error::{InputKind, MapError, ModelError, Result};
pub use events::{CancelToken, EventQueue, EventSink, RunEvent};
pub use matching::{CourseKey, Verification, ZoneMatch};
pub use model::{IfcModel, ModelAccess};
pub use normalize::normalize;
pub use pavemap_step::EntityId;
pub use properties::PropertyValue;
pub use table::{Table, TableRow};

/// Spreadsheet column naming the zone a row belongs to.
pub const ZONE_COLUMN: &str = "ZONE";
pub const TECHNIQUE_COLUMN: &str = "TECHNIQUE_";
pub const SURFACE_COLUMN: &str = "SURFACE";

/// Columns copied verbatim into a matched course's property set.
pub const PASSTHROUGH_COLUMNS: [&str; 9] = [
    "PR_1",
    "PR_2",
    "FOND",
    "SURFACE",
    "TYPE_COUCH",
    "CHANTIER",
    "ENTREPRISE",
    "DATE_MS",
    "N°_ORDRE",
];

/// Property set / property holding a course's `"<technique> - <surface>"` descriptor.
pub const CODE_NAME_PSET: &str = "Corridor Shape Information";
pub const CODE_NAME_PROPERTY: &str = "CodeName";

/// Property set receiving the passthrough columns.
pub const TARGET_PSET: &str = "Excel Layer Info";

/// Zone predicate: `IfcRoadPart` with this predefined type and object type.
pub const ZONE_PREDEFINED_TYPE: &str = "ROADSEGMENT";
pub const ZONE_OBJECT_TYPE: &str = "BaselineRegion";
