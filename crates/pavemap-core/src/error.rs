use std::fmt;
use std::path::PathBuf;

use pavemap_step::EntityId;
use thiserror::Error;

/// Which of the run's files an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Model,
    Spreadsheet,
    Output,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Model => "IFC",
            InputKind::Spreadsheet => "Excel",
            InputKind::Output => "output",
        })
    }
}

/// Structural problems hit while mutating the model graph.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity {0} does not exist")]
    UnknownEntity(EntityId),

    #[error("entity {id} is {found}, expected {expected}")]
    WrongType {
        id: EntityId,
        expected: &'static str,
        found: String,
    },

    #[error("entity {0} is part of its own decomposition")]
    Cycle(EntityId),
}

#[derive(Debug, Error)]
pub enum MapError {
    /// Run request rejected before anything was touched.
    #[error("no {0} path given")]
    MissingPath(InputKind),

    #[error("{0} file not found at {}", .1.display())]
    InputNotFound(InputKind, PathBuf),

    #[error("error loading {input} file {}: {message}", .path.display())]
    Load {
        input: InputKind,
        path: PathBuf,
        message: String,
    },

    #[error("error saving updated IFC file {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },

    #[error("zone '{0}' not found")]
    ZoneNotFound(String),

    #[error("technique '{0}' not found")]
    TechniqueNotFound(String),

    #[error("field `{0}` must not be empty")]
    MissingField(&'static str),

    #[error("configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl MapError {
    /// Recoverable errors leave the model untouched and only need a message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MapError::ZoneNotFound(_) | MapError::TechniqueNotFound(_) | MapError::MissingField(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
