use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

pub const DEFAULT_OUTPUT_SUFFIX: &str = "mapped";

/// Tunables for a mapping run. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Inserted before the extension of the model path to name the output.
    pub output_suffix: String,
    /// Pending events above which the front end drops status/progress lines.
    pub queue_backlog_limit: usize,
    pub events_per_tick: usize,
    pub tick_interval_ms: u64,
    /// Directory for the run log; the model's directory when unset.
    pub log_dir: Option<PathBuf>,
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_filter: String,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            queue_backlog_limit: 100,
            events_per_tick: 10,
            tick_interval_ms: 50,
            log_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

impl MapperConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_error = |message: String| MapError::Config {
            path: path.to_path_buf(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|err| config_error(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| config_error(err.to_string()))
    }

    pub fn output_path_for(&self, model: &Path) -> PathBuf {
        derive_output_path(model, &self.output_suffix)
    }

    pub fn log_path_for(&self, model: &Path, now: DateTime<Local>) -> PathBuf {
        default_log_path(model, self.log_dir.as_deref(), now)
    }
}

/// `dir/name.ifc` → `dir/name_<suffix>.ifc`. A blank suffix means the default.
pub fn derive_output_path(model: &Path, suffix: &str) -> PathBuf {
    let suffix = match suffix.trim() {
        "" => DEFAULT_OUTPUT_SUFFIX,
        s => s,
    };
    let stem = model
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match model.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    model.with_file_name(file_name)
}

/// `mapping_log_<YYYYmmdd_HHMMSS>.txt` in `log_dir`, or beside the model.
pub fn default_log_path(model: &Path, log_dir: Option<&Path>, now: DateTime<Local>) -> PathBuf {
    let dir = match log_dir {
        Some(dir) => dir.to_path_buf(),
        None => model.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("mapping_log_{}.txt", now.format("%Y%m%d_%H%M%S")))
}
