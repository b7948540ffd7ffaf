//! The mapping run: load → index → map every zone → save.
//!
//! A run executes entirely on the calling thread (normally the worker spawned
//! by [`spawn_mapping`]); the front end only sees [`RunEvent`]s.
//!
//! [`RunEvent`]: crate::events::RunEvent

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{InputKind, MapError, Result};
use crate::events::{CancelToken, EventSink, Reporter};
use crate::matching::{match_zone, ZoneMatch};
use crate::model::{IfcModel, ModelAccess};
use crate::table::Table;
use crate::walker::{find_zones, zone_index};
use crate::ZONE_COLUMN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    Idle,
    Loading,
    Indexing,
    MappingZones,
    Saving,
    Completed,
    Cancelled,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Idle => "idle",
            RunState::Loading => "loading",
            RunState::Indexing => "indexing",
            RunState::MappingZones => "mapping zones",
            RunState::Saving => "saving",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub model_path: PathBuf,
    pub sheet_path: PathBuf,
    pub output_path: PathBuf,
    /// Reported back in the `Finished` event.
    pub log_path: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(
        model_path: impl Into<PathBuf>,
        sheet_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            sheet_path: sheet_path.into(),
            output_path: output_path.into(),
            log_path: None,
        }
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(log_path.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            (&self.model_path, InputKind::Model),
            (&self.sheet_path, InputKind::Spreadsheet),
            (&self.output_path, InputKind::Output),
        ];
        for (path, kind) in checks {
            if path.as_os_str().is_empty() {
                return Err(MapError::MissingPath(kind));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Zones found in the model, duplicates included.
    pub total_zones: usize,
    pub unique_zones: Vec<String>,
    pub sheet_groups: usize,
    pub sheet_rows: usize,
    /// One entry per processed zone, in processing order.
    pub zones: Vec<ZoneMatch>,
    pub updated_courses: usize,
    /// Set once the output file has been written.
    pub output_path: Option<PathBuf>,
    pub state: RunState,
    pub elapsed: Duration,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            total_zones: 0,
            unique_zones: Vec::new(),
            sheet_groups: 0,
            sheet_rows: 0,
            zones: Vec::new(),
            updated_courses: 0,
            output_path: None,
            state: RunState::Idle,
            elapsed: Duration::ZERO,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Drives one mapping run and keeps the loaded model afterwards.
#[derive(Debug)]
pub struct RunController {
    state: RunState,
    model: Option<IfcModel>,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            model: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// The model as left by the last run, including after cancellation or a
    /// failed save.
    pub fn model(&self) -> Option<&IfcModel> {
        self.model.as_ref()
    }

    pub fn into_model(self) -> Option<IfcModel> {
        self.model
    }

    pub fn run(
        &mut self,
        request: &RunRequest,
        sink: &dyn EventSink,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        request.validate()?;

        let Self { state, model: slot } = self;
        *slot = None;
        let mut run = RunContext {
            state,
            reporter: Reporter::new(sink),
            request,
            started: Instant::now(),
        };
        let mut summary = RunSummary::new();

        run.enter(RunState::Loading);
        tracing::info!(
            model = %request.model_path.display(),
            sheet = %request.sheet_path.display(),
            output = %request.output_path.display(),
            "mapping started at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if !request.model_path.exists() {
            let err = MapError::InputNotFound(InputKind::Model, request.model_path.clone());
            return Err(run.fail(err));
        }
        if !request.sheet_path.exists() {
            let err = MapError::InputNotFound(InputKind::Spreadsheet, request.sheet_path.clone());
            return Err(run.fail(err));
        }

        run.reporter.status("Loading IFC and Excel files...");
        let model = match IfcModel::open(&request.model_path) {
            Ok(model) => slot.insert(model),
            Err(err) => return Err(run.fail(err)),
        };
        run.reporter.status(format!(
            "Successfully loaded IFC file: {}",
            file_name(&request.model_path)
        ));

        let table = match Table::open(&request.sheet_path) {
            Ok(table) => table,
            Err(err) => return Err(run.fail(err)),
        };
        run.reporter.status(format!(
            "Successfully loaded Excel file: {}",
            file_name(&request.sheet_path)
        ));

        if cancel.is_cancelled() {
            return Ok(run.cancelled("Mapping cancelled before processing started.", summary));
        }

        run.enter(RunState::Indexing);
        let zones = find_zones(&*model);
        let total_zones = zones.len();
        summary.total_zones = total_zones;
        run.reporter.status(format!(
            "Found {total_zones} zones (IfcRoadPart with ROADSEGMENT and BaselineRegion)"
        ));
        if zones.is_empty() {
            run.reporter.warn("Warning: No matching IfcRoadPart elements found.");
        }
        let index = zone_index(&*model, &zones);
        summary.unique_zones = index.keys().cloned().collect();
        run.reporter.status(format!("Found {} unique zone names", index.len()));
        tracing::info!(zones = %summary.unique_zones.join(", "), "unique zone names");

        run.reporter.status("Starting data mapping process...");
        let groups = table.group_by(ZONE_COLUMN);
        summary.sheet_groups = groups.len();
        summary.sheet_rows = table.rows.len();
        run.reporter.status(format!(
            "Found {} zones in Excel with {} total rows",
            groups.len(),
            table.rows.len()
        ));
        for (zone, rows) in &groups {
            if index.contains_key(zone) {
                tracing::info!(zone = %zone, rows = rows.len(), "zone has spreadsheet rows");
            }
        }

        run.enter(RunState::MappingZones);
        let mut processed_names = HashSet::new();
        let mut processed = 0usize;

        for (zone_name, rows) in &groups {
            if cancel.is_cancelled() {
                return Ok(run.cancelled("Mapping cancelled during processing.", summary));
            }
            if zone_name.is_empty() {
                tracing::info!("skipping empty ZONE value");
                continue;
            }
            let Some(&region) = index.get(zone_name) else {
                tracing::info!(zone = %zone_name, "no IfcRoadPart found matching ZONE");
                continue;
            };
            if !processed_names.insert(zone_name.as_str()) {
                continue;
            }

            processed += 1;
            run.reporter.status(format!(
                "Processing zone {processed}/{total_zones}: '{}'",
                model.name(region).unwrap_or("N/A")
            ));
            tracing::info!(
                zone = %zone_name,
                global_id = model.global_id(region).unwrap_or("N/A"),
                "processing zone"
            );

            let result = match match_zone(model, zone_name, region, rows, &run.reporter, cancel) {
                Ok(result) => result,
                Err(err) => return Err(run.fail(err)),
            };
            summary.updated_courses += result.matches;

            if result.cancelled {
                summary.zones.push(result);
                let message =
                    format!("Mapping cancelled during zone {processed}/{total_zones}: '{zone_name}'");
                return Ok(run.cancelled(&message, summary));
            }

            run.reporter.status(format!(
                "Completed zone {processed}/{total_zones}: '{zone_name}' with {} matches in {:.2} seconds",
                result.matches,
                result.elapsed.as_secs_f64()
            ));
            summary.zones.push(result);
            run.reporter.progress(processed, total_zones);
        }

        if cancel.is_cancelled() {
            return Ok(run.cancelled("Mapping cancelled before saving.", summary));
        }

        // Past this point cancellation no longer stops the write.
        run.enter(RunState::Saving);
        run.reporter.status("Saving file...");
        if let Err(err) = model.save(&request.output_path) {
            return Err(run.fail(err));
        }
        summary.output_path = Some(request.output_path.clone());
        run.reporter.status(format!(
            "Successfully updated {} IfcCourse elements. Saved as {}",
            summary.updated_courses,
            request.output_path.display()
        ));

        run.enter(RunState::Completed);
        summary.state = RunState::Completed;
        summary.elapsed = run.started.elapsed();
        run.reporter.status(format!(
            "Total runtime: {:.2} seconds",
            summary.elapsed.as_secs_f64()
        ));
        run.reporter
            .finished(RunState::Completed, request.log_path.clone());
        Ok(summary)
    }
}

/// Per-run bookkeeping, split from the model slot so both can be borrowed at once.
struct RunContext<'a> {
    state: &'a mut RunState,
    reporter: Reporter<'a>,
    request: &'a RunRequest,
    started: Instant,
}

impl RunContext<'_> {
    fn enter(&mut self, state: RunState) {
        tracing::debug!(from = %self.state, to = %state, "run state");
        *self.state = state;
    }

    /// Fatal error: report it, emit `Finished { Failed }` and hand it back.
    fn fail(&mut self, err: MapError) -> MapError {
        self.enter(RunState::Failed);
        self.reporter.error(format!("Error: {err}"));
        self.reporter
            .finished(RunState::Failed, self.request.log_path.clone());
        err
    }

    fn cancelled(&mut self, message: &str, mut summary: RunSummary) -> RunSummary {
        self.enter(RunState::Cancelled);
        self.reporter.status(message);
        summary.state = RunState::Cancelled;
        summary.elapsed = self.started.elapsed();
        self.reporter
            .finished(RunState::Cancelled, self.request.log_path.clone());
        summary
    }
}

/// Run one mapping on the current thread.
pub fn run_mapping(request: &RunRequest, sink: &dyn EventSink, cancel: &CancelToken) -> Result<RunSummary> {
    RunController::new().run(request, sink, cancel)
}

/// Run one mapping on a named worker thread.
pub fn spawn_mapping<S>(
    request: RunRequest,
    sink: S,
    cancel: CancelToken,
) -> std::io::Result<JoinHandle<Result<RunSummary>>>
where
    S: EventSink + Send + 'static,
{
    std::thread::Builder::new()
        .name("pavemap-worker".to_string())
        .spawn(move || run_mapping(&request, &sink, &cancel))
}
