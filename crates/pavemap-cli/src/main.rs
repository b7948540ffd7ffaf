//! pavemap CLI
//!
//! - `run`: map spreadsheet rows onto the courses of an IFC road model
//! - `zones` / `courses` / `psets`: browse what the mapper sees
//! - `get` / `set`: read or write one property by hand

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod edit;
mod logging;
mod run;

#[derive(Parser)]
#[command(name = "pavemap")]
#[command(
    author,
    version,
    about = "Map spreadsheet layer records onto IFC road courses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full mapping and write the updated model.
    ///
    /// Rows are grouped by `ZONE` and matched to courses by the
    /// `(TECHNIQUE_, SURFACE)` pair found in each course's CodeName.
    Run(RunArgs),

    /// List zone names (IfcRoadPart ROADSEGMENT / BaselineRegion).
    Zones {
        #[arg(short, long)]
        model: PathBuf,
    },

    /// List the courses under a zone.
    Courses {
        #[arg(short, long)]
        model: PathBuf,
        #[arg(short, long)]
        zone: String,
    },

    /// List the property sets attached to a course.
    Psets {
        #[command(flatten)]
        target: CourseTarget,
    },

    /// Print one property value.
    Get {
        #[command(flatten)]
        target: CourseTarget,
        #[arg(long)]
        pset: String,
        #[arg(long)]
        name: String,
    },

    /// Add or overwrite one text property.
    Set {
        #[command(flatten)]
        target: CourseTarget,
        #[arg(long)]
        pset: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        value: String,
        /// Write here instead of overwriting the input model.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input IFC model
    #[arg(short, long)]
    model: PathBuf,
    /// Spreadsheet (.xlsx, .xls, .ods or .csv)
    #[arg(short, long)]
    sheet: PathBuf,
    /// Output IFC model (default: `<model>_<suffix>.ifc`)
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Output name suffix (overrides the config file)
    #[arg(long)]
    suffix: Option<String>,
    /// Log file (default: `mapping_log_<timestamp>.txt` next to the model)
    #[arg(long)]
    log: Option<PathBuf>,
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct CourseTarget {
    #[arg(short, long)]
    model: PathBuf,
    #[arg(short, long)]
    zone: String,
    #[arg(short, long)]
    course: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Zones { model } => edit::cmd_zones(&model),
        Commands::Courses { model, zone } => edit::cmd_courses(&model, &zone),
        Commands::Psets { target } => edit::cmd_psets(&target),
        Commands::Get { target, pset, name } => edit::cmd_get(&target, &pset, &name),
        Commands::Set {
            target,
            pset,
            name,
            value,
            out,
        } => edit::cmd_set(&target, pset, name, value, out.as_ref()),
    }
}
