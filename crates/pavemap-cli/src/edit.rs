//! Browsing and single-property commands.

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use pavemap_core::editor::{
    apply_edit, course_names, property_set_names, read_property, zone_names, PropertyEdit,
};
use pavemap_core::{IfcModel, MapError, PropertyValue};

use crate::logging;
use crate::CourseTarget;

fn open(model: &Path) -> Result<IfcModel> {
    logging::init_stderr();
    Ok(IfcModel::open(model)?)
}

/// Recoverable lookup failures get a short hint instead of a bare error.
fn explain(err: MapError) -> anyhow::Error {
    if err.is_recoverable() {
        let hint = match &err {
            MapError::ZoneNotFound(_) => " (try `pavemap zones`)",
            MapError::TechniqueNotFound(_) => " (try `pavemap courses`)",
            _ => "",
        };
        anyhow!("{err}{hint}")
    } else {
        err.into()
    }
}

fn print_list(items: &[String], empty: &str) {
    if items.is_empty() {
        println!("{}", empty.dimmed());
    }
    for item in items {
        println!("{item}");
    }
}

pub fn cmd_zones(model: &Path) -> Result<()> {
    let model = open(model)?;
    print_list(&zone_names(&model), "no zones found");
    Ok(())
}

pub fn cmd_courses(model: &Path, zone: &str) -> Result<()> {
    let model = open(model)?;
    let names = course_names(&model, zone).map_err(explain)?;
    print_list(&names, "no IfcCourse under this zone");
    Ok(())
}

pub fn cmd_psets(target: &CourseTarget) -> Result<()> {
    let model = open(&target.model)?;
    let names = property_set_names(&model, &target.zone, &target.course).map_err(explain)?;
    print_list(&names, "no property sets");
    Ok(())
}

fn edit_for(target: &CourseTarget, pset: String, name: String, value: String) -> PropertyEdit {
    PropertyEdit {
        zone: target.zone.clone(),
        course: target.course.clone(),
        pset,
        name,
        value,
    }
}

pub fn cmd_get(target: &CourseTarget, pset: &str, name: &str) -> Result<()> {
    let model = open(&target.model)?;
    let edit = edit_for(target, pset.to_string(), name.to_string(), String::new());
    match read_property(&model, &edit).map_err(explain)? {
        Some(PropertyValue::Scalar(value)) => println!("{value}"),
        Some(PropertyValue::Entity(id)) => {
            println!("{}", format!("property {id} has no nominal value").dimmed())
        }
        None => println!("{}", "not set".dimmed()),
    }
    Ok(())
}

pub fn cmd_set(
    target: &CourseTarget,
    pset: String,
    name: String,
    value: String,
    out: Option<&PathBuf>,
) -> Result<()> {
    let mut model = open(&target.model)?;
    let edit = edit_for(target, pset, name, value);
    apply_edit(&mut model, &edit).map_err(explain)?;

    let dest = out.unwrap_or(&target.model);
    model.save(dest)?;
    tracing::info!(
        zone = %edit.zone,
        course = %edit.course,
        pset = %edit.pset,
        name = %edit.name,
        dest = %dest.display(),
        "property written"
    );
    println!(
        "{} {}.{} = {} on '{}' ({})",
        "ok".green().bold(),
        edit.pset,
        edit.name,
        edit.value,
        edit.course,
        edit.zone
    );
    println!("  {} {}", "wrote".green().bold(), dest.display());
    Ok(())
}
