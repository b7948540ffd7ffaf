//! Row ↔ course join for one zone.

use std::fmt;
use std::time::{Duration, Instant};

use pavemap_step::EntityId;

use crate::error::Result;
use crate::events::{CancelToken, Reporter};
use crate::model::ModelAccess;
use crate::normalize::normalize;
use crate::properties::{ensure_property_set, get_property, PropertyValue};
use crate::table::TableRow;
use crate::walker::find_courses_under;
use crate::{
    CODE_NAME_PROPERTY, CODE_NAME_PSET, PASSTHROUGH_COLUMNS, SURFACE_COLUMN, TARGET_PSET,
    TECHNIQUE_COLUMN,
};

const CODE_NAME_SEPARATOR: &str = " - ";

/// Normalized `(technique, surface)` pair; surfaces compare numerically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseKey {
    pub technique: String,
    pub surface: String,
}

impl CourseKey {
    pub fn new(technique: &str, surface: &str) -> Self {
        Self {
            technique: normalize(Some(technique), false),
            surface: normalize(Some(surface), true),
        }
    }

    /// Split a `"<technique> - <surface>"` descriptor on its first separator.
    pub fn from_code_name(code_name: &str) -> Option<Self> {
        let (technique, surface) = code_name.split_once(CODE_NAME_SEPARATOR)?;
        Some(Self::new(technique, surface))
    }

    /// `None` when either key column is missing or blank.
    pub fn from_row(row: &TableRow) -> Option<Self> {
        let present = |column| row.get(column).filter(|v| !v.trim().is_empty());
        Some(Self::new(present(TECHNIQUE_COLUMN)?, present(SURFACE_COLUMN)?))
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.technique, self.surface)
    }
}

/// Matches versus courses with a usable CodeName.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    AllMatched,
    Incomplete { unmatched: usize },
    /// Several rows hit the same course.
    Surplus { extra: usize },
}

impl Verification {
    pub fn of(matches: usize, valid_courses: usize) -> Self {
        if matches == valid_courses {
            Verification::AllMatched
        } else if matches < valid_courses {
            Verification::Incomplete {
                unmatched: valid_courses - matches,
            }
        } else {
            Verification::Surplus {
                extra: matches - valid_courses,
            }
        }
    }

    pub fn is_complete(self) -> bool {
        self == Verification::AllMatched
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatch {
    pub zone: String,
    pub courses_found: usize,
    pub valid_courses: usize,
    pub matches: usize,
    pub elapsed: Duration,
    pub cancelled: bool,
}

impl ZoneMatch {
    pub fn verification(&self) -> Verification {
        Verification::of(self.matches, self.valid_courses)
    }
}

/// Key every course that carries a parseable CodeName.
pub fn course_keys<M: ModelAccess + ?Sized>(model: &M, courses: &[EntityId]) -> Vec<(EntityId, CourseKey)> {
    let mut keyed = Vec::with_capacity(courses.len());
    for &course in courses {
        let code_name = match get_property(model, course, CODE_NAME_PSET, CODE_NAME_PROPERTY) {
            Some(PropertyValue::Scalar(text)) => Some(text),
            _ => None,
        };
        let name = model.name(course).unwrap_or("N/A");
        let gid = model.global_id(course).unwrap_or("N/A");
        match code_name.as_deref().and_then(CourseKey::from_code_name) {
            Some(key) => {
                tracing::debug!(
                    course = name,
                    global_id = gid,
                    code_name = code_name.as_deref().unwrap_or_default(),
                    technique = %key.technique,
                    surface = %key.surface,
                    "keyed course"
                );
                keyed.push((course, key));
            }
            None => {
                tracing::debug!(
                    course = name,
                    global_id = gid,
                    code_name = ?code_name,
                    "invalid or missing CodeName"
                );
            }
        }
    }
    keyed
}

/// Join `rows` (one zone's group) against the courses under `zone` and write
/// the passthrough columns of each matching row into the course's target set.
///
/// The target set is cleared before each write, so a course hit by several
/// rows ends up holding the last row's values.
pub fn match_zone<M: ModelAccess + ?Sized>(
    model: &mut M,
    zone_name: &str,
    zone: EntityId,
    rows: &[&TableRow],
    reporter: &Reporter<'_>,
    cancel: &CancelToken,
) -> Result<ZoneMatch> {
    let started = Instant::now();
    let courses = find_courses_under(&*model, zone, cancel)?;
    reporter.status(format!(
        "Found {} IfcCourse elements under zone '{zone_name}'",
        courses.len()
    ));

    let mut result = ZoneMatch {
        zone: zone_name.to_string(),
        courses_found: courses.len(),
        valid_courses: 0,
        matches: 0,
        elapsed: Duration::ZERO,
        cancelled: false,
    };
    if courses.is_empty() {
        result.cancelled = cancel.is_cancelled();
        result.elapsed = started.elapsed();
        return Ok(result);
    }

    let keyed = course_keys(&*model, &courses);
    result.valid_courses = keyed.len();

    for row in rows {
        if cancel.is_cancelled() {
            tracing::info!(zone = zone_name, "mapping cancelled while processing zone");
            result.cancelled = true;
            break;
        }
        let Some(row_key) = CourseKey::from_row(row) else {
            tracing::debug!(
                zone = zone_name,
                technique = ?row.get(TECHNIQUE_COLUMN),
                surface = ?row.get(SURFACE_COLUMN),
                "skipping row without technique or surface"
            );
            continue;
        };
        tracing::debug!(zone = zone_name, key = %row_key, "spreadsheet row");

        let Some(&(course, _)) = keyed.iter().find(|(_, key)| *key == row_key) else {
            tracing::debug!(zone = zone_name, key = %row_key, "no course matches row");
            continue;
        };
        tracing::info!(
            zone = zone_name,
            course = model.name(course).unwrap_or("N/A"),
            global_id = model.global_id(course).unwrap_or("N/A"),
            key = %row_key,
            "MATCH"
        );
        write_passthrough(model, course, row)?;
        result.matches += 1;
    }

    result.elapsed = started.elapsed();
    if !result.cancelled {
        report_verification(reporter, &result);
    }
    Ok(result)
}

fn write_passthrough<M: ModelAccess + ?Sized>(model: &mut M, course: EntityId, row: &TableRow) -> Result<()> {
    let pset = ensure_property_set(model, course, TARGET_PSET)?;
    model.clear_properties(pset)?;
    for column in PASSTHROUGH_COLUMNS {
        if let Some(value) = row.get(column).filter(|v| !v.trim().is_empty()) {
            model.append_text_property(pset, column, value)?;
        }
    }
    Ok(())
}

fn report_verification(reporter: &Reporter<'_>, result: &ZoneMatch) {
    let ZoneMatch {
        zone,
        matches,
        valid_courses,
        ..
    } = result;
    match result.verification() {
        Verification::AllMatched => reporter.status(format!(
            "Verification: All {matches} valid IfcCourse elements in zone '{zone}' matched."
        )),
        Verification::Incomplete { unmatched } => reporter.warn(format!(
            "Warning: Only {matches} of {valid_courses} valid IfcCourse elements in zone '{zone}' matched. {unmatched} courses not updated."
        )),
        Verification::Surplus { extra } => reporter.warn(format!(
            "Warning: {matches} matches for {valid_courses} valid IfcCourse elements in zone '{zone}' ({extra} rows hit an already matched course)."
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullSink;
    use crate::fixtures::ModelBuilder;
    use crate::properties::find_property_set;

    fn row(cells: &[(&str, &str)]) -> TableRow {
        cells.iter().copied().collect()
    }

    #[test]
    fn code_name_keys() {
        let key = CourseKey::from_code_name("Enrobé - 10.0").unwrap();
        assert_eq!(key, CourseKey::new("ENROBÉ", "10"));
        assert_eq!(key.surface, "10");

        // split on the first separator only
        let key = CourseKey::from_code_name("Grave - 0 - 20").unwrap();
        assert_eq!(key.technique, "grave");
        assert_eq!(key.surface, "0-20");

        assert_eq!(CourseKey::from_code_name("Grave-20"), None);
    }

    #[test]
    fn row_keys_require_both_columns() {
        assert!(CourseKey::from_row(&row(&[("TECHNIQUE_", "A"), ("SURFACE", "5")])).is_some());
        assert!(CourseKey::from_row(&row(&[("TECHNIQUE_", "A")])).is_none());
        assert!(CourseKey::from_row(&row(&[("TECHNIQUE_", " "), ("SURFACE", "5")])).is_none());
    }

    #[test]
    fn verification_outcomes() {
        assert_eq!(Verification::of(2, 2), Verification::AllMatched);
        assert_eq!(Verification::of(1, 3), Verification::Incomplete { unmatched: 2 });
        assert_eq!(Verification::of(4, 3), Verification::Surplus { extra: 1 });
    }

    #[test]
    fn first_matching_course_wins_and_set_is_replaced() {
        let mut b = ModelBuilder::new();
        let zone = b.zone("Z1");
        let c1 = b.course("C1");
        let c2 = b.course("C2");
        b.contain(zone, &[c1, c2]);
        b.code_name(c1, "Tech A - 5");
        b.code_name(c2, "tech a - 5.0");
        b.property_set(c1, TARGET_PSET, &[("STALE", "x")]);
        let mut model = b.build();

        let rows = [
            row(&[("TECHNIQUE_", "Tech A"), ("SURFACE", "5"), ("PR_1", "foo"), ("FOND", "  ")]),
        ];
        let rows: Vec<&TableRow> = rows.iter().collect();
        let sink = NullSink;
        let reporter = Reporter::new(&sink);
        let result = match_zone(&mut model, "Z1", zone, &rows, &reporter, &CancelToken::new()).unwrap();

        assert_eq!(result.courses_found, 2);
        assert_eq!(result.valid_courses, 2);
        assert_eq!(result.matches, 1);
        assert_eq!(result.verification(), Verification::Incomplete { unmatched: 1 });

        let pset = find_property_set(&model, c1, TARGET_PSET).unwrap();
        let names: Vec<_> = model
            .properties(pset)
            .into_iter()
            .filter_map(|p| model.property_name(p).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["PR_1", "SURFACE"]);
        assert_eq!(find_property_set(&model, c2, TARGET_PSET), None);
    }

    #[test]
    fn invalid_code_names_are_not_counted() {
        let mut b = ModelBuilder::new();
        let zone = b.zone("Z1");
        let c1 = b.course("C1");
        let c2 = b.course("C2");
        b.aggregate(zone, &[c1, c2]);
        b.code_name(c1, "no separator");
        let mut model = b.build();

        let sink = NullSink;
        let result = match_zone(
            &mut model,
            "Z1",
            zone,
            &[],
            &Reporter::new(&sink),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(result.courses_found, 2);
        assert_eq!(result.valid_courses, 0);
        assert!(result.verification().is_complete());
    }

    #[test]
    fn cancellation_stops_before_next_row() {
        let mut b = ModelBuilder::new();
        let zone = b.zone("Z1");
        let c1 = b.course("C1");
        b.aggregate(zone, &[c1]);
        b.code_name(c1, "A - 1");
        let mut model = b.build();

        // Cancel as soon as the course walk reported its status line.
        struct CancelOnStatus(CancelToken);
        impl crate::events::EventSink for CancelOnStatus {
            fn emit(&self, _event: crate::events::RunEvent) {
                self.0.cancel();
            }
        }
        let cancel = CancelToken::new();
        let sink = CancelOnStatus(cancel.clone());
        let rows = [row(&[("TECHNIQUE_", "A"), ("SURFACE", "1"), ("PR_1", "x")])];
        let rows: Vec<&TableRow> = rows.iter().collect();

        let result = match_zone(&mut model, "Z1", zone, &rows, &Reporter::new(&sink), &cancel).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.matches, 0);
        assert_eq!(find_property_set(&model, c1, TARGET_PSET), None);
    }
}
