//! Tabular input: CSV files and spreadsheet workbooks (first worksheet).
//!
//! Every cell is reduced to text up front. Blank cells are simply absent from
//! their row.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};

use crate::error::{InputKind, MapError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    cells: BTreeMap<String, String>,
}

impl TableRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.cells.insert(column.into(), value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TableRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = TableRow::default();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    /// `.csv` goes through the CSV reader; anything else is opened as a workbook.
    pub fn open(path: &Path) -> Result<Self> {
        let load_error = |message: String| MapError::Load {
            input: InputKind::Spreadsheet,
            path: path.to_path_buf(),
            message,
        };

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let table = if is_csv {
            let file = std::fs::File::open(path).map_err(|err| load_error(err.to_string()))?;
            Self::from_csv_reader(file).map_err(|err| load_error(err.to_string()))?
        } else {
            Self::from_workbook(path).map_err(load_error)?
        };
        tracing::debug!(
            path = %path.display(),
            rows = table.rows.len(),
            columns = table.columns.len(),
            "loaded table"
        );
        Ok(table)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: TableRow = columns
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), cell.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }

    fn from_workbook(path: &Path) -> std::result::Result<Self, String> {
        let mut workbook = open_workbook_auto(path).map_err(|err| err.to_string())?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| "workbook has no worksheet".to_string())?
            .map_err(|err| err.to_string())?;

        let mut lines = range.rows();
        let Some(header) = lines.next() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = header
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default())
            .collect();

        let rows = lines
            .map(|line| {
                columns
                    .iter()
                    .zip(line)
                    .filter(|(column, _)| !column.is_empty())
                    .filter_map(|(column, cell)| Some((column.clone(), cell_text(cell)?)))
                    .collect::<TableRow>()
            })
            .collect();
        Ok(Self { columns, rows })
    }

    /// Rows grouped by the trimmed value of `column`, in sorted key order.
    /// Rows lacking the column land in the `""` group.
    pub fn group_by(&self, column: &str) -> BTreeMap<String, Vec<&TableRow>> {
        let mut groups: BTreeMap<String, Vec<&TableRow>> = BTreeMap::new();
        for row in &self.rows {
            let key = row.get(column).map(str::trim).unwrap_or_default();
            groups.entry(key.to_string()).or_default().push(row);
        }
        groups
    }
}

/// Integral floats render without a fractional part.
pub fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(dt) => match cell.as_datetime() {
            Some(datetime) => datetime.format(DATE_FORMAT).to_string(),
            None => render_float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    };
    (!text.is_empty()).then_some(text)
}
