//! Turns a vacation roster sheet into [`Vacation`] rows.
//!
//! Rosters come straight out of HR systems: merged multi-row headers, Russian
//! or English column titles, dates as real date cells, serial numbers, or
//! text. The layout is found by header keywords first and by sniffing the
//! first data row second.

use crate::domain::model::{RowError, Vacation};
use crate::schedule::{Cell, Grid};
use chrono::{Duration, NaiveDate, NaiveDateTime};

const HEADER_SCAN_ROWS: usize = 20;
const DATA_SCAN_ROWS: usize = 30;
/// Upper bound for a cell to count as a day count while guessing columns.
const DETECT_MAX_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub fio: usize,
    pub org: usize,
    pub days: usize,
    pub start_date: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub columns: ColumnMap,
    /// Index of the first row that may hold data.
    pub data_start: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRoster {
    pub rows: Vec<Vacation>,
    pub errors: Vec<RowError>,
}

fn is_name_header(v: &str) -> bool {
    v.contains("фио")
        || v.contains("фамили")
        || v.contains("сотрудник")
        || v.contains("employee")
        || v == "name"
        || v.contains("full name")
}

fn is_date_header(v: &str) -> bool {
    (v.contains("дата")
        && (v.contains("план") || v.contains("начал") || v.contains("запланир")))
        || v == "дата"
        || v == "date"
        || v.contains("start date")
}

fn is_days_header(v: &str) -> bool {
    (v.contains("кол") && v.contains("дн"))
        || v.contains("календарн")
        || v == "days"
        || v.contains("number of days")
}

fn is_org_header(v: &str) -> bool {
    v.contains("организ")
        || v.contains("филиал")
        || v.contains("компани")
        || v.contains("organization")
        || v.contains("organisation")
        || v.contains("company")
}

/// Looks for a header row naming at least the employee and start date
/// columns.
pub fn find_header(grid: &Grid) -> Option<Layout> {
    for (i, row) in grid.iter().take(HEADER_SCAN_ROWS).enumerate() {
        let values: Vec<String> = row.iter().map(|c| c.as_text().to_lowercase()).collect();
        let position = |pred: fn(&str) -> bool| values.iter().position(|v| pred(v));

        if let (Some(fio), Some(start_date)) = (position(is_name_header), position(is_date_header)) {
            let columns = ColumnMap {
                fio,
                org: position(is_org_header).unwrap_or(fio + 1),
                days: position(is_days_header).unwrap_or(fio + 2),
                start_date,
            };
            tracing::info!("Header found at row {}: {:?}", i, columns);
            return Some(Layout {
                columns,
                data_start: i + 1,
            });
        }
    }
    None
}

/// `s` starts with `shape`, where `d` in the shape stands for any digit.
fn has_shape(s: &str, shape: &str) -> bool {
    s.len() >= shape.len()
        && s.bytes().zip(shape.bytes()).all(|(c, p)| {
            if p == b'd' {
                c.is_ascii_digit()
            } else {
                c == p
            }
        })
}

fn looks_like_date(cell: &Cell) -> bool {
    match cell {
        Cell::Date(_) => true,
        Cell::Text(s) => has_shape(s.trim(), "dd.dd.dddd") || has_shape(s.trim(), "dddd-dd-dd"),
        _ => false,
    }
}

fn is_numeric_label(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Fallback when no header matches: the first row with a name-like first
/// column and a date somewhere to its right is taken as the first data row.
pub fn detect_data_start(grid: &Grid) -> Option<Layout> {
    for (i, row) in grid.iter().take(DATA_SCAN_ROWS).enumerate() {
        let first = row.first().map(Cell::as_text).unwrap_or_default();
        if first.is_empty() || is_numeric_label(&first) {
            continue;
        }

        let Some(date_col) = row.iter().position(looks_like_date) else {
            continue;
        };

        let days_col = (1..date_col).find(|&j| {
            row.get(j)
                .and_then(Cell::as_integer)
                .is_some_and(|d| (1..=DETECT_MAX_DAYS).contains(&d))
        });

        let columns = ColumnMap {
            fio: 0,
            org: 1,
            days: days_col.unwrap_or(2),
            start_date: date_col,
        };
        tracing::info!("Auto-detected data start at row {}: {:?}", i, columns);
        return Some(Layout {
            columns,
            data_start: i,
        });
    }
    None
}

pub fn detect_layout(grid: &Grid) -> Option<Layout> {
    find_header(grid).or_else(|| {
        tracing::info!("No keyword header found, auto-detecting data start...");
        detect_data_start(grid)
    })
}

/// Days since 1899-12-30, the spreadsheet epoch.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

const DATE_FORMATS: [&str; 4] = ["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

pub fn parse_date(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Date(dt) => Ok(dt.date()),
        Cell::Number(n) => from_serial(*n).ok_or_else(|| format!("invalid date serial {}", n)),
        Cell::Text(s) => {
            let s = s.trim();
            // two-digit years only in the exact dd.mm.yy shape
            if s.len() == 8 && has_shape(s, "dd.dd.dd") {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%d.%m.%y") {
                    return Ok(d);
                }
            }
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                        .map(|dt| dt.date())
                })
                .ok_or_else(|| format!("unrecognized date '{}'", s))
        }
        Cell::Empty => Err("empty date".to_string()),
    }
}

fn parse_days(cell: &Cell) -> Result<u32, String> {
    if cell.is_empty() {
        return Ok(0);
    }
    match cell.as_integer() {
        Some(d) => u32::try_from(d).map_err(|_| format!("day count {} out of range", d)),
        None => Err(format!("invalid day count '{}'", cell.as_text())),
    }
}

fn parse_row(row: &[Cell], columns: &ColumnMap) -> Option<(String, Result<Vacation, String>)> {
    let empty = Cell::Empty;
    let get = |idx: usize| row.get(idx).unwrap_or(&empty);

    let fio = get(columns.fio).as_text();
    if fio.is_empty() || is_numeric_label(&fio) {
        return None;
    }
    let date_cell = get(columns.start_date);
    if date_cell.is_empty() {
        return None;
    }

    let vacation = parse_date(date_cell).and_then(|start_date| {
        let days = parse_days(get(columns.days))?;
        let end_date = start_date
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| format!("day count {} out of range", days))?;
        Ok(Vacation {
            fio: fio.clone(),
            org: get(columns.org).as_text(),
            days,
            start_date,
            end_date,
        })
    });
    Some((fio, vacation))
}

pub fn parse_roster(grid: &Grid) -> ParsedRoster {
    let mut parsed = ParsedRoster::default();

    let Some(layout) = detect_layout(grid) else {
        tracing::error!("Could not detect column layout");
        return parsed;
    };

    for (i, row) in grid.iter().enumerate().skip(layout.data_start) {
        match parse_row(row, &layout.columns) {
            Some((_, Ok(vacation))) => parsed.rows.push(vacation),
            Some((fio, Err(error))) => {
                tracing::debug!("Parse error row {} fio={:?}: {}", i + 1, fio, error);
                parsed.errors.push(RowError {
                    row: i + 1,
                    fio,
                    error,
                });
            }
            None => {}
        }
    }

    tracing::info!(
        "Parsed {} rows, {} errors",
        parsed.rows.len(),
        parsed.errors.len()
    );
    parsed
}
