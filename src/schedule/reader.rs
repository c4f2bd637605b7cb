use crate::schedule::{Cell, Grid};
use crate::utils::error::{AppError, Result};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

pub fn sniff_format(bytes: &[u8]) -> SourceFormat {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        SourceFormat::Workbook
    } else {
        SourceFormat::Csv
    }
}

/// Reads the first sheet of an uploaded roster into a grid of cells.
pub fn read_grid(bytes: &[u8]) -> Result<Grid> {
    match sniff_format(bytes) {
        SourceFormat::Workbook => read_workbook(bytes),
        SourceFormat::Csv => read_csv(bytes),
    }
}

const SNIFF_LINES: usize = 5;

/// Title rows above the header often carry no separators at all, so look at
/// a few lines rather than just the first.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let head: Vec<u8> = bytes
        .split(|b| *b == b'\n')
        .take(SNIFF_LINES)
        .flatten()
        .copied()
        .collect();
    let count = |d: u8| head.iter().filter(|b| **b == d).count();
    [b';', b'\t', b',']
        .into_iter()
        .max_by_key(|d| count(*d))
        .filter(|d| count(*d) > 0)
        .unwrap_or(b',')
}

pub fn read_csv(bytes: &[u8]) -> Result<Grid> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(bytes))
        .from_reader(bytes);

    let mut grid = Grid::new();
    for record in reader.byte_records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| Cell::text(&String::from_utf8_lossy(field)))
                .collect(),
        );
    }
    Ok(grid)
}

#[cfg(feature = "xlsx")]
fn read_workbook(bytes: &[u8]) -> Result<Grid> {
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    let spreadsheet_error = |message: String| AppError::SpreadsheetError { message };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| spreadsheet_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_error("workbook has no sheets".to_string()))?
        .map_err(|e| spreadsheet_error(e.to_string()))?;

    let to_cell = |data: &Data| match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DurationIso(s) => Cell::text(s),
        Data::DateTimeIso(s) => chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::Date)
            .unwrap_or_else(|_| Cell::text(s)),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
    };

    // the range starts at the first used cell; pad so column A stays index 0
    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut grid: Grid = vec![Vec::new(); first_row as usize];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; first_col as usize];
        cells.extend(row.iter().map(to_cell));
        grid.push(cells);
    }
    Ok(grid)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(_bytes: &[u8]) -> Result<Grid> {
    Err(AppError::MissingDependency {
        name: crate::contract::dependencies::Capability::Xlsx.name().to_string(),
    })
}
