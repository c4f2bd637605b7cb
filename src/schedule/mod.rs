pub mod parser;
pub mod reader;

use chrono::NaiveDateTime;

/// A single spreadsheet cell, normalized across CSV and workbook sources.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display form used for names and keyword matching. Whole numbers drop
    /// their fractional part.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Integer value of a numeric cell or numeric text (`"14"`, `"14.0"`).
    pub fn as_integer(&self) -> Option<i64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then(|| value.trunc() as i64)
    }
}

/// Rows of cells, top to bottom, column A first.
pub type Grid = Vec<Vec<Cell>>;
