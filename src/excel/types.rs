use serde::{Deserialize, Serialize};

/// Represents a cell value with type information.
///
/// Formula detection is a text heuristic: anything whose source text starts
/// with `=` is a formula. There is no formula parsing behind it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Formula(String),
}

impl Cell {
    /// Build a cell from raw text, classifying a leading `=` as a formula
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Cell::Empty
        } else if text.starts_with('=') {
            Cell::Formula(text)
        } else {
            Cell::Text(text)
        }
    }

    /// Numeric payload of a plain number cell. Formulas never count.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text usable as a row label: non-empty and not a formula
    pub fn label(&self) -> Option<&str> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() && !s.starts_with('=') => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_text(value)
    }
}

/// A cell edit to be applied to the workbook container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellEdit {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
    pub value: Cell,
}

/// Result of writing pending edits back into a container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    pub edits_applied: u32,
    pub errors: Vec<String>,
}

/// Excel-specific errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcelError {
    pub message: String,
    pub error_type: ExcelErrorType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExcelErrorType {
    FileNotFound,
    InvalidFormat,
    SheetNotFound,
    ReadError,
    WriteError,
}

impl std::fmt::Display for ExcelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExcelError {}

impl ExcelError {
    pub fn new(message: impl Into<String>, error_type: ExcelErrorType) -> Self {
        ExcelError {
            message: message.into(),
            error_type,
        }
    }

    pub fn file_not_found(path: &str) -> Self {
        ExcelError::new(format!("File not found: {}", path), ExcelErrorType::FileNotFound)
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::InvalidFormat)
    }

    pub fn sheet_not_found(sheet: &str) -> Self {
        ExcelError::new(format!("Sheet not found: {}", sheet), ExcelErrorType::SheetNotFound)
    }

    pub fn read_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::ReadError)
    }

    pub fn write_error(message: impl Into<String>) -> Self {
        ExcelError::new(message, ExcelErrorType::WriteError)
    }
}
