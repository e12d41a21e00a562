use thiserror::Error;

use crate::config::ConfigError;
use crate::excel::ExcelError;

/// Errors raised by the scaling and force-totals pipelines
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Invalid operation '{0}': expected 'increase' or 'decrease'")]
    InvalidOperation(String),

    #[error("Invalid percentage {0}: must be finite and non-negative, and at most 100 for a decrease")]
    InvalidPercentage(f64),

    #[error("Cannot redistribute {0} across an empty sheet set")]
    EmptySheetSet(u64),

    #[error("Direction '{0}' was not found in the reference sheet")]
    DirectionNotFound(String),

    #[error("Class {class} of '{direction}' has a non-zero target but only formula cells")]
    NoWritableCells { direction: String, class: usize },

    #[error(transparent)]
    Excel(#[from] ExcelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
