use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProcessError;

/// The twelve hourly sheets of a day count, in order
pub const TIME_SHEETS: [&str; 12] = [
    "7-8AM", "8-9AM", "9-10AM", "10-11AM", "11-12PM", "12-1PM",
    "1-2PM", "2-3PM", "3-4PM", "4-5PM", "5-6PM", "6-7PM",
];

/// Half-width of the multiplicative jitter `[1 - j, 1 + j]`
pub const JITTER: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Increase,
    Decrease,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Increase => "increase",
            Operation::Decrease => "decrease",
        }
    }

    /// `1 + p/100` or `1 - p/100`
    pub fn multiplier(&self, percentage: f64) -> f64 {
        match self {
            Operation::Increase => 1.0 + percentage / 100.0,
            Operation::Decrease => 1.0 - percentage / 100.0,
        }
    }
}

impl FromStr for Operation {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increase" => Ok(Operation::Increase),
            "decrease" => Ok(Operation::Decrease),
            other => Err(ProcessError::InvalidOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strict the column-1 label test is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelRule {
    /// Any non-empty, non-formula text
    #[default]
    Lenient,
    /// Text must also be longer than two characters once trimmed
    Strict,
}

/// Inclusive, 1-based column range holding the counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub first: u32,
    pub last: u32,
}

impl Default for ColumnRange {
    /// Columns B through M
    fn default() -> Self {
        ColumnRange { first: 2, last: 13 }
    }
}

impl ColumnRange {
    pub fn new(first: u32, last: u32) -> Self {
        ColumnRange { first, last }
    }

    pub fn contains(&self, col: u32) -> bool {
        (self.first..=self.last).contains(&col)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.first..=self.last
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleOptions {
    pub percentage: f64,
    pub operation: Operation,
    pub label_rule: LabelRule,
    pub sheets: Vec<String>,
    pub columns: ColumnRange,
}

impl ScaleOptions {
    pub fn new(percentage: f64, operation: Operation) -> Self {
        ScaleOptions {
            percentage,
            operation,
            label_rule: LabelRule::default(),
            sheets: TIME_SHEETS.iter().map(|s| s.to_string()).collect(),
            columns: ColumnRange::default(),
        }
    }

    /// Parse the operation string and check the percentage
    pub fn parse(percentage: f64, operation: &str) -> Result<Self, ProcessError> {
        let operation: Operation = operation.parse()?;
        let options = Self::new(percentage, operation);
        options.validate()?;
        Ok(options)
    }

    pub fn with_label_rule(mut self, rule: LabelRule) -> Self {
        self.label_rule = rule;
        self
    }

    /// Counts can never go negative, so a decrease stops at 100%
    pub fn validate(&self) -> Result<(), ProcessError> {
        if !self.percentage.is_finite() || self.percentage < 0.0 {
            return Err(ProcessError::InvalidPercentage(self.percentage));
        }
        if self.operation == Operation::Decrease && self.percentage > 100.0 {
            return Err(ProcessError::InvalidPercentage(self.percentage));
        }
        Ok(())
    }

    pub fn multiplier(&self) -> f64 {
        self.operation.multiplier(self.percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCount {
    pub sheet: String,
    pub modified: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleReport {
    pub sheets: Vec<SheetCount>,
    pub total_modified: u32,
}

impl ScaleReport {
    pub fn modified_in(&self, sheet: &str) -> Option<u32> {
        self.sheets.iter().find(|s| s.sheet == sheet).map(|s| s.modified)
    }

    /// One line per processed sheet, then the total
    pub fn log_lines(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|s| format!("Modified {} cells in {}", s.modified, s.sheet))
            .chain(std::iter::once(format!("Total: {} cells modified", self.total_modified)))
            .collect()
    }
}
