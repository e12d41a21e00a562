use serde::{Deserialize, Serialize};

use super::verify::VerificationReport;

/// Ground-truth class totals for one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionTotals {
    pub name: String,
    pub totals: Vec<u64>,
}

impl DirectionTotals {
    pub fn new(name: impl Into<String>, totals: Vec<u64>) -> Self {
        DirectionTotals {
            name: name.into(),
            totals,
        }
    }

    pub fn grand_total(&self) -> u64 {
        self.totals.iter().sum()
    }
}

/// Rows of the reference sheet attributed to each direction, in scan order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionRows {
    entries: Vec<(String, Vec<u32>)>,
}

impl DirectionRows {
    pub fn new() -> Self {
        DirectionRows::default()
    }

    pub fn push(&mut self, direction: &str, row: u32) {
        match self.entries.iter_mut().find(|(name, _)| name == direction) {
            Some((_, rows)) => rows.push(row),
            None => self.entries.push((direction.to_string(), vec![row])),
        }
    }

    pub fn get(&self, direction: &str) -> Option<&[u32]> {
        self.entries
            .iter()
            .find(|(name, _)| name == direction)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn contains(&self, direction: &str) -> bool {
        self.get(direction).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.entries
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a force-totals run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceReport {
    pub hourly_sheets: Vec<String>,
    pub direction_rows: DirectionRows,
    pub skipped_directions: Vec<String>,
    pub cells_written: u32,
    pub formula_cells_skipped: u32,
    pub summary_rows: Option<Vec<(String, u32)>>,
    pub verification: VerificationReport,
}
