use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{DirectionRows, DirectionTotals};
use super::FIRST_CLASS_COLUMN;
use crate::excel::Workbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Match,
    /// actual - expected
    Diff(i64),
}

impl MatchStatus {
    fn compare(expected: u64, actual: i64) -> Self {
        let difference = actual - expected as i64;
        if difference == 0 {
            MatchStatus::Match
        } else {
            MatchStatus::Diff(difference)
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchStatus::Match)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Match => write!(f, "MATCH"),
            MatchStatus::Diff(d) => write!(f, "DIFF ({})", d),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCheck {
    /// 1-based vehicle class
    pub class: usize,
    pub expected: u64,
    pub actual: i64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionCheck {
    pub direction: String,
    pub classes: Vec<ClassCheck>,
    pub expected_total: u64,
    pub actual_total: i64,
    pub status: MatchStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub directions: Vec<DirectionCheck>,
}

impl VerificationReport {
    /// True when every located direction matches in every class
    pub fn is_exact(&self) -> bool {
        self.directions
            .iter()
            .all(|d| d.status.is_match() && d.classes.iter().all(|c| c.status.is_match()))
    }

    pub fn direction(&self, name: &str) -> Option<&DirectionCheck> {
        self.directions.iter().find(|d| d.direction == name)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.directions {
            writeln!(f, "{}:", check.direction)?;
            for class in &check.classes {
                writeln!(
                    f,
                    "  Class {}: {} -> {} [{}]",
                    class.class, class.expected, class.actual, class.status
                )?;
            }
            writeln!(
                f,
                "  TOTAL: {} -> {} [{}]",
                check.expected_total, check.actual_total, check.status
            )?;
        }
        Ok(())
    }
}

/// Sum every direction's rows over `sheets` and compare against the targets.
///
/// Read-only. Directions missing from `rows` are not reported; cells that are
/// not plain numbers count as zero.
pub fn verify_totals(
    workbook: &Workbook,
    totals: &[DirectionTotals],
    sheets: &[String],
    rows: &DirectionRows,
) -> VerificationReport {
    let mut report = VerificationReport::default();

    for direction in totals {
        let Some(direction_rows) = rows.get(&direction.name) else {
            continue;
        };

        let classes: Vec<ClassCheck> = direction
            .totals
            .iter()
            .enumerate()
            .map(|(index, &expected)| {
                let column = FIRST_CLASS_COLUMN + index as u32;
                let actual = column_sum(workbook, sheets, direction_rows, column);
                ClassCheck {
                    class: index + 1,
                    expected,
                    actual,
                    status: MatchStatus::compare(expected, actual),
                }
            })
            .collect();

        let expected_total = direction.grand_total();
        let actual_total: i64 = classes.iter().map(|c| c.actual).sum();

        report.directions.push(DirectionCheck {
            direction: direction.name.clone(),
            classes,
            expected_total,
            actual_total,
            status: MatchStatus::compare(expected_total, actual_total),
        });
    }

    report
}

fn column_sum(workbook: &Workbook, sheets: &[String], rows: &[u32], column: u32) -> i64 {
    let total: f64 = sheets
        .iter()
        .filter_map(|name| workbook.sheet(name))
        .flat_map(|sheet| rows.iter().map(move |&row| sheet.cell(row, column).number().unwrap_or(0.0)))
        .sum();
    total.round() as i64
}
