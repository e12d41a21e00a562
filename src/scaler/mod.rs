//! Percentage rescaling of hourly count sheets.
//!
//! Every non-zero count in a data row is multiplied by the target factor,
//! nudged by a small jitter and rounded. Counts from 1 to 10 are guaranteed
//! to move at least one unit in the requested direction.

pub mod types;
pub mod classifier;

pub use types::*;
pub use classifier::is_data_row;

use tracing::{debug, info};

use crate::error::Result;
use crate::excel::Workbook;
use crate::random::RandomSource;

/// Rescale every data row of the configured sheets in place.
///
/// Sheets missing from the workbook are skipped. Formula, text and zero
/// cells are left as they are.
pub fn scale(workbook: &mut Workbook, options: &ScaleOptions, rng: &mut dyn RandomSource) -> Result<ScaleReport> {
    options.validate()?;

    let multiplier = options.multiplier();
    let mut report = ScaleReport::default();

    for name in &options.sheets {
        let Some(sheet) = workbook.sheet_mut(name) else {
            debug!(sheet = %name, "sheet not in workbook, skipping");
            continue;
        };

        let mut modified = 0u32;
        for row in 1..=sheet.max_row() {
            if !is_data_row(sheet, row, &options.columns, options.label_rule) {
                continue;
            }

            for col in options.columns.iter() {
                let Some(original) = sheet.cell(row, col).number() else {
                    continue;
                };
                if original == 0.0 {
                    continue;
                }

                let jitter = 1.0 + rng.uniform(-JITTER, JITTER);
                let new_value = scale_value(original, multiplier, jitter, options.operation);
                sheet.set_number(row, col, new_value);
                modified += 1;
            }
        }

        info!("Modified {} cells in {}", modified, name);
        report.sheets.push(SheetCount {
            sheet: name.clone(),
            modified,
        });
        report.total_modified += modified;
    }

    info!("Total: {} cells modified", report.total_modified);
    Ok(report)
}

/// `round(original * multiplier * jitter)`, half away from zero, with small
/// counts forced to move by at least one
pub fn scale_value(original: f64, multiplier: f64, jitter: f64, operation: Operation) -> f64 {
    let modified = original * multiplier;
    let new_value = (modified * jitter).round();

    if (1.0..=10.0).contains(&original) {
        match operation {
            Operation::Increase if new_value <= original => return original + 1.0,
            Operation::Decrease if new_value >= original => return (original - 1.0).max(1.0),
            _ => {}
        }
    }

    new_value
}
