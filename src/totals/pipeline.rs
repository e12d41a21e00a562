use tracing::{debug, info, warn};

use super::allocation::{redistribute, split_across_rows, Allocation};
use super::locator::locate_direction_rows;
use super::summary::rewrite_summary;
use super::types::ForceReport;
use super::verify::verify_totals;
use super::FIRST_CLASS_COLUMN;
use crate::config::Profile;
use crate::error::{ProcessError, Result};
use crate::excel::{cell_ref, ExcelError, Workbook};
use crate::random::RandomSource;

#[derive(Debug, Default)]
struct WriteStats {
    cells_written: u32,
    formula_cells_skipped: u32,
}

/// Rewrite every direction row so each class sums exactly to its target.
///
/// Hourly sheets are all sheets except the profile's summary sheet. Formula
/// cells are kept, and the share they would have taken goes to the other
/// rows of the same sheet (or to the next sheet with a writable row). Nothing
/// is written if the reference sheet is missing, a direction cannot be
/// located (unless the profile allows skipping it), or a non-zero class has
/// no writable cell at all.
pub fn force_exact_totals(
    workbook: &mut Workbook,
    profile: &Profile,
    rng: &mut dyn RandomSource,
) -> Result<ForceReport> {
    let hourly_sheets: Vec<String> = workbook
        .sheet_names()
        .into_iter()
        .filter(|name| *name != profile.summary_sheet)
        .collect();

    let reference = workbook
        .sheet(&profile.reference_sheet)
        .ok_or_else(|| ExcelError::sheet_not_found(&profile.reference_sheet))?;

    let names: Vec<String> = profile.directions.iter().map(|d| d.name.clone()).collect();
    let direction_rows = locate_direction_rows(reference, &names, profile.direction_scan_limit);

    for (direction, rows) in direction_rows.iter() {
        info!(direction, ?rows, "found direction rows");
    }

    let mut skipped_directions = Vec::new();
    for direction in &profile.directions {
        if direction_rows.contains(&direction.name) {
            continue;
        }
        if !profile.skip_missing_directions {
            return Err(ProcessError::DirectionNotFound(direction.name.clone()));
        }
        warn!(direction = %direction.name, "direction not found, its totals will not match");
        skipped_directions.push(direction.name.clone());
    }

    for direction in &profile.directions {
        let Some(rows) = direction_rows.get(&direction.name) else {
            continue;
        };
        for (index, &target) in direction.totals.iter().enumerate() {
            let column = FIRST_CLASS_COLUMN + index as u32;
            let writable = hourly_sheets
                .iter()
                .any(|sheet| !writable_rows(workbook, sheet, rows, column).is_empty());
            if target > 0 && !writable {
                return Err(ProcessError::NoWritableCells {
                    direction: direction.name.clone(),
                    class: index + 1,
                });
            }
        }
    }

    let mut stats = WriteStats::default();

    for direction in &profile.directions {
        let Some(rows) = direction_rows.get(&direction.name) else {
            continue;
        };
        info!(direction = %direction.name, total = direction.grand_total(), "processing direction");

        for (index, &target) in direction.totals.iter().enumerate() {
            let column = FIRST_CLASS_COLUMN + index as u32;

            if target == 0 {
                for sheet in &hourly_sheets {
                    for &row in rows {
                        write_count(workbook, sheet, row, column, 0, &mut stats);
                    }
                }
                continue;
            }

            let allocation = redistribute(
                target,
                &hourly_sheets,
                &profile.weights,
                &profile.strategy,
                rng,
            )?;
            debug!(class = index + 1, target, ?allocation, "hourly distribution");

            for (sheet, share, writable) in place_shares(workbook, &allocation, rows, column, &mut stats) {
                for (row, value) in split_across_rows(share, &writable, profile.strategy.row_variation, rng) {
                    write_count(workbook, &sheet, row, column, value, &mut stats);
                }
            }
        }
    }

    let summary_rows = if profile.rewrite_summary {
        let written = rewrite_summary(
            workbook,
            &profile.summary_sheet,
            &profile.directions,
            profile.summary_scan_limit,
        );
        if written.is_none() {
            warn!(sheet = %profile.summary_sheet, "summary sheet not found, skipping");
        }
        written
    } else {
        None
    };

    let verification = verify_totals(workbook, &profile.directions, &hourly_sheets, &direction_rows);
    if verification.is_exact() {
        info!("all located directions match their targets");
    } else {
        warn!("verification found mismatches:\n{}", verification);
    }

    Ok(ForceReport {
        hourly_sheets,
        direction_rows,
        skipped_directions,
        cells_written: stats.cells_written,
        formula_cells_skipped: stats.formula_cells_skipped,
        summary_rows,
        verification,
    })
}

/// Rows of `sheet` whose cell in `column` is not a formula
fn writable_rows(workbook: &Workbook, sheet: &str, rows: &[u32], column: u32) -> Vec<u32> {
    let Some(sheet) = workbook.sheet(sheet) else {
        return Vec::new();
    };
    rows.iter()
        .copied()
        .filter(|&row| !sheet.cell(row, column).is_formula())
        .collect()
}

/// Pair each sheet's share with the rows that can hold it. A sheet whose rows
/// are all formulas passes its share on to the next sheet with room; anything
/// left after the last sheet goes to the last sheet that had room.
fn place_shares(
    workbook: &Workbook,
    allocation: &Allocation,
    rows: &[u32],
    column: u32,
    stats: &mut WriteStats,
) -> Vec<(String, u64, Vec<u32>)> {
    let mut placed: Vec<(String, u64, Vec<u32>)> = Vec::new();
    let mut carry = 0;

    for (sheet, share) in allocation.iter() {
        let writable = writable_rows(workbook, sheet, rows, column);
        for &row in rows.iter().filter(|row| !writable.contains(row)) {
            warn!(sheet, cell = %cell_ref(row, column), "formula cell left untouched");
            stats.formula_cells_skipped += 1;
        }

        if writable.is_empty() {
            carry += share;
            continue;
        }
        placed.push((sheet.to_string(), share + carry, writable));
        carry = 0;
    }

    if carry > 0 {
        if let Some(last) = placed.last_mut() {
            debug!(sheet = %last.0, carry, "moving share of formula-only sheets");
            last.1 += carry;
        }
    }

    placed
}

fn write_count(workbook: &mut Workbook, sheet_name: &str, row: u32, col: u32, value: u64, stats: &mut WriteStats) {
    let Some(sheet) = workbook.sheet_mut(sheet_name) else {
        return;
    };
    if sheet.cell(row, col).is_formula() {
        warn!(sheet = sheet_name, cell = %cell_ref(row, col), "formula cell left untouched");
        stats.formula_cells_skipped += 1;
        return;
    }
    sheet.set_number(row, col, value as f64);
    stats.cells_written += 1;
}
