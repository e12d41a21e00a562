use tracing::debug;

use super::types::DirectionRows;
use crate::excel::Sheet;

/// Rows scanned by default when looking for direction labels
pub const DEFAULT_SCAN_LIMIT: u32 = 99;

/// Find the rows of `sheet` labelled with each direction.
///
/// Rows `1..=scan_limit` are scanned. A row belongs to the first direction
/// whose name appears (case-insensitively) in its column-1 text, and only if
/// column 2 is not a formula. Directions with no rows are left out.
pub fn locate_direction_rows(sheet: &Sheet, directions: &[String], scan_limit: u32) -> DirectionRows {
    let needles: Vec<String> = directions.iter().map(|d| d.to_lowercase()).collect();
    let mut found = DirectionRows::new();

    for row in 1..=scan_limit {
        let Some(label) = sheet.cell(row, 1).label() else {
            continue;
        };
        let label = label.to_lowercase();

        let Some(index) = needles.iter().position(|needle| label.contains(needle.as_str())) else {
            continue;
        };

        if sheet.cell(row, 2).is_formula() {
            debug!(row, direction = %directions[index], "skipping subtotal row");
            continue;
        }

        found.push(&directions[index], row);
    }

    found
}
