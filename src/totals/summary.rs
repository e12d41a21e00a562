use tracing::info;

use super::types::DirectionTotals;
use super::{FIRST_CLASS_COLUMN, GRAND_TOTAL_COLUMN};
use crate::excel::{Cell, Workbook};

/// Rows scanned by default when looking for existing summary rows
pub const DEFAULT_SUMMARY_SCAN_LIMIT: u32 = 199;
/// Title row of a freshly created summary block
pub const SUMMARY_BLOCK_ROW: u32 = 50;
pub const SUMMARY_TITLE: &str = "DAILY TOTALS SUMMARY";

/// Overwrite the summary rows of `sheet_name` with the exact targets.
///
/// Existing rows are found by direction name in column 1 (a later row for the
/// same direction replaces an earlier one). With no existing rows a new block
/// is written at [`SUMMARY_BLOCK_ROW`]. Formulas in the written cells are
/// replaced by values. Returns `None` when the sheet does not exist.
pub fn rewrite_summary(
    workbook: &mut Workbook,
    sheet_name: &str,
    totals: &[DirectionTotals],
    scan_limit: u32,
) -> Option<Vec<(String, u32)>> {
    let sheet = workbook.sheet_mut(sheet_name)?;

    let mut found: Vec<(String, u32)> = Vec::new();
    for row in 1..=scan_limit {
        let Some(label) = sheet.cell(row, 1).label() else {
            continue;
        };
        let label = label.to_lowercase();
        let Some(direction) = totals
            .iter()
            .find(|d| label.contains(&d.name.to_lowercase()))
        else {
            continue;
        };

        match found.iter_mut().find(|(name, _)| *name == direction.name) {
            Some(entry) => entry.1 = row,
            None => found.push((direction.name.clone(), row)),
        }
    }

    if found.is_empty() {
        sheet.set(SUMMARY_BLOCK_ROW, 1, Cell::from(SUMMARY_TITLE));
        for (index, direction) in totals.iter().enumerate() {
            let row = SUMMARY_BLOCK_ROW + 2 + index as u32;
            sheet.set(row, 1, Cell::Text(direction.name.clone()));
            found.push((direction.name.clone(), row));
        }
    }

    let mut written = Vec::new();
    for direction in totals {
        let Some(&(_, row)) = found.iter().find(|(name, _)| *name == direction.name) else {
            continue;
        };

        for (index, &total) in direction.totals.iter().enumerate() {
            sheet.set_number(row, FIRST_CLASS_COLUMN + index as u32, total as f64);
        }
        sheet.set_number(row, GRAND_TOTAL_COLUMN, direction.grand_total() as f64);

        info!(
            sheet = sheet_name,
            direction = %direction.name,
            row,
            total = direction.grand_total(),
            "summary row set"
        );
        written.push((direction.name.clone(), row));
    }

    Some(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::Sheet;

    fn totals() -> Vec<DirectionTotals> {
        vec![
            DirectionTotals::new("Bisil Bound", vec![1, 2, 3]),
            DirectionTotals::new("Athi River Bound", vec![4, 5, 6]),
        ]
    }

    #[test]
    fn test_overwrites_existing_rows_and_formulas() {
        let mut workbook = Workbook::with_sheets(vec![Sheet::from_rows(
            "DAY",
            vec![
                vec![Cell::from("Direction")],
                vec![Cell::from("Bisil Bound"), Cell::from("='7-8AM'!B2+'8-9AM'!B2")],
                vec![Cell::from("Athi River Bound"), Cell::Number(99.0)],
            ],
        )]);

        let written = rewrite_summary(&mut workbook, "DAY", &totals(), DEFAULT_SUMMARY_SCAN_LIMIT).unwrap();
        assert_eq!(
            written,
            vec![("Bisil Bound".to_string(), 2), ("Athi River Bound".to_string(), 3)]
        );

        let day = workbook.sheet("DAY").unwrap();
        assert_eq!(day.cell(2, 2), &Cell::Number(1.0));
        assert_eq!(day.cell(2, 14), &Cell::Number(6.0));
        assert_eq!(day.cell(3, 4), &Cell::Number(6.0));
        assert_eq!(day.cell(3, 14), &Cell::Number(15.0));
    }

    #[test]
    fn test_later_row_replaces_earlier() {
        let mut workbook = Workbook::with_sheets(vec![Sheet::from_rows(
            "DAY",
            vec![
                vec![Cell::from("Bisil Bound (AM)")],
                vec![Cell::from("Bisil Bound (day)")],
            ],
        )]);
        let written = rewrite_summary(&mut workbook, "DAY", &totals()[..1], DEFAULT_SUMMARY_SCAN_LIMIT).unwrap();
        assert_eq!(written, vec![("Bisil Bound".to_string(), 2)]);
    }

    #[test]
    fn test_creates_block_when_no_rows_exist() {
        let mut workbook = Workbook::with_sheets(vec![Sheet::new("DAY")]);

        let written = rewrite_summary(&mut workbook, "DAY", &totals(), DEFAULT_SUMMARY_SCAN_LIMIT).unwrap();
        assert_eq!(
            written,
            vec![("Bisil Bound".to_string(), 52), ("Athi River Bound".to_string(), 53)]
        );

        let day = workbook.sheet("DAY").unwrap();
        assert_eq!(day.cell(50, 1), &Cell::Text(SUMMARY_TITLE.to_string()));
        assert_eq!(day.cell(53, 1), &Cell::Text("Athi River Bound".to_string()));
        assert_eq!(day.cell(52, 14), &Cell::Number(6.0));
    }

    #[test]
    fn test_missing_sheet_is_noop() {
        let mut workbook = Workbook::with_sheets(vec![Sheet::new("7-8AM")]);
        assert!(rewrite_summary(&mut workbook, "DAY", &totals(), DEFAULT_SUMMARY_SCAN_LIMIT).is_none());
        assert!(workbook.edits().is_empty());
    }
}
