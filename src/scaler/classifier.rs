use super::types::{ColumnRange, LabelRule};
use crate::excel::Sheet;

/// Whether `row` is a data row: a text label in column 1 and at least one
/// positive number inside `columns`.
pub fn is_data_row(sheet: &Sheet, row: u32, columns: &ColumnRange, rule: LabelRule) -> bool {
    let Some(label) = sheet.cell(row, 1).label() else {
        return false;
    };

    if rule == LabelRule::Strict && label.trim().chars().count() <= 2 {
        return false;
    }

    columns
        .iter()
        .any(|col| sheet.cell(row, col).number().is_some_and(|n| n > 0.0))
}
