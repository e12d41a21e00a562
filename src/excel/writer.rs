use std::io::Cursor;
use std::path::Path;
use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use super::types::{ApplyResult, Cell, CellEdit, ExcelError};

/// Open the original container for writing, preserving formulas and formatting
fn open_book(original: &[u8]) -> Result<Spreadsheet, ExcelError> {
    reader::xlsx::read_reader(Cursor::new(original), true)
        .map_err(|e| ExcelError::read_error(format!("Failed to open workbook: {}", e)))
}

/// Apply edits to an open book. Edits targeting a missing sheet create it.
pub fn apply_edits(book: &mut Spreadsheet, edits: &[CellEdit]) -> ApplyResult {
    let mut edits_applied = 0;
    let mut errors = Vec::new();

    for edit in edits {
        if book.get_sheet_by_name(&edit.sheet).is_none() {
            if let Err(e) = book.new_sheet(&edit.sheet) {
                errors.push(format!("Sheet {}: {}", edit.sheet, e));
                continue;
            }
        }

        match book.get_sheet_by_name_mut(&edit.sheet) {
            Some(worksheet) => {
                apply_single_edit(worksheet, edit);
                edits_applied += 1;
            }
            None => errors.push(format!(
                "Sheet {}, Row {}, Col {}: sheet unavailable",
                edit.sheet, edit.row, edit.col
            )),
        }
    }

    ApplyResult {
        edits_applied,
        errors,
    }
}

/// Apply a single cell edit (row and col are already 1-based)
fn apply_single_edit(worksheet: &mut Worksheet, edit: &CellEdit) {
    let cell = worksheet.get_cell_mut((edit.col, edit.row));

    match &edit.value {
        Cell::Empty => {
            cell.set_value("");
        }
        Cell::Number(n) => {
            cell.set_value_number(*n);
        }
        Cell::Text(s) => {
            cell.set_value(s);
        }
        Cell::Formula(formula) => {
            // umya adds the leading =
            let formula_text = formula.strip_prefix('=').unwrap_or(formula);
            cell.set_formula(formula_text);
        }
    }
}

fn finish(result: ApplyResult) -> Result<u32, ExcelError> {
    if result.errors.is_empty() {
        Ok(result.edits_applied)
    } else {
        Err(ExcelError::write_error(result.errors.join("; ")))
    }
}

/// Re-open `original`, apply `edits` and serialise to bytes
pub fn write_workbook_bytes(original: &[u8], edits: &[CellEdit]) -> Result<Vec<u8>, ExcelError> {
    let mut book = open_book(original)?;
    finish(apply_edits(&mut book, edits))?;

    let mut buffer = Cursor::new(Vec::new());
    writer::xlsx::write_writer(&book, &mut buffer)
        .map_err(|e| ExcelError::write_error(format!("Failed to save workbook: {}", e)))?;

    Ok(buffer.into_inner())
}

/// Re-open `original`, apply `edits` and save to `path`
pub fn write_workbook(original: &[u8], edits: &[CellEdit], path: &str) -> Result<u32, ExcelError> {
    let mut book = open_book(original)?;
    let applied = finish(apply_edits(&mut book, edits))?;

    writer::xlsx::write(&book, Path::new(path))
        .map_err(|e| ExcelError::write_error(format!("Failed to save workbook: {}", e)))?;

    Ok(applied)
}

/// Create a backup of the file before editing
pub fn create_backup(path: &str) -> Result<String, ExcelError> {
    let file_path = Path::new(path);

    if !file_path.exists() {
        return Err(ExcelError::file_not_found(path));
    }

    let backup_name = format!(
        "{}.backup.{}",
        path,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    );

    std::fs::copy(path, &backup_name)
        .map_err(|e| ExcelError::write_error(format!("Failed to create backup: {}", e)))?;

    Ok(backup_name)
}
