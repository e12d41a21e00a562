use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::types::*;
use super::workbook::{Sheet, Workbook};

/// Read the container at `path` into memory, returning its bytes and model
pub fn read_workbook(path: &str) -> Result<(Vec<u8>, Workbook), ExcelError> {
    let file_path = Path::new(path);

    if !file_path.exists() {
        return Err(ExcelError::file_not_found(path));
    }

    let bytes = std::fs::read(file_path)
        .map_err(|e| ExcelError::read_error(format!("Failed to read {}: {}", path, e)))?;
    let workbook = read_workbook_bytes(&bytes)?;

    Ok((bytes, workbook))
}

/// Parse a workbook container held in memory
pub fn read_workbook_bytes(bytes: &[u8]) -> Result<Workbook, ExcelError> {
    let mut sheets: Sheets<_> = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExcelError::invalid_format(format!("Failed to open workbook: {}", e)))?;

    let sheet_names = sheets.sheet_names().to_vec();
    let mut workbook = Workbook::new();

    for name in &sheet_names {
        workbook.push_sheet(read_sheet(&mut sheets, name)?);
    }

    Ok(workbook)
}

/// Load one sheet: values first, then formulas on top so they win
fn read_sheet<RS: Read + Seek>(sheets: &mut Sheets<RS>, name: &str) -> Result<Sheet, ExcelError> {
    let mut sheet = Sheet::new(name);

    let values = sheets
        .worksheet_range(name)
        .map_err(|e| ExcelError::read_error(format!("Failed to read sheet '{}': {}", name, e)))?;
    load_values(&mut sheet, &values);

    // Formula extraction is best-effort: some containers carry no formula part
    if let Ok(formulas) = sheets.worksheet_formula(name) {
        load_formulas(&mut sheet, &formulas);
    }

    Ok(sheet)
}

fn load_values(sheet: &mut Sheet, range: &Range<Data>) {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (row_idx, col_idx, data) in range.used_cells() {
        let row = start_row + row_idx as u32 + 1;
        let col = start_col + col_idx as u32 + 1;
        sheet.load(row, col, convert_cell_value(data));
    }
}

fn load_formulas(sheet: &mut Sheet, range: &Range<String>) {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    for (row_idx, col_idx, formula) in range.used_cells() {
        if formula.is_empty() {
            continue;
        }
        let row = start_row + row_idx as u32 + 1;
        let col = start_col + col_idx as u32 + 1;
        let text = if formula.starts_with('=') {
            formula.clone()
        } else {
            format!("={}", formula)
        };
        sheet.load(row, col, Cell::Formula(text));
    }
}

/// Convert calamine Data to our Cell
fn convert_cell_value(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        // Booleans and dates are never counts
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Cell::Text(dt.as_f64().to_string()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

/// Convert column index (0-based) to Excel column letter (A, B, ..., Z, AA, AB, ...)
fn column_index_to_letter(index: u32) -> String {
    let mut result = String::new();
    let mut n = index + 1;

    while n > 0 {
        n -= 1;
        let c = (b'A' + (n % 26) as u8) as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// A1-style reference for a 1-based (row, col)
pub fn cell_ref(row: u32, col: u32) -> String {
    format!("{}{}", column_index_to_letter(col.saturating_sub(1)), row)
}

/// Compute SHA-256 checksum of a file
pub fn compute_checksum(path: &str) -> Result<String, ExcelError> {
    let mut file = File::open(path)
        .map_err(|e| ExcelError::read_error(format!("Failed to open file for checksum: {}", e)))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)
            .map_err(|e| ExcelError::read_error(format!("Failed to read file for checksum: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
