use std::collections::{BTreeMap, BTreeSet};

use super::types::{Cell, CellEdit};

static EMPTY: Cell = Cell::Empty;

/// A single sheet: sparse grid of cells addressed by 1-based (row, col)
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    dirty: BTreeSet<(u32, u32)>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            cells: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Build a sheet from 1-based rows of cells, starting at row 1 column 1
    pub fn from_rows<I, R>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Cell>,
    {
        let mut sheet = Sheet::new(name);
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, cell) in row.into_iter().enumerate() {
                sheet.load((row_idx + 1) as u32, (col_idx + 1) as u32, cell);
            }
        }
        sheet
    }

    /// Cell at (row, col); out-of-range positions read as empty
    pub fn cell(&self, row: u32, col: u32) -> &Cell {
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }

    /// Store a value without marking it as an edit (used while loading)
    pub(crate) fn load(&mut self, row: u32, col: u32, cell: Cell) {
        if cell.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), cell);
        }
    }

    /// Overwrite a cell and record the edit
    pub fn set(&mut self, row: u32, col: u32, cell: Cell) {
        self.load(row, col, cell);
        self.dirty.insert((row, col));
    }

    pub fn set_number(&mut self, row: u32, col: u32, value: f64) {
        self.set(row, col, Cell::Number(value));
    }

    pub fn max_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }

    pub fn has_edits(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Pending edits in row-major order
    pub fn edits(&self) -> impl Iterator<Item = CellEdit> + '_ {
        self.dirty.iter().map(move |&(row, col)| CellEdit {
            sheet: self.name.clone(),
            row,
            col,
            value: self.cell(row, col).clone(),
        })
    }

    pub fn clear_edits(&mut self) {
        self.dirty.clear();
    }
}

/// Ordered collection of sheets, the in-memory side of a workbook container
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Workbook { sheets: Vec::new() }
    }

    pub fn with_sheets(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Append a sheet, replacing any sheet that already has the same name
    pub fn push_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }

    /// All pending edits across sheets, in sheet order
    pub fn edits(&self) -> Vec<CellEdit> {
        self.sheets.iter().flat_map(|s| s.edits()).collect()
    }
}
