use super::reader::{read_workbook, read_workbook_bytes};
use super::types::ExcelError;
use super::workbook::Workbook;
use super::writer::{write_workbook, write_workbook_bytes};

/// A workbook container loaded into memory.
///
/// The original bytes are kept so that saving re-opens the container and only
/// replays the edits recorded on [`Workbook`], leaving everything else as it was.
#[derive(Debug, Clone)]
pub struct XlsxDocument {
    original: Vec<u8>,
    workbook: Workbook,
}

impl XlsxDocument {
    pub fn open(path: &str) -> Result<Self, ExcelError> {
        let (original, workbook) = read_workbook(path)?;
        Ok(XlsxDocument { original, workbook })
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExcelError> {
        let workbook = read_workbook_bytes(&bytes)?;
        Ok(XlsxDocument {
            original: bytes,
            workbook,
        })
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn workbook_mut(&mut self) -> &mut Workbook {
        &mut self.workbook
    }

    pub fn save(&self, path: &str) -> Result<u32, ExcelError> {
        write_workbook(&self.original, &self.workbook.edits(), path)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ExcelError> {
        write_workbook_bytes(&self.original, &self.workbook.edits())
    }
}
