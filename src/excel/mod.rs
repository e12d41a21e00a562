//! Workbook documents for the traffic-count pipelines.
//!
//! This module provides:
//! - An in-memory sheet/cell model that records every write as an edit
//! - Reading xlsx containers into that model (calamine)
//! - Replaying edits onto the original container, preserving formulas and formatting (umya)

pub mod types;
pub mod workbook;
pub mod reader;
pub mod writer;
pub mod document;

// Re-export commonly used types and functions
pub use types::*;
pub use workbook::{Sheet, Workbook};
pub use reader::{cell_ref, compute_checksum, read_workbook_bytes};
pub use writer::create_backup;
pub use document::XlsxDocument;
