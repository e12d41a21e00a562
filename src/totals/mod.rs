//! Forcing per-direction class totals across hourly sheets.
//!
//! This module provides:
//! - Locating the rows of each direction on a reference sheet
//! - An exact-sum weighted redistribution of each total over the hours
//! - Rewriting the summary sheet with the targets
//! - Read-only verification of the result

pub mod types;
pub mod locator;
pub mod allocation;
pub mod summary;
pub mod verify;
pub mod pipeline;

/// Vehicle classes per direction
pub const VEHICLE_CLASSES: usize = 12;
/// Column of the first vehicle class (B)
pub const FIRST_CLASS_COLUMN: u32 = 2;
/// Column of the summary grand total (N)
pub const GRAND_TOTAL_COLUMN: u32 = FIRST_CLASS_COLUMN + VEHICLE_CLASSES as u32;

pub use types::*;
pub use allocation::{redistribute, split_across_rows, Allocation, DistributionStrategy};
pub use locator::locate_direction_rows;
pub use summary::rewrite_summary;
pub use verify::{verify_totals, MatchStatus, VerificationReport};
pub use pipeline::force_exact_totals;
