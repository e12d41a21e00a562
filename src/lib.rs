//! Post-processing for traffic-count workbooks.
//!
//! Two batch transformations over xlsx workbooks with one sheet per hour:
//! - [`scaler`] multiplies the vehicle counts of the hourly sheets by a percentage
//! - [`totals`] forces per-direction class totals onto the hourly sheets
//!
//! [`commands`] exposes both to the CLI and to a JSON request handler.

pub mod commands;
pub mod config;
pub mod error;
pub mod excel;
pub mod random;
pub mod scaler;
pub mod totals;

pub use error::{ProcessError, Result};
