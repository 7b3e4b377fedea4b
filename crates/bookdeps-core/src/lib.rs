//! # bookdeps-core
//!
//! Core data structures for the bookdeps workbook dependency analyzer.
//!
//! This crate provides the read-only model every other crate works on:
//! - [`Workbook`] - A named workbook with its worksheets
//! - [`Worksheet`] - A named sheet holding the formula cells found in it
//! - [`FormulaCell`] and [`CellAddress`] - One formula and where it lives
//!
//! Only formula cells are modelled. Plain values never reach this layer.
//!
//! ## Example
//!
//! ```rust
//! use bookdeps_core::{CellAddress, Workbook, Worksheet};
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.push_formula(CellAddress::parse("B2").unwrap(), "=[Budget.xlsx]Sheet1!A1");
//!
//! let workbook = Workbook::new("Report.xlsx", vec![sheet]);
//! assert_eq!(workbook.stem(), "Report");
//! assert_eq!(workbook.formula_count(), 1);
//! ```

pub mod cell;
pub mod error;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, FormulaCell};
pub use error::{Error, Result};
pub use workbook::{file_stem, Workbook};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
