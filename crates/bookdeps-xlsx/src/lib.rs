//! # bookdeps-xlsx
//!
//! XLSX (Office Open XML) reader for bookdeps.
//!
//! The reader only extracts what dependency analysis needs: sheet names and
//! the formula text of every formula cell.

pub mod error;
pub mod reader;

#[cfg(any(test, feature = "test-util"))]
pub mod fixture;

pub use error::{XlsxError, XlsxResult};
pub use reader::{LoadOptions, XlsxReader};
