//! Cell-related types
//!
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`FormulaCell`] - A formula and the address it was found at

mod address;
mod formula;

pub use address::CellAddress;
pub use formula::FormulaCell;
