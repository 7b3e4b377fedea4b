//! Worksheet type

use crate::cell::{CellAddress, FormulaCell};

/// A worksheet and the formula cells found in it
///
/// Cells keep the order they were pushed in; readers push them in document
/// (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Worksheet {
    name: String,
    formulas: Vec<FormulaCell>,
}

impl Worksheet {
    /// Create a new worksheet with no formulas
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            formulas: Vec::new(),
        }
    }

    /// Get the worksheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a formula at `address`
    pub fn push_formula(&mut self, address: CellAddress, text: impl Into<String>) {
        self.formulas.push(FormulaCell::new(address, text));
    }

    /// Iterate over the formula cells
    pub fn formula_cells(&self) -> impl Iterator<Item = &FormulaCell> {
        self.formulas.iter()
    }

    /// Get the formula text at a cell position (if there is one)
    pub fn get_formula_at(&self, row: u32, col: u16) -> Option<&str> {
        self.formulas
            .iter()
            .find(|cell| cell.address.row == row && cell.address.col == col)
            .map(|cell| cell.text.as_str())
    }

    /// Number of formula cells
    pub fn formula_count(&self) -> usize {
        self.formulas.len()
    }
}
