//! Formula cell type

use super::CellAddress;

/// A cell whose stored content is a formula
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormulaCell {
    /// Where the formula lives in its sheet
    pub address: CellAddress,
    /// Literal formula text, always starting with `=`
    pub text: String,
}

impl FormulaCell {
    /// Create a formula cell, prefixing `=` when the stored text lacks it
    pub fn new(address: CellAddress, text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.starts_with('=') {
            text
        } else {
            format!("={}", text)
        };
        Self { address, text }
    }
}
