//! Workbook type - a named, read-only collection of worksheets

use crate::cell::FormulaCell;
use crate::worksheet::Worksheet;

/// A loaded workbook
///
/// The display name is the workbook's identity throughout an analysis run.
/// Workbooks are built once by a reader and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Workbook {
    name: String,
    worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create a workbook from its display name and sheets
    pub fn new(name: impl Into<String>, worksheets: Vec<Worksheet>) -> Self {
        Self {
            name: name.into(),
            worksheets,
        }
    }

    /// Display name, including the extension
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name without its extension
    pub fn stem(&self) -> &str {
        file_stem(&self.name)
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Iterate over all worksheets
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Iterate over every formula together with its sheet, in sheet order
    pub fn formulas(&self) -> impl Iterator<Item = (&Worksheet, &FormulaCell)> {
        self.worksheets
            .iter()
            .flat_map(|ws| ws.formula_cells().map(move |cell| (ws, cell)))
    }

    /// Total number of formula cells across all sheets
    pub fn formula_count(&self) -> usize {
        self.worksheets.iter().map(Worksheet::formula_count).sum()
    }
}

/// Strip the trailing extension from a display name
///
/// A leading dot (`.hidden`) or a trailing one (`name.`) is not treated as
/// an extension separator.
///
/// ```
/// use bookdeps_core::file_stem;
///
/// assert_eq!(file_stem("Budget.xlsx"), "Budget");
/// assert_eq!(file_stem("Q1.Budget.xlsx"), "Q1.Budget");
/// assert_eq!(file_stem("Budget"), "Budget");
/// ```
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => &name[..idx],
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CellAddress;

    fn sample() -> Workbook {
        let mut first = Worksheet::new("Summary");
        first.push_formula(CellAddress::new(0, 0), "=Data!A1");
        let mut second = Worksheet::new("Data");
        second.push_formula(CellAddress::new(2, 1), "=[Budget.xlsx]Sheet1!A1");
        second.push_formula(CellAddress::new(3, 1), "=B3+1");
        Workbook::new("Report.xlsx", vec![first, second])
    }

    #[test]
    fn test_names() {
        let wb = sample();
        assert_eq!(wb.name(), "Report.xlsx");
        assert_eq!(wb.stem(), "Report");
    }

    #[test]
    fn test_formulas_in_sheet_order() {
        let wb = sample();
        let found: Vec<_> = wb
            .formulas()
            .map(|(ws, cell)| (ws.name(), cell.address.to_string()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("Summary", "A1".to_string()),
                ("Data", "B3".to_string()),
                ("Data", "B4".to_string()),
            ]
        );
        assert_eq!(wb.formula_count(), 3);
    }

    #[test]
    fn test_worksheet_lookup() {
        let wb = sample();
        assert_eq!(wb.sheet_count(), 2);
        assert_eq!(wb.worksheet(1).map(Worksheet::name), Some("Data"));
        assert!(wb.worksheet_by_name("Data").is_some());
        assert!(wb.worksheet_by_name("Missing").is_none());
    }

    #[test]
    fn test_file_stem_edge_cases() {
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("trailing."), "trailing.");
        assert_eq!(file_stem("a.b.c"), "a.b");
        assert_eq!(file_stem(""), "");
    }
}
