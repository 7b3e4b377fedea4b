//! Reference resolution - which workbooks does a formula read from?
//!
//! [`ReferenceResolver`] is the seam the analysis pipeline goes through.
//! [`PatternResolver`] implements it with a pattern search:
//!
//! 1. Formulas not starting with `=` reference nothing.
//! 2. The first bracketed token decides when it matches: a number is an
//!    upload position, anything else is compared against display names and
//!    stems, ignoring case.
//! 3. Otherwise every other workbook whose stem appears as a whole token in
//!    the formula counts. This is best effort: a stem that happens to appear
//!    in a string literal or a sheet name matches too.
//!
//! The workbook that owns the formula is never part of the result.

use std::collections::BTreeSet;

use bookdeps_core::Workbook;

use crate::reference::{first_bracketed, ReferenceToken};
use crate::registry::NameRegistry;

/// Resolves formula text to the workbooks it references
///
/// Implementations must be pure: the result may depend only on the formula,
/// the owning workbook's name and the registry. They must not fail; "no
/// reference" is an empty set.
pub trait ReferenceResolver: Send + Sync {
    /// Canonical names referenced by `formula`, excluding `self_name`
    fn resolve(&self, formula: &str, self_name: &str, registry: &NameRegistry) -> BTreeSet<String>;
}

/// Bracket-token and inline-stem pattern search
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternResolver;

impl PatternResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        Self
    }

    fn resolve_bracketed(
        token: &str,
        self_name: &str,
        registry: &NameRegistry,
    ) -> BTreeSet<String> {
        registry
            .lookup(&ReferenceToken::classify(token))
            .into_iter()
            .filter(|name| *name != self_name)
            .map(str::to_string)
            .collect()
    }

    fn resolve_inline(formula: &str, self_name: &str, registry: &NameRegistry) -> BTreeSet<String> {
        registry
            .stems_in(formula)
            .filter(|name| *name != self_name)
            .map(str::to_string)
            .collect()
    }
}

impl ReferenceResolver for PatternResolver {
    fn resolve(&self, formula: &str, self_name: &str, registry: &NameRegistry) -> BTreeSet<String> {
        if !formula.starts_with('=') {
            return BTreeSet::new();
        }

        if let Some(token) = first_bracketed(formula) {
            let hits = Self::resolve_bracketed(token, self_name, registry);
            if !hits.is_empty() {
                return hits;
            }
        }

        Self::resolve_inline(formula, self_name, registry)
    }
}

/// Resolve one formula with the default [`PatternResolver`]
pub fn resolve(formula: &str, self_name: &str, registry: &NameRegistry) -> BTreeSet<String> {
    PatternResolver.resolve(formula, self_name, registry)
}

/// Fold every formula of `workbook` into its dependency set
pub fn resolve_workbook<R>(
    workbook: &Workbook,
    registry: &NameRegistry,
    resolver: &R,
) -> BTreeSet<String>
where
    R: ReferenceResolver + ?Sized,
{
    let mut dependencies = BTreeSet::new();

    for (sheet, cell) in workbook.formulas() {
        let hits = resolver.resolve(&cell.text, workbook.name(), registry);
        if !hits.is_empty() {
            tracing::trace!(
                "{}: {}!{} {} -> {:?}",
                workbook.name(),
                sheet.name(),
                cell.address,
                cell.text,
                hits
            );
        }
        dependencies.extend(hits);
    }

    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdeps_core::{CellAddress, Worksheet};
    use pretty_assertions::assert_eq;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn xyz() -> NameRegistry {
        NameRegistry::new(["X.xlsx", "Y.xlsx", "Z.xlsx"])
    }

    #[test]
    fn test_not_a_formula() {
        let reg = xyz();
        assert_eq!(resolve("[Y.xlsx]Sheet1!A1", "X.xlsx", &reg), set(&[]));
        assert_eq!(resolve(" =[Y.xlsx]Sheet1!A1", "X.xlsx", &reg), set(&[]));
        assert_eq!(resolve("", "X.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_bracketed_name() {
        let reg = xyz();
        assert_eq!(resolve("=[Y.xlsx]Sheet1!A1", "X.xlsx", &reg), set(&["Y.xlsx"]));
        assert_eq!(resolve("=[y.XLSX]Sheet1!A1", "X.xlsx", &reg), set(&["Y.xlsx"]));
    }

    #[test]
    fn test_bracketed_stem_and_other_extension() {
        let reg = xyz();
        assert_eq!(resolve("=[Y]Sheet1!A1", "X.xlsx", &reg), set(&["Y.xlsx"]));
        assert_eq!(resolve("=[Y.xls]Sheet1!A1", "X.xlsx", &reg), set(&["Y.xlsx"]));
    }

    #[test]
    fn test_bracketed_path() {
        let reg = NameRegistry::new(["Budget 2024.xlsx", "Report.xlsx"]);
        assert_eq!(
            resolve(
                r"=SUM('C:\Finance\[Budget 2024.xlsx]Q1'!B2:B9)",
                "Report.xlsx",
                &reg
            ),
            set(&["Budget 2024.xlsx"])
        );
    }

    #[test]
    fn test_positional() {
        let reg = xyz();
        assert_eq!(resolve("=[2]Sheet1!A1", "Z.xlsx", &reg), set(&["Y.xlsx"]));
        assert_eq!(resolve("=[1]Sheet1!A1*2", "Z.xlsx", &reg), set(&["X.xlsx"]));
    }

    #[test]
    fn test_positional_out_of_range() {
        let reg = xyz();
        assert_eq!(resolve("=[7]Sheet1!A1", "Z.xlsx", &reg), set(&[]));
        assert_eq!(resolve("=[0]Sheet1!A1", "Z.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_never_self() {
        let reg = xyz();
        assert_eq!(resolve("=[X.xlsx]Sheet1!A1", "X.xlsx", &reg), set(&[]));
        assert_eq!(resolve("=[1]Sheet1!A1", "X.xlsx", &reg), set(&[]));
        assert_eq!(resolve("=X!A1", "X.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_unknown_workbook() {
        let reg = xyz();
        assert_eq!(resolve("=[Other.xlsx]Sheet1!A1", "X.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_unmatched_token_falls_back_to_inline() {
        let reg = xyz();
        assert_eq!(
            resolve("=[Other.xlsx]Sheet1!A1+Y!B2", "X.xlsx", &reg),
            set(&["Y.xlsx"])
        );
    }

    #[test]
    fn test_inline_fallback() {
        let reg = NameRegistry::new(["Budget.xlsx", "Sales.xlsx", "Summary.xlsx"]);
        assert_eq!(
            resolve("=Budget!A1+sales!B2", "Summary.xlsx", &reg),
            set(&["Budget.xlsx", "Sales.xlsx"])
        );
        assert_eq!(resolve("=BudgetTotal*2", "Summary.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_inline_matches_string_literals() {
        // Known imprecision: a stem inside a literal still counts
        let reg = NameRegistry::new(["Budget.xlsx", "Summary.xlsx"]);
        assert_eq!(
            resolve("=\"Budget\"&A1", "Summary.xlsx", &reg),
            set(&["Budget.xlsx"])
        );
    }

    #[test]
    fn test_malformed_brackets_use_inline() {
        let reg = xyz();
        assert_eq!(resolve("=[[2]]Y!A1", "X.xlsx", &reg), set(&["Y.xlsx"]));
        assert_eq!(resolve("=[2 + Z!A1", "X.xlsx", &reg), set(&["Z.xlsx"]));
        assert_eq!(resolve("=]]][[[", "X.xlsx", &reg), set(&[]));
    }

    #[test]
    fn test_first_bracket_only() {
        let reg = xyz();
        assert_eq!(
            resolve("=[Y.xlsx]S!A1+[Z.xlsx]S!A1", "X.xlsx", &reg),
            set(&["Y.xlsx"])
        );
    }

    #[test]
    fn test_duplicate_stems_resolve_to_all() {
        // Two uploads sharing a stem: a stem match returns both, a full name
        // match stays exact.
        let reg = NameRegistry::new(["Data.xlsx", "Data.xlsm", "Report.xlsx"]);
        assert_eq!(
            resolve("=[Data]Sheet1!A1", "Report.xlsx", &reg),
            set(&["Data.xlsm", "Data.xlsx"])
        );
        assert_eq!(
            resolve("=[Data.xlsm]Sheet1!A1", "Report.xlsx", &reg),
            set(&["Data.xlsm"])
        );
        assert_eq!(
            resolve("=[Data.xlsb]Sheet1!A1", "Data.xlsx", &reg),
            set(&["Data.xlsm"])
        );
    }

    #[test]
    fn test_resolve_workbook_unions_formulas() {
        let reg = xyz();
        let mut sheet = Worksheet::new("Sheet1");
        sheet.push_formula(CellAddress::new(0, 0), "=[2]Sheet1!A1");
        sheet.push_formula(CellAddress::new(1, 0), "=[Y.xlsx]Sheet1!A2");
        sheet.push_formula(CellAddress::new(2, 0), "=X!A1");
        sheet.push_formula(CellAddress::new(3, 0), "=[Z.xlsx]Sheet1!A1");
        let wb = Workbook::new("Z.xlsx", vec![sheet]);

        assert_eq!(
            resolve_workbook(&wb, &reg, &PatternResolver::new()),
            set(&["X.xlsx", "Y.xlsx"])
        );
    }

    struct Nothing;

    impl ReferenceResolver for Nothing {
        fn resolve(&self, _: &str, _: &str, _: &NameRegistry) -> BTreeSet<String> {
            BTreeSet::new()
        }
    }

    #[test]
    fn test_resolver_is_pluggable() {
        let reg = xyz();
        let mut sheet = Worksheet::new("Sheet1");
        sheet.push_formula(CellAddress::new(0, 0), "=[2]Sheet1!A1");
        let wb = Workbook::new("Z.xlsx", vec![sheet]);

        let resolver: &dyn ReferenceResolver = &Nothing;
        assert!(resolve_workbook(&wb, &reg, resolver).is_empty());
    }
}
