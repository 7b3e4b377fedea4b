//! # bookdeps
//!
//! Cross-workbook dependency graphs for collections of spreadsheets.
//!
//! Given a set of workbooks, bookdeps scans every formula for references to
//! the other workbooks in the set and reports which file depends on which.
//!
//! ## Features
//!
//! - Read XLSX / XLSM workbooks (Office Open XML)
//! - Resolve `[Book.xlsx]Sheet!A1`, positional `[2]Sheet!A1` and inline
//!   workbook-name references
//! - Flatten files, directories and zip archives into one input set
//! - Dependency graph with Graphviz DOT and JSON output
//!
//! ## Example
//!
//! ```rust
//! use bookdeps::prelude::*;
//!
//! let mut sheet = Worksheet::new("Sheet1");
//! sheet.push_formula(CellAddress::new(0, 0), "=[B.xlsx]Sheet1!A1");
//!
//! let run = AnalysisRun::from_workbooks(vec![
//!     Workbook::new("A.xlsx", vec![sheet]),
//!     Workbook::new("B.xlsx", vec![Worksheet::new("Sheet1")]),
//! ]);
//! let report = run.report_with(&PatternResolver, false);
//!
//! assert_eq!(report.graph.edges().collect::<Vec<_>>(), vec![("B.xlsx", "A.xlsx")]);
//! assert!(report.has_dependencies());
//! ```

pub mod error;
pub mod graph;
pub mod prelude;
pub mod report;
pub mod run;
pub mod source;

pub use error::{AnalysisError, AnalysisResult, LoadError, LoadErrorKind};
pub use graph::DependencyGraph;
pub use report::{DependencyReport, DependencyRow};
pub use run::{AnalysisOptions, AnalysisRun};
pub use source::{
    collect_all, collect_sources, is_spreadsheet_name, sources_from_archive, WorkbookSource,
};

// Re-export core types
pub use bookdeps_core::{file_stem, CellAddress, FormulaCell, Workbook, Worksheet};

// Re-export resolver types
pub use bookdeps_formula::{resolve, NameRegistry, PatternResolver, ReferenceResolver};

// Re-export I/O types
pub use bookdeps_xlsx::{LoadOptions, XlsxError, XlsxReader};

use std::path::Path;

/// Analyze a set of named workbooks with the default [`PatternResolver`]
pub fn analyze(
    sources: &[WorkbookSource],
    options: &AnalysisOptions,
) -> AnalysisResult<DependencyReport> {
    analyze_with(sources, options, &PatternResolver)
}

/// Analyze a set of named workbooks with a custom resolver
pub fn analyze_with<R>(
    sources: &[WorkbookSource],
    options: &AnalysisOptions,
    resolver: &R,
) -> AnalysisResult<DependencyReport>
where
    R: ReferenceResolver + ?Sized,
{
    tracing::debug!("loading {} workbooks", sources.len());
    let run = AnalysisRun::load(sources, options)?;
    Ok(run.report_with(resolver, options.parallel))
}

/// Flatten files, directories and zip archives, then analyze them
pub fn analyze_paths<I, P>(paths: I, options: &AnalysisOptions) -> AnalysisResult<DependencyReport>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let sources = collect_all(paths)?;
    analyze(&sources, options)
}
