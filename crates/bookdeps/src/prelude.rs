//! Prelude module - common imports for bookdeps users
//!
//! ```rust
//! use bookdeps::prelude::*;
//! ```

pub use crate::{
    // Analysis
    analyze,
    analyze_paths,
    AnalysisError,
    AnalysisOptions,
    AnalysisResult,
    AnalysisRun,
    // Model types
    CellAddress,
    // Output
    DependencyGraph,
    DependencyReport,
    DependencyRow,
    LoadOptions,
    // Resolution
    PatternResolver,
    ReferenceResolver,
    Workbook,
    // Input
    WorkbookSource,
    Worksheet,
};
