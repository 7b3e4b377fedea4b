//! # bookdeps-formula
//!
//! Cross-workbook reference resolution for bookdeps.
//!
//! This crate provides:
//! - [`NameRegistry`] - every admissible identifier of the workbooks in a run
//! - [`first_bracketed`] / [`ReferenceToken`] - external-reference extraction
//! - [`ReferenceResolver`] - the seam the pipeline resolves formulas through,
//!   with [`PatternResolver`] as the shipped pattern-search implementation
//!
//! Resolution never fails: a formula that references nothing resolves to an
//! empty set.
//!
//! ## Example
//!
//! ```rust
//! use bookdeps_formula::{resolve, NameRegistry};
//!
//! let registry = NameRegistry::new(["X.xlsx", "Y.xlsx", "Z.xlsx"]);
//!
//! let hits = resolve("=[Y.xlsx]Sheet1!A1", "Z.xlsx", &registry);
//! assert!(hits.contains("Y.xlsx"));
//!
//! // Positional references use the 1-based upload order
//! let hits = resolve("=[2]Sheet1!A1", "Z.xlsx", &registry);
//! assert!(hits.contains("Y.xlsx"));
//! ```

pub mod reference;
pub mod registry;
pub mod resolver;

pub use reference::{first_bracketed, ReferenceToken};
pub use registry::NameRegistry;
pub use resolver::{resolve, resolve_workbook, PatternResolver, ReferenceResolver};
