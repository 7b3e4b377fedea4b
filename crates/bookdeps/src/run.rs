//! Per-run analysis context
//!
//! An [`AnalysisRun`] owns the loaded workbooks and the name registry built
//! from them. Nothing outlives the run, so a second analysis never sees a
//! workbook from the first.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use bookdeps_core::Workbook;
use bookdeps_formula::{resolve_workbook, NameRegistry, ReferenceResolver};
use bookdeps_xlsx::{LoadOptions, XlsxReader};
use rayon::prelude::*;

use crate::error::{AnalysisError, AnalysisResult, LoadError, LoadErrorKind};
use crate::report::DependencyReport;
use crate::source::WorkbookSource;

/// Options for an analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Options passed to the workbook reader
    pub load: LoadOptions,
    /// Resolve workbooks in parallel
    pub parallel: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            parallel: true,
        }
    }
}

impl AnalysisOptions {
    /// Read cached values only; no formula text is returned
    pub fn cached_values(mut self) -> Self {
        self.load.raw_formulas = false;
        self
    }

    /// Resolve workbooks one after another
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Workbooks and registry for one analysis
#[derive(Debug)]
pub struct AnalysisRun {
    workbooks: Vec<Workbook>,
    registry: NameRegistry,
}

impl AnalysisRun {
    /// Load every source, in order, and freeze the registry
    ///
    /// The first workbook that fails to load aborts the run.
    pub fn load(sources: &[WorkbookSource], options: &AnalysisOptions) -> AnalysisResult<Self> {
        if sources.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let mut seen = HashSet::with_capacity(sources.len());
        for source in sources {
            if !seen.insert(source.name.as_str()) {
                return Err(AnalysisError::DuplicateName(source.name.clone()));
            }
        }

        let mut workbooks = Vec::with_capacity(sources.len());
        for source in sources {
            workbooks.push(load_source(source, &options.load)?);
        }

        Ok(Self::from_workbooks(workbooks))
    }

    /// Build a run from already loaded workbooks, keeping their order
    pub fn from_workbooks(workbooks: Vec<Workbook>) -> Self {
        let registry = NameRegistry::new(workbooks.iter().map(Workbook::name));
        Self {
            workbooks,
            registry,
        }
    }

    /// Loaded workbooks in upload order
    pub fn workbooks(&self) -> &[Workbook] {
        &self.workbooks
    }

    /// Registry of every admissible workbook identifier
    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    /// Names of the loaded workbooks in upload order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workbooks.iter().map(Workbook::name)
    }

    /// Dependency set of every workbook, keyed by workbook name
    pub fn resolve_with<R>(&self, resolver: &R, parallel: bool) -> BTreeMap<String, BTreeSet<String>>
    where
        R: ReferenceResolver + ?Sized,
    {
        let registry = &self.registry;
        let resolve_one = |workbook: &Workbook| {
            (
                workbook.name().to_string(),
                resolve_workbook(workbook, registry, resolver),
            )
        };

        if parallel {
            self.workbooks.par_iter().map(resolve_one).collect()
        } else {
            self.workbooks.iter().map(resolve_one).collect()
        }
    }

    /// Resolve every workbook and assemble the report
    pub fn report_with<R>(&self, resolver: &R, parallel: bool) -> DependencyReport
    where
        R: ReferenceResolver + ?Sized,
    {
        let dependencies = self.resolve_with(resolver, parallel);
        let report = DependencyReport::assemble(self.names(), &dependencies);
        tracing::debug!(
            "{} workbooks, {} dependencies",
            report.graph.node_count(),
            report.table.len()
        );
        report
    }
}

fn load_source(source: &WorkbookSource, options: &LoadOptions) -> Result<Workbook, LoadError> {
    let load_error = |kind: LoadErrorKind| LoadError {
        name: source.name.clone(),
        kind,
    };

    match source.extension().as_deref() {
        Some("xlsx") | Some("xlsm") => {}
        _ => return Err(load_error(LoadErrorKind::UnsupportedFormat)),
    }

    XlsxReader::read_bytes(&source.name, &source.bytes, options)
        .map_err(|e| load_error(e.into()))
}
