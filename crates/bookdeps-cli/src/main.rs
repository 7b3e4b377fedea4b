//! bookdeps CLI - cross-workbook dependency analysis

use anyhow::{Context, Result};
use bookdeps::prelude::*;
use bookdeps::{collect_all, resolve, NameRegistry};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const NO_DEPENDENCIES: &str = "No direct dependencies found between the supplied workbooks.";

#[derive(Parser)]
#[command(name = "bookdeps")]
#[command(
    author,
    version,
    about = "Find which spreadsheets read from which"
)]
struct Cli {
    /// Log progress to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph of a set of workbooks
    Analyze {
        /// Workbooks, directories of workbooks, or zip archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Read cached values only (finds no formula references)
        #[arg(long)]
        cached_values: bool,

        /// Resolve workbooks on a single thread
        #[arg(long)]
        sequential: bool,
    },

    /// List every formula of the given workbooks
    Formulas {
        /// Workbooks, directories of workbooks, or zip archives
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Print the loaded workbooks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a single formula against a list of workbook names
    Resolve {
        /// Formula text, including the leading '='
        formula: String,

        /// Name of the workbook that owns the formula
        #[arg(long = "self", value_name = "NAME")]
        self_name: String,

        /// Workbook names in upload order
        #[arg(short, long = "workbook", value_name = "NAME")]
        workbooks: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned "file / depends on" table
    Table,
    /// Graphviz digraph
    Dot,
    /// JSON report
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            inputs,
            format,
            output,
            cached_values,
            sequential,
        } => {
            let mut options = AnalysisOptions::default();
            if cached_values {
                options = options.cached_values();
            }
            if sequential {
                options = options.sequential();
            }
            analyze_inputs(&inputs, format, output.as_deref(), &options)
        }
        Commands::Formulas { inputs, json } => list_formulas(&inputs, json),
        Commands::Resolve {
            formula,
            self_name,
            workbooks,
        } => resolve_formula(&formula, &self_name, &workbooks),
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_sources(inputs: &[PathBuf]) -> Result<Vec<WorkbookSource>> {
    let sources = collect_all(inputs).context("Failed to read input")?;
    tracing::debug!("{} workbooks from {} inputs", sources.len(), inputs.len());
    Ok(sources)
}

fn analyze_inputs(
    inputs: &[PathBuf],
    format: OutputFormat,
    output: Option<&Path>,
    options: &AnalysisOptions,
) -> Result<()> {
    let sources = load_sources(inputs)?;
    let report = analyze(&sources, options).context("Analysis failed")?;

    let rendered = match format {
        OutputFormat::Table => render_table(&report),
        OutputFormat::Dot => report.graph.to_dot(),
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            json.push('\n');
            json
        }
    };

    if report.no_dependencies && format != OutputFormat::Table {
        eprintln!("{}", NO_DEPENDENCIES);
    }

    if let Some(output_path) = output {
        std::fs::write(output_path, &rendered)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} workbooks, {} dependencies to '{}'",
            report.graph.node_count(),
            report.table.len(),
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

/// Render the dependency table, or the empty-state message
fn render_table(report: &DependencyReport) -> String {
    if report.no_dependencies {
        return format!("{}\n", NO_DEPENDENCIES);
    }

    let width = report
        .table
        .iter()
        .map(|row| row.file.chars().count())
        .chain(std::iter::once("File".len()))
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<width$}  {}\n", "File", "Depends on");
    for row in &report.table {
        out.push_str(&format!("{:<width$}  {}\n", row.file, row.depends_on));
    }
    out
}

fn list_formulas(inputs: &[PathBuf], json: bool) -> Result<()> {
    let sources = load_sources(inputs)?;
    let run = AnalysisRun::load(&sources, &AnalysisOptions::default())
        .context("Failed to load workbooks")?;

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, run.workbooks())
            .context("Failed to serialize workbooks")?;
        writeln!(stdout).context("Failed to write to stdout")?;
        return Ok(());
    }

    for workbook in run.workbooks() {
        for (sheet, cell) in workbook.formulas() {
            writeln!(
                stdout,
                "{}\t{}!{}\t{}",
                workbook.name(),
                sheet.name(),
                cell.address,
                cell.text
            )
            .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

fn resolve_formula(formula: &str, self_name: &str, workbooks: &[String]) -> Result<()> {
    let registry = NameRegistry::new(workbooks);
    let hits = resolve(formula, self_name, &registry);

    if hits.is_empty() {
        eprintln!("No workbook referenced");
    }
    for name in hits {
        println!("{}", name);
    }

    Ok(())
}
