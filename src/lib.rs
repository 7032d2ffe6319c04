//! Labelcore: a configuration-driven annotation model.
//!
//! A labeling configuration (element-per-tag markup such as
//! `<View><Image name="img" value="$image"/>...</View>`) is compiled into a
//! tree of live tags. Annotations made against those tags are kept in an
//! [`store::AnnotationStore`] and exchanged as flat JSON result records.
//!
//! # Modules
//!
//! - [`config`]: configuration compiler (`compile`, repeater expansion)
//! - [`registry`]: tag, region-kind and tool tables
//! - [`tags`]: live tag instances, capabilities and name maps
//! - [`model`]: regions, results, annotations and wire records
//! - [`store`]: the annotation store and its initialization boundary
//! - [`validation`]: configuration and result validators
//! - [`io`]: task files
//! - [`error`]: error types for labelcore operations

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod registry;
pub mod store;
pub mod tags;
pub mod validation;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

pub use error::LabelError;

use model::AnnotationId;
use registry::TagRegistry;
use store::{AnnotationStore, EntityRef, StoreOptions};
use tags::TagTree;
use validation::{ValidationError, ValidationReport};

/// The labelcore CLI application.
#[derive(Parser)]
#[command(name = "labelcore")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Compile a labeling configuration and print the node tree as JSON.
    Compile(CompileArgs),
    /// Validate a configuration, and optionally the results of a task.
    Validate(ValidateArgs),
    /// Print the exported results of one annotation of a task.
    Export(ExportArgs),
}

/// Arguments for the compile subcommand.
#[derive(clap::Args)]
struct CompileArgs {
    /// Labeling configuration file.
    #[arg(env = "LABELCORE_CONFIG")]
    config: PathBuf,

    /// Task file (JSON, or YAML by extension) whose data feeds repeaters.
    #[arg(long)]
    task: Option<PathBuf>,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Labeling configuration file.
    #[arg(env = "LABELCORE_CONFIG")]
    config: PathBuf,

    /// Task file whose annotations and predictions are checked as well.
    #[arg(long)]
    task: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    /// Labeling configuration file.
    #[arg(env = "LABELCORE_CONFIG")]
    config: PathBuf,

    /// Task file holding the annotations.
    #[arg(long)]
    task: PathBuf,

    /// Annotation id to export (defaults to the first annotation).
    #[arg(long)]
    annotation: Option<String>,

    /// Derive a fresh annotation from the first prediction and export it.
    #[arg(long)]
    from_prediction: bool,
}

/// Run the labelcore CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Compile(args)) => run_compile(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Export(args)) => run_export(args),
        None => {
            println!("labelcore {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Configuration-driven annotation model.");
            println!();
            println!("Run 'labelcore --help' for usage information.");
            Ok(())
        }
    }
}

fn read_config(path: &Path) -> Result<String, LabelError> {
    std::fs::read_to_string(path).map_err(LabelError::Io)
}

fn task_data(task: Option<&io::Task>) -> Value {
    task.map(|t| t.data.clone())
        .unwrap_or_else(|| Value::Object(Default::default()))
}

/// Execute the compile subcommand.
fn run_compile(args: CompileArgs) -> Result<(), LabelError> {
    let text = read_config(&args.config)?;
    let task = args.task.as_deref().map(io::read_task).transpose()?;
    let root = config::compile(&text, &task_data(task.as_ref()))?;

    let json =
        serde_json::to_string_pretty(&root).map_err(|source| LabelError::JsonWrite { source })?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct ReportJson<'a> {
    error_count: usize,
    warning_count: usize,
    errors: &'a [ValidationError],
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LabelError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(LabelError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            args.output
        )));
    }

    let text = read_config(&args.config)?;
    let task = args.task.as_deref().map(io::read_task).transpose()?;
    let registry = TagRegistry::standard();
    let root = config::compile(&text, &task_data(task.as_ref()))?;

    let mut report = validation::validate_config(&root, &registry);
    if let Some(task) = &task {
        if report.is_ok() {
            let tree = TagTree::instantiate(&registry, root)?;
            for entity in task.annotations.iter().chain(&task.predictions) {
                report.merge(validation::validate_results(&entity.result, &tree));
            }
        } else {
            warn!("configuration has errors; task results were not checked");
        }
    }

    print_report(&report, &args.output)?;

    let passed = if args.strict {
        report.is_ok_strict()
    } else {
        report.is_ok()
    };

    if !passed {
        Err(LabelError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

fn print_report(report: &ValidationReport, output: &str) -> Result<(), LabelError> {
    match output {
        "json" => {
            let json = serde_json::to_string_pretty(&ReportJson {
                error_count: report.error_count(),
                warning_count: report.warning_count(),
                errors: &report.errors,
            })
            .map_err(|source| LabelError::JsonWrite { source })?;
            println!("{json}");
        }
        _ => print!("{}", report),
    }
    Ok(())
}

/// Execute the export subcommand.
fn run_export(args: ExportArgs) -> Result<(), LabelError> {
    let text = read_config(&args.config)?;
    let task = io::read_task(&args.task)?;

    let registry = Arc::new(TagRegistry::standard());
    let root = config::compile(&text, &task.data)?;
    let mut store =
        AnnotationStore::new(registry, root, task.data.clone(), StoreOptions::default())?;
    task.load_into(&mut store);

    let selected = if args.from_prediction {
        let prediction = store
            .predictions()
            .first()
            .map(|p| p.id.clone())
            .ok_or_else(|| LabelError::AnnotationNotFound("<first prediction>".into()))?;
        let id = store.add_annotation_from_prediction(&EntityRef::Prediction(prediction))?;
        store.select_annotation(&id)?
    } else {
        let requested = args
            .annotation
            .as_deref()
            .map(AnnotationId::from)
            .unwrap_or_else(|| AnnotationId::from(""));
        store.select_annotation(&requested)?
    };

    store.run_pending(Instant::now());
    let delivered = store.validation_errors();
    if !delivered.is_clean() {
        warn!(
            errors = delivered.error_count(),
            warnings = delivered.warning_count(),
            "task contains invalid records"
        );
    }

    let records = store
        .selected()
        .map(|annotation| annotation.serialize(store.tree()))
        .unwrap_or_default();
    info!(annotation = %selected, records = records.len(), "exporting");
    println!("{}", io::to_records_string(&records)?);
    Ok(())
}
