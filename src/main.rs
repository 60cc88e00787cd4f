// src/main.rs
mod utils;
mod bom;
mod extractors;
mod render;
mod storage;

use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use utils::AppError;
use bom::BomBuilder;
use extractors::Document;
use render::{BomRenderer, DEFAULT_TEMPLATE};
use storage::StorageManager;

/// Turns the pipe-delimited tables of a text document into a bill of materials report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input text document
    #[arg(short, long)]
    input: PathBuf,

    /// Output file name (default: <input>_output<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template name
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    template: String,

    /// Directory searched for templates before the built-in ones
    #[arg(long, env = "BOM_TEMPLATE_DIR")]
    template_dir: Option<PathBuf>,

    /// Print the rendered report to the console
    #[arg(short, long)]
    console: bool,

    /// Also write a JSON summary of the bill of materials to <output>.json
    #[arg(long)]
    metadata: bool,

    /// Overwrite an existing output file without asking
    #[arg(short, long)]
    yes: bool,
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting processing for args: {:?}", args);

    let stdin = std::io::stdin();
    let result = run(&args, &mut stdin.lock(), &mut std::io::stdout());
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

/// `input.txt` -> `input_output.txt`, in the same directory.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = input
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    input.with_file_name(format!("{}_output{}", stem, suffix))
}

/// Asks before overwriting; only "yes" or "y" (any case) confirms.
fn confirm_overwrite<R: BufRead, W: Write>(
    path: &Path,
    input: &mut R,
    out: &mut W,
) -> Result<bool, AppError> {
    write!(
        out,
        "Warning: Output file '{}' already exists, are you ok with this overwriting? (yes/no): ",
        path.display()
    )?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "yes" || answer == "y")
}

fn run<R: BufRead, W: Write>(args: &Args, input: &mut R, out: &mut W) -> Result<(), AppError> {
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    // 3. Validate inputs before doing any work
    if !args.input.exists() {
        return Err(AppError::Config(format!(
            "Input file '{}' does not exist",
            args.input.display()
        )));
    }

    let renderer = BomRenderer::new(args.template_dir.clone());
    if !renderer.has_template(&args.template) {
        return Err(AppError::Config(format!(
            "Template '{}' does not exist",
            args.template
        )));
    }

    if output_path.exists() && !args.yes && !confirm_overwrite(&output_path, input, out)? {
        tracing::info!("Operation aborted by the user.");
        return Ok(());
    }

    // 4. Extract tables and the project title
    let document = Document::from_path(&args.input)?;
    tracing::debug!("Read {} bytes from {}", document.text.len(), args.input.display());
    if document.tables.is_empty() {
        tracing::info!("No tables extracted, exiting");
        return Ok(());
    }

    // 5. Build the bill of materials
    let bom = BomBuilder::new().build(&document.tables, document.title.as_deref())?;

    // 6. Render
    let report = renderer.render(&bom, &args.template);
    if report.is_empty() {
        return Err(AppError::Render(format!(
            "template '{}' produced no output",
            args.template
        )));
    }

    if args.console {
        writeln!(out, "{}", report)?;
    }

    // 7. Write the report (and metadata)
    let storage = StorageManager::new(&output_path)?;
    storage.save_report(&report)?;

    if args.metadata {
        match storage.save_bom_metadata(&bom) {
            Ok(path) => tracing::info!("Saved bill of materials metadata to: {}", path.display()),
            Err(e) => tracing::error!("Failed to save bill of materials metadata: {}", e),
        }
    }

    tracing::info!(
        "Processing finished. Groups: {}, items: {}, total: {:.2}",
        bom.group_count(),
        bom.item_count(),
        bom.total_cost()
    );

    Ok(())
}
