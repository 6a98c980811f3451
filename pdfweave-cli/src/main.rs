//! pdfweave - Merge PDF files into one, or split one PDF into named parts.
//!
//! A thin host around the `pdfweave` engine: it reads files, drives an
//! editing session and writes the composed outputs.

mod cli;
mod inputs;
mod writer;

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, MergeArgs, RangeSpec, SplitArgs};
use crate::inputs::{collect_paths_for_patterns, read_input};
use crate::writer::{OutputWriter, output_path_in};
use pdfweave::codec::LopdfCodec;
use pdfweave::config::EngineConfig;
use pdfweave::error::{Result, WeaveError};
use pdfweave::ranges::{RangeBound, RangeUpdate};
use pdfweave::session::EditingSession;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "PDFWEAVE_LOG";

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).await?;
    let writer = OutputWriter::new(cli.force);
    let mut session = EditingSession::new(config)?;

    match cli.command {
        Command::Merge(args) => merge(&mut session, &writer, args).await,
        Command::Split(args) => split(&mut session, &writer, args).await,
    }
}

/// Build the engine configuration from `--config` and flag overrides.
async fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json(&tokio::fs::read_to_string(path).await?)?,
        None => EngineConfig::default(),
    };

    if let Some(level) = &cli.compression {
        config.compression = level.parse()?;
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = Some(jobs);
    }

    config.validate()?;
    Ok(config)
}

async fn merge(
    session: &mut EditingSession<LopdfCodec>,
    writer: &OutputWriter,
    args: MergeArgs,
) -> Result<()> {
    let paths = collect_paths_for_patterns(&args.inputs)?;

    let mut inputs = Vec::with_capacity(paths.len());
    for path in &paths {
        inputs.push(read_input(path).await?);
    }

    for (path, result) in paths.iter().zip(session.add_sources(inputs)) {
        if let Err(err) = result {
            eprintln!("Warning: Skipping {} due to error: {err}", path.display());
        }
    }

    let requested_name = args
        .output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let mut options = session.merge_options(requested_name);
    options.insert_separators |= args.separators;

    let result = session.merge(&options).await?;
    let output_path = args.output.with_file_name(&result.output.name);
    let stats = writer.write(&output_path, result.output.bytes).await?;

    println!(
        "Merged {} file(s) ({}) into {} pages in {:.2}s",
        result.statistics.files_merged,
        result.statistics.format_input_size(),
        result.statistics.total_pages,
        result.statistics.merge_time.as_secs_f64()
    );
    if result.statistics.separators_inserted > 0 {
        println!("  Separators: {}", result.statistics.separators_inserted);
    }
    println!(
        "Successfully created {} ({}) in {:.2}s",
        stats.output_path.display(),
        stats.format_file_size(),
        stats.write_time.as_secs_f64()
    );
    Ok(())
}

async fn split(
    session: &mut EditingSession<LopdfCodec>,
    writer: &OutputWriter,
    args: SplitArgs,
) -> Result<()> {
    let input = read_input(&args.input).await?;
    let total_pages = session.load_split_source(input).await?;
    apply_ranges(session, &args.ranges)?;

    let report = session.split().await?;
    for id in &report.skipped {
        eprintln!(
            "Warning: Skipping range {id}: bounds must satisfy 1 <= start <= end <= {total_pages}"
        );
    }

    tokio::fs::create_dir_all(&args.output_dir).await?;

    let mut first_failure: Option<WeaveError> = None;
    let mut written = 0;
    for outcome in report.outcomes {
        match outcome.result {
            Ok(output) => {
                let path = match output_path_in(&args.output_dir, &output.name) {
                    Ok(path) => path,
                    Err(err) => {
                        eprintln!("Error: range {} failed: {err}", outcome.range_id);
                        first_failure.get_or_insert(err);
                        continue;
                    }
                };
                let stats = writer.write(&path, output.bytes).await?;
                println!(
                    "Created {} ({} pages, {}) in {:.2}s",
                    stats.output_path.display(),
                    output.page_count,
                    stats.format_file_size(),
                    stats.write_time.as_secs_f64()
                );
                written += 1;
            }
            Err(err) => {
                eprintln!("Error: range {} failed: {err}", outcome.range_id);
                first_failure.get_or_insert(err);
            }
        }
    }

    println!(
        "Split {} page(s) into {written} file(s) in {:.2}s",
        total_pages,
        report.elapsed.as_secs_f64()
    );

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Replace the seeded range with the ranges given on the command line.
///
/// Bounds go through the same draft-and-commit path as interactive edits,
/// so an empty bound means the first or last page.
fn apply_ranges(session: &mut EditingSession<LopdfCodec>, specs: &[RangeSpec]) -> Result<()> {
    let Some(seeded) = session.ranges()?.iter().next().map(|range| range.id()) else {
        return Ok(());
    };

    for (index, spec) in specs.iter().enumerate() {
        let id = if index == 0 {
            seeded
        } else {
            session.add_range()?
        };

        session.edit_range_input(id, RangeBound::Start, spec.start.as_str())?;
        session.commit_range_input(id, RangeBound::Start)?;
        session.edit_range_input(id, RangeBound::End, spec.end.as_str())?;
        session.commit_range_input(id, RangeBound::End)?;

        if let Some(name) = &spec.name {
            session.update_range(id, RangeUpdate::Name(name.clone()))?;
        }
    }

    Ok(())
}
