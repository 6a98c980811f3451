//! CLI argument parsing for pdfweave.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by the build script to render the man page, so it
//! depends on nothing but `clap` and the standard library.

use clap::{Args, Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Merge PDF files into one, or split one PDF into named parts.
#[derive(Parser, Debug)]
#[command(name = "pdfweave")]
#[command(version)]
#[command(about = "Merge PDF files into one, or split one PDF into named parts", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Engine configuration file (JSON)
    ///
    /// Fields left out of the file keep their defaults. Flags given on the
    /// command line override the file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Compression level for output PDFs
    ///
    /// - none: streams are written as copied
    /// - standard: compress streams (default)
    /// - maximum: drop unused objects, then compress
    #[arg(short, long, global = true, value_name = "LEVEL")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: Option<String>,

    /// Number of split ranges composed in parallel
    ///
    /// Default is number of CPU cores.
    #[arg(short, long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Overwrite existing output files
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Verbose output - log every engine step
    ///
    /// Without this flag the log level is read from PDFWEAVE_LOG
    /// (default: warn).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge PDF files in the order given
    Merge(MergeArgs),

    /// Split one PDF into page ranges
    Split(SplitArgs),
}

/// Arguments of `pdfweave merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files or glob patterns (in order)
    ///
    /// Glob matches are sorted by path. Files that are not PDFs are
    /// reported and skipped.
    ///
    /// Examples:
    ///   pdfweave merge cover.pdf body.pdf -o book.pdf
    ///   pdfweave merge "chapters/*.pdf" -o book.pdf
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    ///
    /// `.pdf` is appended to the file name when missing.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Insert a blank page between consecutive inputs
    ///
    /// Each blank page has the size of the first page of the input it
    /// follows.
    #[arg(short, long)]
    pub separators: bool,
}

/// Arguments of `pdfweave split`.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// PDF file to split
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Page range to extract, 1-based and inclusive
    ///
    /// Repeat for several outputs. A missing bound means the first or last
    /// page. Without any range the whole document is written as "Part 1".
    ///
    /// Examples:
    ///   --range 1-4
    ///   --range 5-:appendix
    #[arg(short, long = "range", value_name = "START-END[:NAME]")]
    pub ranges: Vec<RangeSpec>,

    /// Directory the parts are written to
    #[arg(short = 'd', long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,
}

/// One `--range` value, kept as typed so the engine resolves the bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    /// Start page text, possibly empty.
    pub start: String,
    /// End page text, possibly empty.
    pub end: String,
    /// Output name, if given.
    pub name: Option<String>,
}

impl FromStr for RangeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bounds, name) = match s.split_once(':') {
            Some((bounds, name)) => (bounds, Some(name.to_string())),
            None => (s, None),
        };

        let (start, end) = bounds
            .split_once('-')
            .ok_or_else(|| format!("Invalid range '{s}': expected START-END[:NAME]"))?;

        Ok(Self {
            start: start.trim().to_string(),
            end: end.trim().to_string(),
            name,
        })
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)?;
        if let Some(name) = &self.name {
            write!(f, ":{name}")?;
        }
        Ok(())
    }
}
