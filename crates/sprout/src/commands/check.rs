//! Check command - Report diagnostics for Sprout components

use clap::{Args, ValueEnum};
use rayon::prelude::*;
use serde::Serialize;
use sprout::seed::{Bump, CompileError};
use sprout::{CliError, SproutConfig};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{collect_files, read_source};

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// One line per diagnostic
    #[default]
    Text,
    /// JSON array of diagnostics
    Json,
}

#[derive(Args, Default)]
pub struct CheckArgs {
    /// Glob pattern(s) or directories to check (default: ./**/*.sprout)
    pub patterns: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct Diagnostic {
    file: PathBuf,
    #[serde(flatten)]
    error: CompileError,
}

impl Diagnostic {
    fn render(&self) -> String {
        format!(
            "{}:{}:{}: error[{:?}]: {}",
            self.file.display(),
            self.error.line,
            self.error.column,
            self.error.code,
            self.error.detail
        )
    }
}

pub fn run(args: CheckArgs, config: &SproutConfig) -> Result<(), CliError> {
    let start = Instant::now();
    let files = collect_files(&args.patterns)?;
    let diagnostics = check_files(&files, config)?;

    match args.format {
        OutputFormat::Text => {
            for diagnostic in &diagnostics {
                println!("{}", diagnostic.render());
            }
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&diagnostics).unwrap_or_default()
            );
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    if !diagnostics.is_empty() {
        eprintln!(
            "✗ {} of {} file(s) have errors ({:.4}s)",
            diagnostics.len(),
            files.len(),
            elapsed
        );
        return Err(CliError::Failed(diagnostics.len()));
    }
    eprintln!("✓ {} file(s) checked in {:.4}s", files.len(), elapsed);
    Ok(())
}

fn check_files(files: &[PathBuf], config: &SproutConfig) -> Result<Vec<Diagnostic>, CliError> {
    let parser = config.compile_options().parser;
    let results: Vec<Result<Option<Diagnostic>, CliError>> = files
        .par_iter()
        .map(|path| {
            let source = read_source(path)?;
            Ok(check_source(path, &source, parser))
        })
        .collect();
    results.into_iter().filter_map(Result::transpose).collect()
}

fn check_source(
    path: &Path,
    source: &str,
    options: sprout::trellis::ParserOptions,
) -> Option<Diagnostic> {
    let allocator = Bump::new();
    sprout::trellis::parse_with_options(&allocator, source, options)
        .err()
        .map(|error| Diagnostic {
            file: path.to_path_buf(),
            error,
        })
}
