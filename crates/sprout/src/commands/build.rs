//! Build command - Compile Sprout components to ES modules and style sheets

use clap::Args;
use rayon::prelude::*;
use sprout::graft::codegen::to_pascal_case;
use sprout::{compile, component_name, CliError, CompileOptions, SproutConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{collect_files, read_source};

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Glob pattern(s) or directories to compile (default: ./**/*.sprout)
    pub patterns: Vec<String>,

    /// Output directory (default: `outDir` from sprout.config.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minify emitted style sheets
    #[arg(long)]
    pub minify: bool,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Write the files that compiled even when others failed
    #[arg(long)]
    pub continue_on_error: bool,
}

/// One compiled component.
#[derive(Debug)]
struct BuildOutput {
    /// Module name; component imports resolve against it
    name: String,
    code: String,
    css: String,
}

pub fn run(args: BuildArgs, config: &SproutConfig) -> Result<(), CliError> {
    let start = Instant::now();
    let files = collect_files(&args.patterns)?;

    let mut options = config.compile_options();
    options.codegen.minify_css |= args.minify;

    let compile_all = || -> Vec<Result<BuildOutput, CliError>> {
        files
            .par_iter()
            .map(|path| compile_file(path, &options))
            .collect()
    };
    let results = match rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads.unwrap_or(0))
        .build()
    {
        Ok(pool) => pool.install(compile_all),
        Err(e) => {
            tracing::warn!(error = %e, "using the global thread pool");
            compile_all()
        }
    };

    let mut outputs = Vec::with_capacity(results.len());
    let mut failed = 0;
    for result in results {
        match result {
            Ok(output) => outputs.push(output),
            Err(e) => {
                failed += 1;
                eprintln!("error: {e}");
            }
        }
    }

    if failed == 0 || args.continue_on_error {
        let out_dir = args.output.unwrap_or_else(|| config.out_dir.clone());
        write_outputs(&out_dir, &outputs)?;
    }

    let elapsed = start.elapsed().as_secs_f64();
    if failed > 0 {
        eprintln!(
            "✗ {} file(s) failed, {} compiled in {:.4}s",
            failed,
            outputs.len(),
            elapsed
        );
        return Err(CliError::Failed(failed));
    }

    let file_word = if outputs.len() == 1 { "file" } else { "files" };
    eprintln!("✓ {} {} compiled in {:.4}s", outputs.len(), file_word, elapsed);
    Ok(())
}

fn compile_file(path: &Path, options: &CompileOptions) -> Result<BuildOutput, CliError> {
    let source = read_source(path)?;
    let name = component_name(path);
    let result = compile(&source, &name, options).map_err(|error| CliError::Compile {
        path: path.to_path_buf(),
        error,
    })?;
    for warning in &result.warnings {
        eprintln!("warning: {}: {warning}", path.display());
    }
    Ok(BuildOutput {
        name: to_pascal_case(&name),
        code: result.code,
        css: result.css,
    })
}

fn write_outputs(out_dir: &Path, outputs: &[BuildOutput]) -> Result<(), CliError> {
    let write = |path: PathBuf, content: &str| {
        fs::write(&path, content).map_err(|source| CliError::Write { path, source })
    };

    fs::create_dir_all(out_dir).map_err(|source| CliError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    for output in outputs {
        write(out_dir.join(format!("{}.js", output.name)), &output.code)?;
        if !output.css.is_empty() {
            write(out_dir.join(format!("{}.css", output.name)), &output.css)?;
        }
        tracing::debug!(component = %output.name, "written");
    }
    Ok(())
}
