//! # sprout
//!
//! Sprout - Reactive UI component compiler in Rust.
//!
//! Command-line interface for compiling `.sprout` components to ES modules
//! and style sheets, checking them for diagnostics, and rendering them to
//! HTML without a browser.

mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::Level;

#[derive(Parser)]
#[command(name = "sprout")]
#[command(about = "Reactive UI component compiler in Rust", long_about = None)]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile components (default command)
    Build(commands::build::BuildArgs),

    /// Report diagnostics without writing output
    Check(commands::check::CheckArgs),

    /// Render a component to HTML
    Render(commands::render::RenderArgs),

    /// Print the JSON Schema of sprout.config.json
    Schema,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = sprout::load_config(None);

    let result = match cli.command {
        Some(Commands::Build(args)) => commands::build::run(args, &config),
        Some(Commands::Check(args)) => commands::check::run(args, &config),
        Some(Commands::Render(args)) => commands::render::run(args, &config),
        Some(Commands::Schema) => {
            println!("{}", sprout::SPROUT_CONFIG_SCHEMA);
            Ok(())
        }
        None => {
            // Default to build command with default args
            commands::build::run(commands::build::BuildArgs::default(), &config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Per-file failures were already printed
            if !matches!(e, sprout::CliError::Failed(_)) {
                eprintln!("error: {e}");
            }
            ExitCode::FAILURE
        }
    }
}
