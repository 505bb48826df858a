//! Render command - Mount a component into an in-memory document and print its HTML

use clap::Args;
use serde_json::{Map, Value};
use sprout::bloom::{Document, Renderer, StaticFetcher};
use sprout::graft::RenderProgram;
use sprout::sap::Runtime;
use sprout::{compile, component_name, CliError, CompileOptions, SproutConfig, SOURCE_EXTENSION};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::read_source;

#[derive(Args)]
pub struct RenderArgs {
    /// Component to render
    pub file: PathBuf,

    /// JSON object mapping URLs to the bodies fetch effects receive
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
}

pub fn run(args: RenderArgs, config: &SproutConfig) -> Result<(), CliError> {
    let html = render(&args, config)?;
    println!("{html}");
    Ok(())
}

/// Render `args.file`, resolving `::Name` references against the other
/// components in its directory.
fn render(args: &RenderArgs, config: &SproutConfig) -> Result<String, CliError> {
    let options = config.compile_options();
    let program = load_program(&args.file, &options)?;

    let runtime = Runtime::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    runtime.on_error(move |error| {
        tracing::error!(%error, "runtime error");
        sink.borrow_mut().push(error.to_string());
    });

    let doc = Rc::new(Document::new());
    let mut renderer = Renderer::new(runtime, doc.clone());
    for sibling in siblings(&args.file) {
        match load_program(&sibling, &options) {
            Ok(program) => renderer.register(program),
            Err(e) => tracing::warn!(error = %e, "skipping component"),
        }
    }
    if let Some(path) = &args.fixtures {
        renderer = renderer.with_fetcher(Rc::new(load_fixtures(path)?));
    }

    let _mounted = renderer.mount(&program, doc.root())?;
    for error in errors.borrow().iter() {
        eprintln!("warning: {error}");
    }
    Ok(doc.to_html(doc.root()))
}

fn load_program(path: &Path, options: &CompileOptions) -> Result<RenderProgram, CliError> {
    let source = read_source(path)?;
    compile(&source, &component_name(path), options)
        .map(|result| result.program)
        .map_err(|error| CliError::Compile {
            path: path.to_path_buf(),
            error,
        })
}

/// Other component sources in the same directory as `file`.
fn siblings(file: &Path) -> Vec<PathBuf> {
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
                && path.file_name() != file.file_name()
        })
        .collect();
    paths.sort();
    paths
}

fn load_fixtures(path: &Path) -> Result<StaticFetcher, CliError> {
    let content = read_source(path)?;
    let routes: Map<String, Value> =
        serde_json::from_str(&content).map_err(|source| CliError::Fixtures {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(routes
        .into_iter()
        .fold(StaticFetcher::new(), |fetcher, (url, body)| {
            fetcher.json(url, &body)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_render_with_components_and_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("App.sprout"),
            "$users:[]\n~ fetch(\"/users\") |> json |> $users\n---\nmain\n  ::Heading\n  ul\n    $users\n      li[:name]",
        )
        .unwrap();
        fs::write(dir.path().join("heading.sprout"), "---\nh1[\"Users & friends\"]").unwrap();
        let fixtures = dir.path().join("fixtures.json");
        fs::write(&fixtures, r#"{ "/users": [{ "name": "<Ada>" }] }"#).unwrap();

        let args = RenderArgs {
            file: dir.path().join("App.sprout"),
            fixtures: Some(fixtures),
        };
        let html = render(&args, &SproutConfig::default()).unwrap();
        insta::assert_snapshot!(
            html,
            @"<main><h1>Users &amp; friends</h1><ul><li>&lt;Ada&gt;</li></ul></main>"
        );
    }

    #[test]
    fn test_render_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("App.sprout"), "---\n::Missing").unwrap();
        let args = RenderArgs {
            file: dir.path().join("App.sprout"),
            fixtures: None,
        };
        let err = render(&args, &SproutConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "unknown component `Missing`");

        let fixtures = dir.path().join("fixtures.json");
        fs::write(&fixtures, "[1, 2]").unwrap();
        assert!(matches!(
            load_fixtures(&fixtures),
            Err(CliError::Fixtures { .. })
        ));
    }
}
