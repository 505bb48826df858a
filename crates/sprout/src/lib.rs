//! # Sprout
//!
//! Reactive UI component compiler written in Rust.
//!
//! This crate re-exports the Sprout sub-crates for unified documentation and
//! provides [`compile`], the one-call path from component source to render
//! logic and styles.
//!
//! ## Crates
//!
//! - [`seed`] - Component AST, expressions and diagnostics
//! - [`trellis`] - Indentation-sensitive component parser
//! - [`sap`] - Fine-grained reactive runtime
//! - [`graft`] - Code generator
//! - [`bloom`] - Rendering primitives and mount interpreter

mod config;
mod error;

use std::path::Path;

pub use config::{load_config, SproutConfig, CONFIG_FILE, SPROUT_CONFIG_SCHEMA};
pub use error::CliError;

/// Component AST, expressions and diagnostics.
pub use sprout_seed as seed;

/// Indentation-sensitive component parser.
pub use sprout_trellis as trellis;

/// Fine-grained reactive runtime.
pub use sprout_sap as sap;

/// Code generator.
pub use sprout_graft as graft;

/// Rendering primitives and mount interpreter.
pub use sprout_bloom as bloom;

use sprout_graft::{CodegenOptions, CodegenResult};
use sprout_seed::{Bump, CompileError};
use sprout_trellis::ParserOptions;

/// Extension of component source files.
pub const SOURCE_EXTENSION: &str = "sprout";

/// Options for [`compile`]
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub parser: ParserOptions,
    pub codegen: CodegenOptions,
}

/// Parse and generate one component.
pub fn compile(
    source: &str,
    name: &str,
    options: &CompileOptions,
) -> Result<CodegenResult, CompileError> {
    let allocator = Bump::new();
    let component = sprout_trellis::parse_with_options(&allocator, source, options.parser)?;
    Ok(sprout_graft::generate(&component, name, &options.codegen))
}

/// Component name for a source file: its file stem.
pub fn component_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Component".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile() {
        let result = compile("$n:1\n---\np[$n]", "note", &CompileOptions::default()).unwrap();
        assert!(result.code.contains("export default function Note()"));
        assert_eq!(result.program.states.len(), 1);
    }

    #[test]
    fn test_compile_legacy_layout() {
        let source = "$n:1\np[$n]";
        // Without the separator every line is markup
        assert!(compile(source, "Note", &CompileOptions::default())
            .map_or(true, |result| result.program.states.is_empty()));

        let options = CompileOptions {
            parser: ParserOptions {
                legacy_layout: true,
            },
            ..Default::default()
        };
        let result = compile(source, "Note", &options).unwrap();
        assert_eq!(result.program.states.len(), 1);
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name(Path::new("src/todo-list.sprout")), "todo-list");
        assert_eq!(component_name(Path::new("App.sprout")), "App");
    }
}
