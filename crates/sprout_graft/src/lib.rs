//! Graft - The code generator for Sprout.
//!
//! Lowers a parsed [`Component`] into two things: render logic and a scoped
//! style sheet. Render logic comes out both as an owned [`RenderProgram`]
//! (executed directly by `sprout_bloom`) and as ES module text importing the
//! rendering primitive library.
//!
//! # Example
//!
//! ```ignore
//! use sprout_graft::{generate, CodegenOptions};
//!
//! let bump = sprout_seed::Bump::new();
//! let component = sprout_trellis::parse(&bump, "$count:0\n---\np[$count]")?;
//! let result = generate(&component, "Counter", &CodegenOptions::default());
//! assert!(result.code.contains("_signal(0)"));
//! ```

pub mod classes;
pub mod codegen;
pub mod css;
mod lower;
mod options;
pub mod program;

use sprout_seed::Component;

pub use classes::{classify, scope_class, ClassKind};
pub use codegen::generate_module;
pub use css::{minify_css, CssError, StyleSheet};
pub use lower::lower;
pub use options::{CodegenOptions, DEFAULT_RUNTIME_MODULE};
pub use program::{
    Binding, EffectPlan, ElementPlan, FetchPlan, Handler, HandlerAction, PropValue, RenderProgram,
    StateInit, StatePlan, ViewNode, INDEX_FIELD, NAVIGATION_EVENT,
};

/// Output of [`generate`]
#[derive(Debug, Clone)]
pub struct CodegenResult {
    /// Executable render description
    pub program: RenderProgram,
    /// ES module text
    pub code: String,
    /// Style sheet for the component's local and arbitrary-value classes
    pub css: String,
    pub scope_tag: String,
    /// Non-fatal problems (e.g. CSS that failed to minify)
    pub warnings: Vec<String>,
}

/// Generate render logic and styles for a component
pub fn generate(component: &Component<'_>, name: &str, options: &CodegenOptions) -> CodegenResult {
    let mut warnings = Vec::new();
    let (program, sheet) = lower(component, name);
    let code = generate_module(&program, options);

    let mut css = sheet.to_css();
    if options.minify_css && !css.is_empty() {
        match minify_css(&css) {
            Ok(minified) => css = minified,
            Err(e) => {
                tracing::warn!(component = name, error = %e, "keeping unminified css");
                warnings.push(format!("{name}: {e}"));
            }
        }
    }

    tracing::debug!(
        component = name,
        scope_tag = %program.scope_tag,
        states = program.states.len(),
        effects = program.effects.len(),
        code_len = code.len(),
        css_len = css.len(),
        "generated component"
    );

    CodegenResult {
        scope_tag: program.scope_tag.clone(),
        program,
        code,
        css,
        warnings,
    }
}
