//! Code generation options.

use serde::{Deserialize, Serialize};

/// Module the emitted JavaScript imports its rendering primitives from.
pub const DEFAULT_RUNTIME_MODULE: &str = "sprout/runtime";

/// Code generation options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOptions {
    /// Import specifier of the rendering primitive library
    #[serde(default = "default_runtime_module")]
    pub runtime_module: String,

    /// Extension appended to component imports
    #[serde(default = "default_component_extension")]
    pub component_extension: String,

    /// Minify the style sheet (requires the `native` feature)
    #[serde(default)]
    pub minify_css: bool,
}

fn default_runtime_module() -> String {
    DEFAULT_RUNTIME_MODULE.to_string()
}

fn default_component_extension() -> String {
    ".js".to_string()
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            runtime_module: default_runtime_module(),
            component_extension: default_component_extension(),
            minify_css: false,
        }
    }
}
