//! Configuration file loading for sprout.
//!
//! Reads `sprout.config.json` from the current working directory.
//! Also provides the JSON Schema for editor autocompletion.

use serde::{Deserialize, Serialize};
use sprout_graft::{CodegenOptions, DEFAULT_RUNTIME_MODULE};
use sprout_trellis::ParserOptions;
use std::path::{Path, PathBuf};

use crate::CompileOptions;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "sprout.config.json";

/// Top-level sprout configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SproutConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory `sprout build` writes to.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Import specifier of the rendering primitive library.
    #[serde(default = "default_runtime_module")]
    pub runtime_module: String,

    /// Minify emitted style sheets.
    #[serde(default)]
    pub minify_css: bool,

    /// Accept sources without a `---` separator.
    #[serde(default)]
    pub legacy_syntax: bool,
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_runtime_module() -> String {
    DEFAULT_RUNTIME_MODULE.to_string()
}

impl Default for SproutConfig {
    fn default() -> Self {
        Self {
            schema: None,
            out_dir: default_out_dir(),
            runtime_module: default_runtime_module(),
            minify_css: false,
            legacy_syntax: false,
        }
    }
}

impl SproutConfig {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            parser: ParserOptions {
                legacy_layout: self.legacy_syntax,
            },
            codegen: CodegenOptions {
                runtime_module: self.runtime_module.clone(),
                minify_css: self.minify_css,
                ..Default::default()
            },
        }
    }
}

/// Load `sprout.config.json` from the given directory (or CWD if None).
pub fn load_config(dir: Option<&Path>) -> SproutConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE);

    if !config_path.exists() {
        return SproutConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %config_path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "failed to parse config, using defaults");
                SproutConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(path = %config_path.display(), error = %e, "failed to read config, using defaults");
            SproutConfig::default()
        }
    }
}

/// JSON Schema for `sprout.config.json`.
pub const SPROUT_CONFIG_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Sprout Configuration",
  "description": "Configuration file for sprout - Reactive UI component compiler",
  "type": "object",
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON Schema reference for editor autocompletion"
    },
    "outDir": {
      "type": "string",
      "description": "Directory `sprout build` writes compiled modules and style sheets to",
      "default": "dist"
    },
    "runtimeModule": {
      "type": "string",
      "description": "Import specifier of the rendering primitive library",
      "default": "sprout/runtime"
    },
    "minifyCss": {
      "type": "boolean",
      "description": "Minify emitted style sheets",
      "default": false
    },
    "legacySyntax": {
      "type": "boolean",
      "description": "Accept sources without a `---` separator, treating leading declaration lines as the preamble",
      "default": false
    }
  },
  "additionalProperties": false
}"#;
