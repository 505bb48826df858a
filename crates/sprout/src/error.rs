//! CLI errors.

use std::path::PathBuf;

use sprout_bloom::MountError;
use sprout_seed::CompileError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}:{}:{}: {}", path.display(), error.line, error.column, error.detail)]
    Compile { path: PathBuf, error: CompileError },

    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("invalid fixtures in {}: {source}", path.display())]
    Fixtures {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no .sprout files found matching {0:?}")]
    NoFiles(Vec<String>),

    #[error("{0} file(s) failed")]
    Failed(usize),

    #[error(transparent)]
    Mount(#[from] MountError),
}
