//! CLI subcommands.

pub mod build;
pub mod check;
pub mod render;

use glob::glob;
use sprout::{CliError, SOURCE_EXTENSION};
use std::path::{Path, PathBuf};

/// Pattern used when none is given.
pub const DEFAULT_PATTERN: &str = "./**/*.sprout";

/// Expand glob patterns, directories and plain paths into the sorted list of
/// `.sprout` files they name.
pub fn collect_files(patterns: &[String]) -> Result<Vec<PathBuf>, CliError> {
    let default = [DEFAULT_PATTERN.to_string()];
    let patterns = if patterns.is_empty() {
        &default[..]
    } else {
        patterns
    };

    let mut files = Vec::new();
    for pattern in patterns {
        let expanded = if pattern.contains(['*', '?', '[']) {
            pattern.clone()
        } else if Path::new(pattern).is_dir() {
            format!("{}/**/*.{SOURCE_EXTENSION}", pattern.trim_end_matches('/'))
        } else {
            files.push(PathBuf::from(pattern));
            continue;
        };

        let paths = glob(&expanded).map_err(|source| CliError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        files.extend(paths.filter_map(|r| r.ok()).filter(|p| {
            p.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
                && !p.components().any(|c| c.as_os_str() == "node_modules")
        }));
    }

    files.sort();
    files.dedup();
    if files.is_empty() {
        return Err(CliError::NoFiles(patterns.to_vec()));
    }
    tracing::debug!(files = files.len(), "collected sources");
    Ok(files)
}

pub fn read_source(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        for file in [
            "App.sprout",
            "pages/Home.sprout",
            "pages/notes.txt",
            "node_modules/pkg/Vendor.sprout",
        ] {
            fs::write(root.join(file), "---\np").unwrap();
        }

        let files = collect_files(&[root.display().to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, ["App.sprout", "pages/Home.sprout"]);

        let pattern = format!("{}/pages/*.sprout", root.display());
        assert_eq!(collect_files(&[pattern]).unwrap().len(), 1);
    }

    #[test]
    fn test_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.sprout", dir.path().display());
        assert!(matches!(
            collect_files(&[pattern]),
            Err(CliError::NoFiles(_))
        ));
    }
}
