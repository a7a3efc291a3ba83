//! Shard discovery for dataset directories.
//!
//! A dataset directory holds `*.jsonl` and `*.jsonl.gz` files, possibly nested.
//! [`discover_shards`] finds them all and returns them in a reproducible order:
//! lexicographic by path relative to the directory.

use crate::error::{DatasetError, Result};
use glob::{Pattern, glob};
use std::io;
use std::path::{Path, PathBuf};

const SHARD_PATTERNS: [&str; 2] = ["**/*.jsonl", "**/*.jsonl.gz"];

/// List every shard file under `directory`, sorted for reproducible reads.
///
/// # Errors
/// - [`DatasetError::NotADirectory`] if `directory` is not a directory.
/// - [`DatasetError::NoShards`] if nothing matches.
/// - [`DatasetError::Config`] if the directory path is not valid UTF-8.
/// - [`DatasetError::Io`] if a subdirectory cannot be listed.
pub fn discover_shards(directory: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(DatasetError::NotADirectory(directory.to_path_buf()));
    }
    let base = directory.to_str().ok_or_else(|| {
        DatasetError::Config(format!(
            "directory path is not valid UTF-8: {}",
            directory.display()
        ))
    })?;
    let base = Pattern::escape(base);

    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for suffix in SHARD_PATTERNS {
        let pattern = format!("{base}/{suffix}");
        let entries =
            glob(&pattern).map_err(|e| DatasetError::Config(format!("{pattern}: {e}")))?;
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                DatasetError::io("list", path, io::Error::from(e))
            })?;
            // Only include actual files, not directories
            if !path.is_file() {
                continue;
            }
            let key = path
                .strip_prefix(directory)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            found.push((key, path));
        }
    }

    if found.is_empty() {
        return Err(DatasetError::NoShards(directory.to_path_buf()));
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));
    found.dedup_by(|a, b| a.0 == b.0);
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(dir: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.strip_prefix(dir).unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn finds_plain_and_gzip_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("part-b")).unwrap();
        for name in [
            "b.jsonl",
            "a.jsonl.gz",
            "part-b/c.jsonl",
            "notes.txt",
            "a.json",
        ] {
            fs::write(root.join(name), "").unwrap();
        }

        let files = discover_shards(root).unwrap();
        assert_eq!(
            names(root, &files),
            vec!["a.jsonl.gz", "b.jsonl", "part-b/c.jsonl"]
        );
    }

    #[test]
    fn empty_directory_has_no_shards() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_shards(dir.path()),
            Err(DatasetError::NoShards(_))
        ));
    }

    #[test]
    fn missing_directory_is_rejected() {
        assert!(matches!(
            discover_shards("/does/not/exist"),
            Err(DatasetError::NotADirectory(_))
        ));
    }
}
