use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::config::Config;
use crate::core::store::ProjectSnapshot;

const SKIPPED_DIRS: &[&str] = &["target", "build", "out", "node_modules"];

pub fn find_files_with_extension(path: &Path, ext: &str) -> Vec<PathBuf> {
    let mut results = Vec::new();
    let dot_ext = if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    };
    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let n = e.file_name().to_string_lossy();
            !n.starts_with('.') && !(e.file_type().is_dir() && SKIPPED_DIRS.contains(&n.as_ref()))
        })
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy();
            if name.ends_with(&dot_ext) {
                results.push(entry.into_path());
            }
        }
    }
    results
}

pub fn find_java_files(path: &Path) -> Vec<PathBuf> {
    find_files_with_extension(path, "java")
}

/// Reads every Java source under `root` into a snapshot keyed by path
/// relative to `root`. Files under `ignore.paths` are left out; unreadable
/// files are logged and skipped.
pub fn load_snapshot(root: &Path, config: &Config) -> Result<ProjectSnapshot> {
    if !root.is_dir() {
        anyhow::bail!("project path {} is not a directory", root.display());
    }
    let mut snapshot = ProjectSnapshot::default();
    for file in find_java_files(root) {
        let relative = file
            .strip_prefix(root)
            .with_context(|| format!("{} is outside {}", file.display(), root.display()))?
            .to_path_buf();
        if config.is_ignored_path(&relative) {
            debug!(path = %relative.display(), "ignored by configuration");
            continue;
        }
        match std::fs::read_to_string(&file) {
            Ok(text) => snapshot.insert(relative, text),
            Err(e) => warn!(path = %file.display(), error = %e, "cannot read source file"),
        }
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/main/java/app")).unwrap();
        fs::create_dir_all(tmp.path().join("target/classes")).unwrap();
        fs::create_dir_all(tmp.path().join(".idea")).unwrap();
        fs::create_dir_all(tmp.path().join("generated")).unwrap();
        fs::write(tmp.path().join("src/main/java/app/App.java"), "class App {}\n").unwrap();
        fs::write(tmp.path().join("src/main/java/app/notes.txt"), "not java").unwrap();
        fs::write(tmp.path().join("target/classes/Copy.java"), "class Copy {}\n").unwrap();
        fs::write(tmp.path().join(".idea/Hidden.java"), "class Hidden {}\n").unwrap();
        fs::write(tmp.path().join("generated/Gen.java"), "class Gen {}\n").unwrap();
        tmp
    }

    #[test]
    fn test_find_java_files_skips_build_and_hidden_dirs() {
        let tmp = project();
        let files = find_java_files(tmp.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["Gen.java", "App.java"]);
    }

    #[test]
    fn test_load_snapshot_uses_relative_paths_and_ignores() {
        let tmp = project();
        let mut config = Config::default();
        config.ignore.paths = vec!["generated".to_string()];
        let snapshot = load_snapshot(tmp.path(), &config).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get(Path::new("src/main/java/app/App.java")),
            Some("class App {}\n")
        );
    }

    #[test]
    fn test_load_snapshot_requires_directory() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(load_snapshot(&missing, &Config::default()).is_err());
    }
}
