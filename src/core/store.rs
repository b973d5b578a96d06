use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use super::error::StoreError;

/// Read/write access to project files keyed by project-relative path.
pub trait FileStore: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, StoreError>;
    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError>;
}

/// Rejects absolute paths and any `..` that would climb out of the root.
fn confine(path: &Path) -> Result<PathBuf, StoreError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !clean.pop() {
                    return Err(StoreError::OutsideRoot(path.to_path_buf()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::OutsideRoot(path.to_path_buf()));
            }
        }
    }
    Ok(clean)
}

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStore for DiskStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let full = self.root.join(confine(path)?);
        std::fs::read_to_string(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
            _ => StoreError::Io {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let full = self.root.join(confine(path)?);
        std::fs::write(&full, text).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// In-memory store, also used to capture writes in dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<PathBuf, String>>,
    writes: Mutex<Vec<PathBuf>>,
    read_only: Vec<PathBuf>,
}

impl MemoryStore {
    pub fn new<P: Into<PathBuf>, T: Into<String>>(files: impl IntoIterator<Item = (P, T)>) -> Self {
        Self {
            files: Mutex::new(files.into_iter().map(|(p, t)| (p.into(), t.into())).collect()),
            ..Self::default()
        }
    }

    /// Makes writes to `path` fail.
    pub fn with_read_only(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_only.push(path.into());
        self
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.lock().ok()?.get(path).cloned()
    }

    /// Paths written so far, in write order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl FileStore for MemoryStore {
    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let path = confine(path)?;
        self.files
            .lock()
            .ok()
            .and_then(|files| files.get(&path).cloned())
            .ok_or(StoreError::NotFound(path))
    }

    fn write(&self, path: &Path, text: &str) -> Result<(), StoreError> {
        let path = confine(path)?;
        if self.read_only.contains(&path) {
            return Err(StoreError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        if let Ok(mut files) = self.files.lock() {
            files.insert(path.clone(), text.to_string());
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(path);
        }
        Ok(())
    }
}

/// Read-only view of the project sources the index is built from.
#[derive(Debug, Clone, Default)]
pub struct ProjectSnapshot {
    files: BTreeMap<PathBuf, String>,
}

impl ProjectSnapshot {
    pub fn new<P: Into<PathBuf>, T: Into<String>>(files: impl IntoIterator<Item = (P, T)>) -> Self {
        Self {
            files: files.into_iter().map(|(p, t)| (p.into(), t.into())).collect(),
        }
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.files.get(path).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, t)| (p.as_path(), t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_disk_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/A.java"), "class A {}\n").unwrap();
        let store = DiskStore::new(tmp.path());
        assert_eq!(store.read(Path::new("src/A.java")).unwrap(), "class A {}\n");
        store.write(Path::new("./src/A.java"), "class B {}\n").unwrap();
        assert_eq!(fs::read_to_string(tmp.path().join("src/A.java")).unwrap(), "class B {}\n");
    }

    #[test]
    fn test_disk_store_confines_paths() {
        let tmp = TempDir::new().unwrap();
        let store = DiskStore::new(tmp.path());
        assert!(matches!(store.read(Path::new("../etc/passwd")), Err(StoreError::OutsideRoot(_))));
        assert!(matches!(store.read(Path::new("/etc/passwd")), Err(StoreError::OutsideRoot(_))));
        assert!(matches!(store.read(Path::new("Missing.java")), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_store_records_writes() {
        let store = MemoryStore::new([("A.java", "class A {}")]).with_read_only("B.java");
        store.write(Path::new("A.java"), "class A { }").unwrap();
        assert!(store.write(Path::new("B.java"), "x").is_err());
        assert_eq!(store.writes(), vec![PathBuf::from("A.java")]);
        assert_eq!(store.get(Path::new("A.java")).as_deref(), Some("class A { }"));
    }
}
