use std::path::{Path, PathBuf};

use crate::core::error::ParseError;
use crate::core::finding::Finding;
use crate::core::store::FileStore;
use crate::syntax::{self, SyntaxTree};
use crate::validate::{LineHunk, LineMap};

/// The working state of one file across its batch of findings. Only the
/// task holding the session's lock may touch it.
pub struct FileSession {
    path: PathBuf,
    original: String,
    tree: Result<SyntaxTree, ParseError>,
    line_map: LineMap,
    /// Set once the file must not be touched any more; every later finding
    /// is skipped with this reason.
    poisoned: Option<String>,
    commits: usize,
}

impl FileSession {
    pub fn open(path: &Path, store: &dyn FileStore) -> Self {
        let (original, poisoned) = match store.read(path) {
            Ok(text) => (text, None),
            Err(e) => (String::new(), Some(format!("cannot read file: {}", e))),
        };
        let tree = syntax::parse(&original);
        Self {
            path: path.to_path_buf(),
            original,
            tree,
            line_map: LineMap::default(),
            poisoned,
            commits: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text: the original plus every committed patch.
    pub fn text(&self) -> &str {
        match &self.tree {
            Ok(tree) => tree.source(),
            Err(_) => &self.original,
        }
    }

    pub fn tree(&self) -> Result<&SyntaxTree, &ParseError> {
        self.tree.as_ref()
    }

    pub fn poison(&mut self, reason: impl Into<String>) {
        if self.poisoned.is_none() {
            self.poisoned = Some(reason.into());
        }
    }

    pub fn poisoned(&self) -> Option<&str> {
        self.poisoned.as_deref()
    }

    /// The finding's lines in the current text, or `None` when an earlier
    /// commit rewrote them.
    pub fn map_finding(&self, finding: &Finding) -> Option<(usize, usize)> {
        self.line_map.map_range(finding.line, finding.last_line())
    }

    /// Makes an accepted, re-parsed patch the new working tree.
    pub fn commit(&mut self, tree: SyntaxTree, hunk: LineHunk) {
        self.line_map.record(hunk);
        self.tree = Ok(tree);
        self.commits += 1;
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn is_changed(&self) -> bool {
        self.commits > 0 && self.text() != self.original
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::UNUSED_IMPORT;
    use crate::core::store::MemoryStore;
    use crate::validate::line_hunk;

    const SOURCE: &str = "import a.B;\nimport c.D;\n\nclass E {\n    D d;\n}\n";

    #[test]
    fn test_commit_updates_text_and_line_map() {
        let store = MemoryStore::new([("E.java", SOURCE)]);
        let mut session = FileSession::open(Path::new("E.java"), &store);
        assert!(session.tree().is_ok());
        assert!(!session.is_changed());

        let patched = SOURCE.replacen("import a.B;\n", "", 1);
        let hunk = line_hunk(session.text(), &patched).unwrap();
        session.commit(syntax::parse(&patched).unwrap(), hunk);

        assert!(session.is_changed());
        assert_eq!(session.text(), patched);
        let gone = Finding::new(UNUSED_IMPORT, "m", "E.java", 1);
        assert_eq!(session.map_finding(&gone), None);
        let shifted = Finding::new(UNUSED_IMPORT, "m", "E.java", 5);
        assert_eq!(session.map_finding(&shifted), Some((4, 4)));
    }

    #[test]
    fn test_unreadable_file_is_poisoned() {
        let store = MemoryStore::default();
        let session = FileSession::open(Path::new("Missing.java"), &store);
        assert!(session.poisoned().unwrap().contains("cannot read"));
    }

    #[test]
    fn test_unparsable_file_keeps_text() {
        let store = MemoryStore::new([("Bad.java", "class {")]);
        let session = FileSession::open(Path::new("Bad.java"), &store);
        assert!(session.tree().is_err());
        assert_eq!(session.text(), "class {");
    }
}
