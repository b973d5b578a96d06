pub mod graph;
pub mod symbols;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::error::IndexInconsistency;
use crate::syntax::{self, SyntaxTree};

pub use graph::{DependencyEdge, DependencyGraph, Impact};
pub use symbols::{fingerprint, FileSymbols, ImportDecl, SymbolEntry, SymbolKind, SymbolRef};

/// Per-file symbol tables plus the cross-file reference graph.
#[derive(Debug, Clone, Default)]
pub struct SymbolIndex {
    files: BTreeMap<PathBuf, FileSymbols>,
    /// Qualified type name to the files declaring it.
    type_map: HashMap<String, BTreeSet<PathBuf>>,
    graph: DependencyGraph,
    /// String literals seen anywhere in the project (reflection targets).
    literals: HashSet<String>,
    unparsed: BTreeSet<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub symbols: &'a FileSymbols,
    pub importers: BTreeSet<PathBuf>,
    pub dependencies: BTreeSet<PathBuf>,
    pub impact: Impact,
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
}

impl SymbolIndex {
    /// Indexes every parseable file. Files that fail to parse are recorded
    /// and otherwise ignored.
    pub fn build<'a>(files: impl IntoIterator<Item = (&'a Path, &'a str)>) -> Self {
        let mut index = SymbolIndex::default();
        for (path, text) in files {
            match syntax::parse(text) {
                Ok(tree) => {
                    let symbols = FileSymbols::extract(path, &tree);
                    index.register_types(&symbols);
                    index.files.insert(path.to_path_buf(), symbols);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unparsable file in index");
                    index.unparsed.insert(path.to_path_buf());
                }
            }
        }
        let paths: Vec<PathBuf> = index.files.keys().cloned().collect();
        for path in &paths {
            index.resolve_edges_from(path);
        }
        index.collect_literals();
        debug!(files = index.files.len(), edges = index.graph.edges().len(), "index built");
        index
    }

    pub fn file(&self, path: &Path) -> Option<&FileSymbols> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &FileSymbols> {
        self.files.values()
    }

    pub fn is_unparsed(&self, path: &Path) -> bool {
        self.unparsed.contains(path)
    }

    pub fn unparsed(&self) -> impl Iterator<Item = &Path> {
        self.unparsed.iter().map(PathBuf::as_path)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        self.graph.edges()
    }

    pub fn edges_to<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.graph.edges_to(path)
    }

    pub fn edges_from<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.graph.edges_from(path)
    }

    pub fn importers(&self, path: &Path) -> BTreeSet<PathBuf> {
        self.graph.importers(path)
    }

    pub fn dependencies(&self, path: &Path) -> BTreeSet<PathBuf> {
        self.graph.dependencies(path)
    }

    pub fn impact(&self, path: &Path) -> Impact {
        self.graph.impact(path)
    }

    pub fn report(&self, path: &Path) -> Option<FileReport<'_>> {
        self.files.get(path).map(|symbols| FileReport {
            symbols,
            importers: self.importers(path),
            dependencies: self.dependencies(path),
            impact: self.impact(path),
        })
    }

    /// Whether removing `entry` could break something. Anything the index
    /// cannot resolve statically counts as used.
    pub fn is_used(&self, entry: &SymbolEntry) -> bool {
        if entry.dynamic || !entry.references.is_empty() {
            return true;
        }
        let mentioned = self
            .files
            .get(&entry.file)
            .map(|f| f.mentioned_in_docs(&entry.name))
            .unwrap_or(false);
        if mentioned {
            return true;
        }
        match entry.kind {
            SymbolKind::Import => entry
                .qualified
                .as_ref()
                .map(|q| self.literals.contains(q))
                .unwrap_or(false),
            SymbolKind::Type => {
                self.graph.edges_to(&entry.file).any(|e| e.via == entry.name)
                    || entry
                        .qualified
                        .as_ref()
                        .map(|q| self.literals.contains(q))
                        .unwrap_or(false)
            }
            SymbolKind::Method | SymbolKind::Variable => self.literals.contains(&entry.name),
        }
    }

    /// Confirms the indexed view of `path` agrees with `text` and that its
    /// declared types resolve to a single file.
    pub fn check_consistency(&self, path: &Path, text: &str) -> Result<(), IndexInconsistency> {
        let Some(symbols) = self.files.get(path) else {
            return Ok(());
        };
        if symbols.fingerprint != fingerprint(text) {
            return Err(IndexInconsistency::StaleEntry {
                path: path.to_path_buf(),
            });
        }
        self.check_unique_types(symbols)
    }

    fn check_unique_types(&self, symbols: &FileSymbols) -> Result<(), IndexInconsistency> {
        for name in &symbols.types {
            if let Some(other) = self
                .type_map
                .get(name)
                .and_then(|owners| owners.iter().find(|p| **p != symbols.path))
            {
                return Err(IndexInconsistency::DuplicateDeclaration {
                    name: name.clone(),
                    path: symbols.path.clone(),
                    other: other.clone(),
                });
            }
        }
        Ok(())
    }

    /// Rebuilds the entry for `path` from its committed tree, then re-resolves
    /// the edges of the file and of its direct importers.
    pub fn refresh_file(&mut self, path: &Path, tree: &SyntaxTree) -> Result<(), IndexInconsistency> {
        let mut affected = self.importers(path);

        if let Some(old) = self.files.remove(path) {
            for name in &old.types {
                if let Some(owners) = self.type_map.get_mut(name) {
                    owners.remove(path);
                    if owners.is_empty() {
                        self.type_map.remove(name);
                    }
                }
            }
        }
        self.unparsed.remove(path);

        let symbols = FileSymbols::extract(path, tree);
        let packages: HashSet<String> = symbols.types.iter().map(|t| package_of(t).to_string()).collect();
        self.register_types(&symbols);
        let consistency = self.check_unique_types(&symbols);
        self.files.insert(path.to_path_buf(), symbols);

        for other in self.files.values() {
            if other.path == path {
                continue;
            }
            let same_package = other
                .package
                .as_deref()
                .map(|p| packages.contains(p))
                .unwrap_or_else(|| packages.contains(""));
            let imports_package = other
                .imports
                .iter()
                .any(|i| packages.iter().any(|p| !p.is_empty() && i.path.starts_with(p.as_str())));
            if same_package || imports_package {
                affected.insert(other.path.clone());
            }
        }

        self.resolve_edges_from(path);
        for file in &affected {
            self.resolve_edges_from(file);
        }
        self.collect_literals();
        debug!(file = %path.display(), reresolved = affected.len(), "index entry refreshed");
        consistency
    }

    fn register_types(&mut self, symbols: &FileSymbols) {
        for name in &symbols.types {
            self.type_map
                .entry(name.clone())
                .or_default()
                .insert(symbols.path.clone());
        }
    }

    fn collect_literals(&mut self) {
        self.literals = self
            .files
            .values()
            .flat_map(|f| f.string_literals().map(|s| s.to_string()))
            .collect();
    }

    fn link(&mut self, from: &Path, qualified: &str, via: &str) {
        let Some(owners) = self.type_map.get(qualified) else {
            return;
        };
        let owners: Vec<PathBuf> = owners.iter().cloned().collect();
        for to in owners {
            self.graph.add(DependencyEdge {
                from: from.to_path_buf(),
                to,
                via: via.to_string(),
            });
        }
    }

    fn resolve_edges_from(&mut self, path: &Path) {
        self.graph.remove_from(path);
        let Some(symbols) = self.files.get(path) else {
            return;
        };

        let mut targets: Vec<(String, String)> = Vec::new();
        let used: Vec<String> = symbols.used_names().map(|s| s.to_string()).collect();

        for import in &symbols.imports {
            match (import.is_static, import.is_wildcard) {
                (false, false) => {
                    if let Some(name) = import.bound_name() {
                        targets.push((import.path.clone(), name.to_string()));
                    }
                }
                (false, true) => {
                    for name in &used {
                        targets.push((format!("{}.{}", import.path, name), name.clone()));
                    }
                }
                (true, false) => {
                    let owner = package_of(&import.path);
                    let simple = owner.rsplit('.').next().unwrap_or(owner);
                    targets.push((owner.to_string(), simple.to_string()));
                }
                (true, true) => {
                    let simple = import.path.rsplit('.').next().unwrap_or(&import.path);
                    targets.push((import.path.clone(), simple.to_string()));
                }
            }
        }

        let package = symbols.package.clone().unwrap_or_default();
        for name in &used {
            let qualified = if package.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", package, name)
            };
            targets.push((qualified, name.clone()));
        }

        for (qualified, via) in targets {
            self.link(path, &qualified, &via);
        }
    }
}
