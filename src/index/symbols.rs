use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::syntax::java;
use crate::syntax::{Span, StructuralNode, SyntaxTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Import,
    Variable,
    Method,
    Type,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolKind::Import => write!(f, "import"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Method => write!(f, "method"),
            SymbolKind::Type => write!(f, "type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolRef {
    pub file: PathBuf,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolEntry {
    pub name: String,
    /// Fully qualified name for imports and types.
    pub qualified: Option<String>,
    pub file: PathBuf,
    /// Span of the declaring node (import declaration, declarator, ...).
    pub span: Span,
    pub kind: SymbolKind,
    /// Usage sites inside the declaring file.
    pub references: Vec<SymbolRef>,
    /// Reachable by means the index cannot follow (wildcards, reflection,
    /// injection, overriding, non-private members). Never removable.
    pub dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDecl {
    /// Imported path without the trailing `.*`.
    pub path: String,
    pub is_static: bool,
    pub is_wildcard: bool,
    pub span: Span,
}

impl ImportDecl {
    /// The simple name this import brings into scope, if it is not a wildcard.
    pub fn bound_name(&self) -> Option<&str> {
        if self.is_wildcard {
            None
        } else {
            self.path.rsplit('.').next()
        }
    }

    pub fn display_path(&self) -> String {
        if self.is_wildcard {
            format!("{}.*", self.path)
        } else {
            self.path.clone()
        }
    }
}

/// Everything the index knows about one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileSymbols {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub symbols: Vec<SymbolEntry>,
    /// Qualified names of declared types; nested types as `pkg.Outer.Inner`.
    pub types: Vec<String>,
    #[serde(skip)]
    uses: HashMap<String, Vec<Span>>,
    #[serde(skip)]
    doc_mentions: BTreeSet<String>,
    #[serde(skip)]
    string_literals: BTreeSet<String>,
    pub fingerprint: String,
}

/// Hex blake3 digest of a file's text.
pub fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

fn doc_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:\{@link(?:plain)?|@see|@throws|@exception)\s+([A-Za-z_][\w.]*)")
            .expect("valid doc reference regex")
    })
}

struct Extractor<'a> {
    tree: &'a SyntaxTree,
    path: &'a Path,
    package: Option<String>,
    imports: Vec<ImportDecl>,
    symbols: Vec<(SymbolEntry, Option<Span>)>,
    types: Vec<String>,
    uses: HashMap<String, Vec<Span>>,
    doc_mentions: BTreeSet<String>,
    string_literals: BTreeSet<String>,
    type_stack: Vec<String>,
}

impl<'a> Extractor<'a> {
    fn qualify(&self, name: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(pkg) = &self.package {
            parts.push(pkg);
        }
        parts.extend(self.type_stack.iter().map(|s| s.as_str()));
        parts.push(name);
        parts.join(".")
    }

    fn declare(
        &mut self,
        node: &StructuralNode,
        name_node: Option<&StructuralNode>,
        kind: SymbolKind,
        qualified: Option<String>,
        dynamic: bool,
    ) {
        let Some(name_node) = name_node else {
            return;
        };
        let entry = SymbolEntry {
            name: self.tree.text(name_node).to_string(),
            qualified,
            file: self.path.to_path_buf(),
            span: node.span(),
            kind,
            references: Vec::new(),
            dynamic,
        };
        self.symbols.push((entry, Some(name_node.span())));
    }

    fn visit(&mut self, node: &StructuralNode) {
        match node.kind() {
            "package_declaration" => {
                self.package = node
                    .named_children()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                    .map(|c| self.tree.text(c).to_string());
                return;
            }
            "import_declaration" => {
                self.visit_import(node);
                return;
            }
            "line_comment" | "block_comment" => {
                for cap in doc_reference_pattern().captures_iter(self.tree.text(node)) {
                    let target = &cap[1];
                    self.doc_mentions.insert(target.to_string());
                    if let Some(first) = target.split('.').next() {
                        self.doc_mentions.insert(first.to_string());
                    }
                    if let Some(last) = target.rsplit('.').next() {
                        self.doc_mentions.insert(last.to_string());
                    }
                }
                return;
            }
            "string_literal" => {
                let text = self.tree.text(node).trim_matches('"');
                if !text.is_empty() && text.len() <= 200 {
                    self.string_literals.insert(text.to_string());
                }
                return;
            }
            "identifier" | "type_identifier" => {
                self.uses
                    .entry(self.tree.text(node).to_string())
                    .or_default()
                    .push(node.span());
                return;
            }
            _ => {}
        }

        if java::is_type_declaration(node) {
            if let Some(name) = java::declared_name(self.tree, node) {
                let qualified = self.qualify(name);
                self.types.push(qualified.clone());
                let dynamic = !java::annotations(self.tree, node).is_empty();
                self.declare(node, node.child_by_field("name"), SymbolKind::Type, Some(qualified), dynamic);
                self.type_stack.push(name.to_string());
                self.visit_children(node);
                self.type_stack.pop();
                return;
            }
        }

        match node.kind() {
            "method_declaration" | "constructor_declaration" => {
                let dynamic = !java::has_modifier(node, "private")
                    || !java::annotations(self.tree, node).is_empty();
                self.declare(node, node.child_by_field("name"), SymbolKind::Method, None, dynamic);
            }
            "field_declaration" => {
                let dynamic = !java::has_modifier(node, "private")
                    || !java::annotations(self.tree, node).is_empty();
                for declarator in node.children_by_field("declarator") {
                    self.declare(declarator, declarator.child_by_field("name"), SymbolKind::Variable, None, dynamic);
                }
            }
            "local_variable_declaration" => {
                for declarator in node.children_by_field("declarator") {
                    self.declare(declarator, declarator.child_by_field("name"), SymbolKind::Variable, None, false);
                }
            }
            "formal_parameter" | "catch_formal_parameter" | "enhanced_for_statement" => {
                self.declare(node, node.child_by_field("name"), SymbolKind::Variable, None, false);
            }
            "enum_constant" => {
                self.declare(node, node.child_by_field("name"), SymbolKind::Variable, None, true);
            }
            _ => {}
        }
        self.visit_children(node);
    }

    fn visit_children(&mut self, node: &StructuralNode) {
        for child in node.children() {
            self.visit(child);
        }
    }

    fn visit_import(&mut self, node: &StructuralNode) {
        let Some(target) = node
            .named_children()
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        else {
            return;
        };
        let import = ImportDecl {
            path: self.tree.text(target).to_string(),
            is_static: node.children().iter().any(|c| c.kind() == "static"),
            is_wildcard: node.children().iter().any(|c| c.kind() == "asterisk"),
            span: node.span(),
        };
        let name = import.bound_name().unwrap_or("*").to_string();
        self.symbols.push((
            SymbolEntry {
                name,
                qualified: Some(import.display_path()),
                file: self.path.to_path_buf(),
                span: node.span(),
                kind: SymbolKind::Import,
                references: Vec::new(),
                dynamic: import.is_wildcard,
            },
            None,
        ));
        self.imports.push(import);
    }
}

impl FileSymbols {
    pub fn extract(path: &Path, tree: &SyntaxTree) -> Self {
        let mut ex = Extractor {
            tree,
            path,
            package: None,
            imports: Vec::new(),
            symbols: Vec::new(),
            types: Vec::new(),
            uses: HashMap::new(),
            doc_mentions: BTreeSet::new(),
            string_literals: BTreeSet::new(),
            type_stack: Vec::new(),
        };
        ex.visit(tree.root());

        let uses = ex.uses;
        let symbols = ex
            .symbols
            .into_iter()
            .map(|(mut entry, name_span)| {
                entry.references = uses
                    .get(&entry.name)
                    .map(|spans| {
                        spans
                            .iter()
                            .filter(|s| Some(**s) != name_span)
                            .map(|s| SymbolRef {
                                file: path.to_path_buf(),
                                span: *s,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                entry
            })
            .collect();

        Self {
            path: path.to_path_buf(),
            package: ex.package,
            imports: ex.imports,
            symbols,
            types: ex.types,
            uses,
            doc_mentions: ex.doc_mentions,
            string_literals: ex.string_literals,
            fingerprint: fingerprint(tree.source()),
        }
    }

    /// Identifier occurrences of `name` outside import and package clauses.
    pub fn uses_of(&self, name: &str) -> &[Span] {
        self.uses.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn used_names(&self) -> impl Iterator<Item = &str> {
        self.uses.keys().map(|k| k.as_str())
    }

    pub fn mentioned_in_docs(&self, name: &str) -> bool {
        self.doc_mentions.contains(name)
    }

    pub fn string_literals(&self) -> impl Iterator<Item = &str> {
        self.string_literals.iter().map(|s| s.as_str())
    }

    pub fn symbol_at(&self, kind: SymbolKind, span: &Span) -> Option<&SymbolEntry> {
        self.symbols.iter().find(|s| s.kind == kind && s.span == *span)
    }

    pub fn symbols_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SymbolEntry> + 'a {
        self.symbols.iter().filter(move |s| s.name == name)
    }

    /// Simple names of declared types (`Inner` for `pkg.Outer.Inner`).
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.rsplit('.').next().unwrap_or(t))
    }

    /// Whether `name` can be resolved through this file's imports, its own
    /// declarations, or its package.
    pub fn resolves(&self, name: &str) -> bool {
        self.type_names().any(|t| t == name)
            || self.imports.iter().any(|i| i.is_wildcard || i.bound_name() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    const SOURCE: &str = r#"package com.example;

import java.util.List;
import java.util.Map;
import java.io.*;
import static java.lang.Math.max;

/** Uses {@link Map} in docs only. */
public class Service {
    private final List<String> names;
    @Inject private Object injected;

    private int helper(int value) {
        int unused = 3;
        int total = max(value, 1);
        return total;
    }

    class Inner {}

    void load() throws Exception {
        Class.forName("com.example.Plugin");
    }
}
"#;

    fn extract() -> FileSymbols {
        let tree = parse(SOURCE).unwrap();
        FileSymbols::extract(Path::new("src/Service.java"), &tree)
    }

    #[test]
    fn test_package_imports_and_types() {
        let fs = extract();
        assert_eq!(fs.package.as_deref(), Some("com.example"));
        assert_eq!(fs.imports.len(), 4);
        assert!(fs.imports[2].is_wildcard);
        assert_eq!(fs.imports[2].display_path(), "java.io.*");
        assert!(fs.imports[3].is_static);
        assert_eq!(fs.imports[3].bound_name(), Some("max"));
        assert_eq!(fs.types, vec!["com.example.Service", "com.example.Service.Inner"]);
    }

    #[test]
    fn test_import_usage_sites() {
        let fs = extract();
        let list = fs.symbols_named("List").find(|s| s.kind == SymbolKind::Import).unwrap();
        assert_eq!(list.references.len(), 1);
        let map = fs.symbols_named("Map").find(|s| s.kind == SymbolKind::Import).unwrap();
        assert!(map.references.is_empty());
        assert!(fs.mentioned_in_docs("Map"));
        let wildcard = fs.symbols.iter().find(|s| s.name == "*").unwrap();
        assert!(wildcard.dynamic);
    }

    #[test]
    fn test_variables_and_methods() {
        let fs = extract();
        let unused = fs.symbols_named("unused").next().unwrap();
        assert_eq!(unused.kind, SymbolKind::Variable);
        assert!(unused.references.is_empty());
        assert!(!unused.dynamic);
        let total = fs.symbols_named("total").next().unwrap();
        assert_eq!(total.references.len(), 1);
        let injected = fs.symbols_named("injected").next().unwrap();
        assert!(injected.dynamic);
        let helper = fs.symbols_named("helper").next().unwrap();
        assert_eq!(helper.kind, SymbolKind::Method);
        assert!(!helper.dynamic);
    }

    #[test]
    fn test_string_literals_and_fingerprint() {
        let fs = extract();
        assert!(fs.string_literals().any(|s| s == "com.example.Plugin"));
        assert_eq!(fs.fingerprint, fingerprint(SOURCE));
        assert_eq!(fs.fingerprint.len(), 64);
        assert_ne!(fingerprint(SOURCE), fingerprint(&SOURCE.replace("Plugin", "Plugins")));
        assert!(fs.resolves("List"));
        assert!(fs.resolves("Inner"));
    }
}
