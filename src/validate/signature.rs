use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::syntax::java;
use crate::syntax::{StructuralNode, SyntaxTree};

/// Externally visible shape of one declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Signature {
    pub container: String,
    pub kind: &'static str,
    pub name: String,
    pub params: Vec<String>,
    /// Return type for methods, declared type for fields.
    pub returns: Option<String>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = if self.container.is_empty() {
            String::new()
        } else {
            format!("{}.", self.container)
        };
        match self.kind {
            "method" | "constructor" => write!(f, "{} {}{}({})", self.kind, owner, self.name, self.params.join(", ")),
            _ => write!(f, "{} {}{}", self.kind, owner, self.name),
        }
    }
}

struct Collector<'a> {
    tree: &'a SyntaxTree,
    path: Vec<String>,
    out: BTreeSet<Signature>,
}

impl Collector<'_> {
    fn container(&self) -> String {
        self.path.join(".")
    }

    fn type_text(&self, node: Option<&StructuralNode>) -> Option<String> {
        node.map(|n| java::normalize_type(self.tree.text(n)))
    }

    fn params(&self, node: &StructuralNode) -> Vec<String> {
        let Some(params) = node.child_by_field("parameters") else {
            return Vec::new();
        };
        params
            .named_children()
            .filter(|p| matches!(p.kind(), "formal_parameter" | "spread_parameter" | "receiver_parameter"))
            .map(|p| {
                let ty = p
                    .child_by_field("type")
                    .or_else(|| p.named_children().find(|c| c.kind() != "modifiers"))
                    .map(|t| java::normalize_type(self.tree.text(t)))
                    .unwrap_or_default();
                if p.kind() == "spread_parameter" {
                    format!("{}...", ty)
                } else {
                    ty
                }
            })
            .collect()
    }

    fn visit(&mut self, node: &StructuralNode) {
        let private = java::has_modifier(node, "private");

        if java::is_type_declaration(node) {
            if let Some(name) = java::declared_name(self.tree, node) {
                if !private {
                    self.out.insert(Signature {
                        container: self.container(),
                        kind: "type",
                        name: name.to_string(),
                        params: Vec::new(),
                        returns: None,
                    });
                }
                self.path.push(name.to_string());
                for child in node.children() {
                    self.visit(child);
                }
                self.path.pop();
                return;
            }
        }

        match node.kind() {
            "method_declaration" | "constructor_declaration" if !private => {
                let kind = if node.kind() == "method_declaration" { "method" } else { "constructor" };
                if let Some(name) = java::declared_name(self.tree, node) {
                    self.out.insert(Signature {
                        container: self.container(),
                        kind,
                        name: name.to_string(),
                        params: self.params(node),
                        returns: self.type_text(node.child_by_field("type")),
                    });
                }
                // Local and anonymous classes are not part of the file's API.
                return;
            }
            "method_declaration" | "constructor_declaration" => return,
            "field_declaration" | "constant_declaration" if !private => {
                let ty = self.type_text(node.child_by_field("type"));
                for declarator in node.children_by_field("declarator") {
                    if let Some(name) = declarator.child_by_field("name") {
                        self.out.insert(Signature {
                            container: self.container(),
                            kind: "field",
                            name: self.tree.text(name).to_string(),
                            params: Vec::new(),
                            returns: ty.clone(),
                        });
                    }
                }
                return;
            }
            "field_declaration" | "constant_declaration" => return,
            "enum_constant" => {
                if let Some(name) = java::declared_name(self.tree, node) {
                    self.out.insert(Signature {
                        container: self.container(),
                        kind: "enum-constant",
                        name: name.to_string(),
                        params: Vec::new(),
                        returns: None,
                    });
                }
                return;
            }
            _ => {}
        }

        for child in node.children() {
            self.visit(child);
        }
    }
}

pub fn signatures(tree: &SyntaxTree) -> BTreeSet<Signature> {
    let mut collector = Collector {
        tree,
        path: Vec::new(),
        out: BTreeSet::new(),
    };
    collector.visit(tree.root());
    collector.out
}

/// Signatures present in only one of the two sets.
pub fn drift(before: &BTreeSet<Signature>, after: &BTreeSet<Signature>) -> Vec<String> {
    let removed = before.difference(after).map(|s| format!("removed {}", s));
    let added = after.difference(before).map(|s| format!("added {}", s));
    removed.chain(added).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn sigs(src: &str) -> BTreeSet<Signature> {
        signatures(&parse(src).unwrap())
    }

    #[test]
    fn test_collects_non_private_declarations() {
        let set = sigs(
            "public class A {\n    public static final int MAX = 3;\n    private int hidden;\n    public A(String s) {}\n    int size(java.util.List<String> items, int... rest) { return 0; }\n    private void helper() {}\n    static class B { void run() {} }\n}\n",
        );
        let rendered: Vec<String> = set.iter().map(|s| s.to_string()).collect();
        assert!(rendered.contains(&"type A".to_string()));
        assert!(rendered.contains(&"field A.MAX".to_string()));
        assert!(rendered.contains(&"constructor A.A(String)".to_string()));
        assert!(rendered.contains(&"method A.size(java.util.List<String>, int...)".to_string()));
        assert!(rendered.contains(&"method A.B.run()".to_string()));
        assert!(!rendered.iter().any(|r| r.contains("hidden") || r.contains("helper")));
    }

    #[test]
    fn test_body_edits_do_not_drift() {
        let before = sigs("class A {\n    boolean ok(boolean f) { return f == true; }\n}\n");
        let after = sigs("class A {\n    boolean ok(boolean f) { return f; }\n}\n");
        assert!(drift(&before, &after).is_empty());
    }

    #[test]
    fn test_changed_parameters_drift() {
        let before = sigs("class A {\n    void run(int a) {}\n}\n");
        let after = sigs("class A {\n    void run(long a) {}\n}\n");
        let changes = drift(&before, &after);
        assert_eq!(changes.len(), 2);
        assert!(changes[0].starts_with("removed method A.run(int)"));
    }
}
