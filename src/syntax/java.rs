//! Java-specific queries over the structural tree.

use super::tree::{StructuralNode, SyntaxTree};

pub const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub const COMMENTS: &[&str] = &["line_comment", "block_comment"];

pub fn is_type_declaration(node: &StructuralNode) -> bool {
    TYPE_DECLARATIONS.contains(&node.kind())
}

pub fn is_comment(node: &StructuralNode) -> bool {
    COMMENTS.contains(&node.kind())
}

/// Keyword modifiers (`public`, `static`, ...) of a declaration. Annotations
/// are not included.
pub fn modifiers(node: &StructuralNode) -> Vec<&'static str> {
    node.child_of_kind("modifiers")
        .map(|m| m.children().iter().filter(|c| !c.is_named()).map(|c| c.kind()).collect())
        .unwrap_or_default()
}

pub fn has_modifier(node: &StructuralNode, modifier: &str) -> bool {
    modifiers(node).contains(&modifier)
}

/// Simple names of the annotations on a declaration (`Override`, `Inject`).
pub fn annotations<'a>(tree: &'a SyntaxTree, node: &StructuralNode) -> Vec<&'a str> {
    let Some(mods) = node.child_of_kind("modifiers") else {
        return Vec::new();
    };
    mods.children()
        .iter()
        .filter(|c| c.kind() == "marker_annotation" || c.kind() == "annotation")
        .filter_map(|c| c.child_by_field("name"))
        .map(|n| {
            let text = tree.text(n);
            text.rsplit('.').next().unwrap_or(text)
        })
        .collect()
}

pub fn declared_name<'a>(tree: &'a SyntaxTree, node: &StructuralNode) -> Option<&'a str> {
    node.child_by_field("name").map(|n| tree.text(n))
}

pub fn is_boolean_literal(node: &StructuralNode) -> bool {
    matches!(node.kind(), "true" | "false")
}

/// Innermost node of one of `kinds` whose span covers `line`.
pub fn innermost_covering<'a>(
    root: &'a StructuralNode,
    line: usize,
    kinds: &[&str],
) -> Option<&'a StructuralNode> {
    root.descendants()
        .filter(|n| kinds.contains(&n.kind()) && n.span().covers_line(line))
        .min_by_key(|n| n.span().end_byte - n.span().start_byte)
}

/// Collapses whitespace so `Map<String,  Integer>` and `Map<String, Integer>`
/// compare equal.
pub fn normalize_type(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for token in text.split_whitespace() {
        if !out.is_empty() && needs_space(out.chars().last(), token.chars().next()) {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn needs_space(prev: Option<char>, next: Option<char>) -> bool {
    match (prev, next) {
        (Some(p), Some(n)) => (p.is_alphanumeric() || p == '_') && (n.is_alphanumeric() || n == '_'),
        _ => false,
    }
}

/// Leading whitespace of the line a node starts on.
pub fn indentation_of<'a>(tree: &'a SyntaxTree, node: &StructuralNode) -> &'a str {
    let line = tree.line_text(node.span().start_line);
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}
