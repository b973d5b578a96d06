use serde::{Deserialize, Serialize};

/// Location of a node in the source text. Lines and columns are 1-based,
/// byte offsets are 0-based and end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn covers_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn overlaps_lines(&self, start: usize, end: usize) -> bool {
        self.start_line <= end && start <= self.end_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeEdit {
    Replace(String),
    Remove,
}

/// One node of a parsed file. Children are owned; the span points back into
/// the text the tree was parsed from.
#[derive(Debug, Clone)]
pub struct StructuralNode {
    kind: &'static str,
    field: Option<&'static str>,
    named: bool,
    span: Span,
    children: Vec<StructuralNode>,
    edit: Option<NodeEdit>,
    appended: Option<String>,
}

impl StructuralNode {
    pub(crate) fn new(
        kind: &'static str,
        field: Option<&'static str>,
        named: bool,
        span: Span,
    ) -> Self {
        Self {
            kind,
            field,
            named,
            span,
            children: Vec::new(),
            edit: None,
            appended: None,
        }
    }

    pub(crate) fn push_child(&mut self, child: StructuralNode) {
        self.children.push(child);
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Grammar field this node occupies in its parent (`name`, `body`, ...).
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn children(&self) -> &[StructuralNode] {
        &self.children
    }

    pub fn named_children(&self) -> impl Iterator<Item = &StructuralNode> {
        self.children.iter().filter(|c| c.named)
    }

    pub fn child_by_field(&self, field: &str) -> Option<&StructuralNode> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    pub fn children_by_field<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a StructuralNode> + 'a {
        self.children.iter().filter(move |c| c.field == Some(field))
    }

    pub fn child_of_kind(&self, kind: &str) -> Option<&StructuralNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Pre-order walk over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn is_modified(&self) -> bool {
        self.edit.is_some()
            || self.appended.is_some()
            || self.children.iter().any(|c| c.is_modified())
    }

    fn locate_mut(&mut self, span: &Span) -> Option<&mut StructuralNode> {
        if self.span == *span {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find(|c| c.span.contains(span))
            .and_then(|c| c.locate_mut(span))
    }

    fn collect_splices(&self, source: &str, out: &mut Vec<Splice>) {
        match &self.edit {
            Some(NodeEdit::Replace(text)) => out.push(Splice {
                start: self.span.start_byte,
                end: self.span.end_byte,
                text: text.clone(),
            }),
            Some(NodeEdit::Remove) => {
                let (start, end) = removal_extent(source, self.span.start_byte, self.span.end_byte);
                out.push(Splice {
                    start,
                    end,
                    text: String::new(),
                });
            }
            None => {
                for child in &self.children {
                    child.collect_splices(source, out);
                }
            }
        }
        if let Some(text) = &self.appended {
            out.push(Splice {
                start: self.span.end_byte,
                end: self.span.end_byte,
                text: text.clone(),
            });
        }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a StructuralNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a StructuralNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[derive(Debug)]
struct Splice {
    start: usize,
    end: usize,
    text: String,
}

/// Widens a removal to the full line(s) when nothing else shares them, and
/// swallows the whitespace in front of a trailing comment.
fn removal_extent(source: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = source[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(source.len());

    let before = &source[line_start..start];
    let after = &source[end..line_end];
    if before.trim().is_empty() && after.trim().is_empty() {
        return (line_start, line_end);
    }
    if after.trim().is_empty() {
        let trimmed = before.trim_end_matches([' ', '\t']).len();
        return (line_start + trimmed, end);
    }
    (start, end)
}

/// A parsed source file: the original text plus its mutable structural tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    root: StructuralNode,
}

impl SyntaxTree {
    pub(crate) fn new(source: String, root: StructuralNode) -> Self {
        Self { source, root }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &StructuralNode {
        &self.root
    }

    /// Original text covered by `node`.
    pub fn text(&self, node: &StructuralNode) -> &str {
        &self.source[node.span.start_byte..node.span.end_byte]
    }

    /// Text of the source line (1-based) without its line terminator.
    pub fn line_text(&self, line: usize) -> &str {
        self.source
            .split('\n')
            .nth(line.saturating_sub(1))
            .map(|l| l.trim_end_matches('\r'))
            .unwrap_or("")
    }

    pub fn is_modified(&self) -> bool {
        self.root.is_modified()
    }

    /// Replaces the node with exactly this span by `text`.
    pub fn replace(&mut self, span: &Span, text: impl Into<String>) -> bool {
        match self.root.locate_mut(span) {
            Some(node) => {
                node.edit = Some(NodeEdit::Replace(text.into()));
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, span: &Span) -> bool {
        match self.root.locate_mut(span) {
            Some(node) => {
                node.edit = Some(NodeEdit::Remove);
                true
            }
            None => false,
        }
    }

    /// Emits `text` right after the node with this span.
    pub fn insert_after(&mut self, span: &Span, text: impl Into<String>) -> bool {
        match self.root.locate_mut(span) {
            Some(node) => {
                let text = text.into();
                match &mut node.appended {
                    Some(existing) => existing.push_str(&text),
                    None => node.appended = Some(text),
                }
                true
            }
            None => false,
        }
    }

    /// Writes the tree back to text. Untouched regions are copied verbatim
    /// from the original source.
    pub fn serialize(&self) -> String {
        let mut splices = Vec::new();
        self.root.collect_splices(&self.source, &mut splices);
        if splices.is_empty() {
            return self.source.clone();
        }
        splices.sort_by_key(|s| (s.start, s.end));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for splice in splices {
            if splice.start < cursor {
                continue;
            }
            out.push_str(&self.source[cursor..splice.start]);
            out.push_str(&splice.text);
            cursor = splice.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::syntax::parse;

    const SOURCE: &str = "package demo;\n\nimport java.util.List;\nimport java.util.Map;\n\npublic class Demo {\n    int x = 1; // counter\n}\n";

    #[test]
    fn test_unmodified_tree_round_trips() {
        let tree = parse(SOURCE).unwrap();
        assert!(!tree.is_modified());
        assert_eq!(tree.serialize(), SOURCE);
    }

    #[test]
    fn test_remove_full_line_node() {
        let mut tree = parse(SOURCE).unwrap();
        let span = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "import_declaration")
            .unwrap()
            .span();
        assert!(tree.remove(&span));
        let out = tree.serialize();
        assert!(!out.contains("java.util.List"));
        assert!(out.contains("import java.util.Map;\n\npublic class Demo"));
    }

    #[test]
    fn test_remove_trailing_comment_keeps_code() {
        let mut tree = parse(SOURCE).unwrap();
        let span = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "line_comment")
            .unwrap()
            .span();
        tree.remove(&span);
        assert!(tree.serialize().contains("    int x = 1;\n}"));
    }

    #[test]
    fn test_replace_and_insert_preserve_untouched_text() {
        let mut tree = parse(SOURCE).unwrap();
        let literal = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "decimal_integer_literal")
            .unwrap()
            .span();
        tree.replace(&literal, "42");
        let body_open = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "class_body")
            .and_then(|b| b.child_of_kind("{"))
            .unwrap()
            .span();
        tree.insert_after(&body_open, "\n    int y;");
        let out = tree.serialize();
        assert!(out.starts_with("package demo;\n\nimport java.util.List;"));
        assert!(out.contains("public class Demo {\n    int y;\n    int x = 42; // counter"));
    }

    #[test]
    fn test_line_text() {
        let tree = parse(SOURCE).unwrap();
        assert_eq!(tree.line_text(3), "import java.util.List;");
        assert_eq!(tree.line_text(99), "");
    }
}
