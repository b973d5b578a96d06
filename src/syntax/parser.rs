use tree_sitter::{Node, Parser, TreeCursor};

use crate::core::error::ParseError;

use super::tree::{Span, StructuralNode, SyntaxTree};

fn java_parser() -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| ParseError {
            line: 0,
            column: 0,
            message: format!("Java grammar unavailable: {}", e),
        })?;
    Ok(parser)
}

/// Parses Java source into a structural tree. Any ERROR or MISSING node in
/// the grammar's output is reported as a `ParseError`.
pub fn parse(source: &str) -> Result<SyntaxTree, ParseError> {
    let mut parser = java_parser()?;
    let tree = parser.parse(source, None).ok_or_else(|| ParseError {
        line: 0,
        column: 0,
        message: "parser produced no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(first_error(root));
    }

    let mut cursor = tree.walk();
    let structural = build(&mut cursor);
    Ok(SyntaxTree::new(source.to_string(), structural))
}

/// Returns true when `source` parses cleanly.
pub fn is_valid(source: &str) -> bool {
    parse(source).is_ok()
}

fn span_of(node: Node) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: start.row + 1,
        start_column: start.column + 1,
        end_line: end.row + 1,
        end_column: end.column + 1,
    }
}

fn build(cursor: &mut TreeCursor) -> StructuralNode {
    let node = cursor.node();
    let mut out = StructuralNode::new(node.kind(), cursor.field_name(), node.is_named(), span_of(node));
    if cursor.goto_first_child() {
        loop {
            out.push_child(build(cursor));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        cursor.goto_parent();
    }
    out
}

fn first_error(root: Node) -> ParseError {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            let message = if node.is_missing() {
                format!("missing {}", node.kind())
            } else {
                "unexpected syntax".to_string()
            };
            return ParseError {
                line: pos.row + 1,
                column: pos.column + 1,
                message,
            };
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev().filter(|c| c.has_error()));
    }
    let pos = root.start_position();
    ParseError {
        line: pos.row + 1,
        column: pos.column + 1,
        message: "unexpected syntax".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_class() {
        let tree = parse("public class A { void m() { int x = 1; } }\n").unwrap();
        assert_eq!(tree.root().kind(), "program");
        let class = tree
            .root()
            .descendants()
            .find(|n| n.kind() == "class_declaration")
            .unwrap();
        let name = class.child_by_field("name").unwrap();
        assert_eq!(tree.text(name), "A");
        assert_eq!(name.span().start_line, 1);
        assert_eq!(name.span().start_column, 14);
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = parse("public class A {\n    void m( {\n}\n").unwrap_err();
        assert!(err.line >= 2);
    }

    #[test]
    fn test_missing_semicolon_is_parse_error() {
        assert!(!is_valid("class A { int x = 1 }"));
        assert!(is_valid("class A { int x = 1; }"));
    }

    #[test]
    fn test_round_trip_with_comments_and_crlf() {
        let source = "// header\r\nclass A {\r\n    /* block */ int x;\r\n}\r\n";
        assert_eq!(parse(source).unwrap().serialize(), source);
    }
}
