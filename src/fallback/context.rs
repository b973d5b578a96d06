use serde::Serialize;
use std::path::PathBuf;

use crate::syntax::java;
use crate::syntax::{StructuralNode, SyntaxTree};

/// Lines of source shown on each side of the finding.
pub const EXCERPT_RADIUS: usize = 8;

const NESTING_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "enhanced_for_statement",
    "while_statement",
    "do_statement",
    "switch_expression",
    "catch_clause",
    "ternary_expression",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComplexityMetrics {
    pub cyclomatic: usize,
    pub cognitive: usize,
    pub max_nesting: usize,
    pub lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodContext {
    pub signature: String,
    pub start_line: usize,
    pub end_line: usize,
    pub metrics: ComplexityMetrics,
}

/// What the fallback sees besides the file text itself.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SurroundingContext {
    pub excerpt: String,
    pub imports: Vec<String>,
    pub method: Option<MethodContext>,
    pub importers: Vec<PathBuf>,
}

fn logical_operator(node: &StructuralNode) -> Option<&'static str> {
    if node.kind() != "binary_expression" {
        return None;
    }
    node.child_by_field("operator")
        .map(|op| op.kind())
        .filter(|op| *op == "&&" || *op == "||")
}

fn cyclomatic(node: &StructuralNode) -> usize {
    1 + node
        .descendants()
        .filter(|n| {
            matches!(
                n.kind(),
                "if_statement"
                    | "for_statement"
                    | "enhanced_for_statement"
                    | "while_statement"
                    | "do_statement"
                    | "catch_clause"
                    | "ternary_expression"
            ) || (n.kind() == "switch_label" && n.children().first().map(|c| c.kind()) == Some("case"))
                || logical_operator(n).is_some()
        })
        .count()
}

struct Cognitive {
    score: usize,
    max_nesting: usize,
}

impl Cognitive {
    fn walk(&mut self, node: &StructuralNode, nesting: usize, parent_op: Option<&str>, else_if: bool) {
        let mut inner = nesting;
        if NESTING_KINDS.contains(&node.kind()) {
            // `else if` costs one but does not nest deeper
            self.score += if else_if { 1 } else { 1 + nesting };
            inner = if else_if { nesting } else { nesting + 1 };
            self.max_nesting = self.max_nesting.max(inner);
        }
        let op = logical_operator(node);
        if op.is_some() && op != parent_op {
            self.score += 1;
        }
        for child in node.children() {
            let chained = node.kind() == "if_statement"
                && child.field() == Some("alternative")
                && child.kind() == "if_statement";
            if node.kind() == "if_statement" && child.field() == Some("alternative") && !chained {
                self.score += 1;
            }
            self.walk(child, inner, op, chained);
        }
    }
}

pub fn metrics(method: &StructuralNode) -> ComplexityMetrics {
    let mut cognitive = Cognitive { score: 0, max_nesting: 0 };
    if let Some(body) = method.child_by_field("body") {
        cognitive.walk(body, 0, None, false);
    }
    ComplexityMetrics {
        cyclomatic: cyclomatic(method),
        cognitive: cognitive.score,
        max_nesting: cognitive.max_nesting,
        lines: method.span().end_line - method.span().start_line + 1,
    }
}

/// Numbered source lines around `start..=end`.
pub fn excerpt(source: &str, start: usize, end: usize) -> String {
    let from = start.saturating_sub(EXCERPT_RADIUS).max(1);
    let to = end + EXCERPT_RADIUS;
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .skip_while(|(number, _)| *number < from)
        .take_while(|(number, _)| *number <= to)
        .map(|(number, line)| format!("{:>5} | {}\n", number, line))
        .collect()
}

impl SurroundingContext {
    pub fn gather(tree: &SyntaxTree, start_line: usize, end_line: usize, importers: Vec<PathBuf>) -> Self {
        let imports = tree
            .root()
            .children()
            .iter()
            .filter(|n| n.kind() == "import_declaration")
            .map(|n| tree.text(n).to_string())
            .collect();

        let method = java::innermost_covering(
            tree.root(),
            start_line,
            &["method_declaration", "constructor_declaration"],
        )
        .map(|m| {
            let head_end = m
                .child_by_field("body")
                .map(|b| b.span().start_byte)
                .unwrap_or(m.span().end_byte);
            let signature = tree.source()[m.span().start_byte..head_end].trim().to_string();
            MethodContext {
                signature,
                start_line: m.span().start_line,
                end_line: m.span().end_line,
                metrics: metrics(m),
            }
        });

        Self {
            excerpt: excerpt(tree.source(), start_line, end_line),
            imports,
            method,
            importers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    const SOURCE: &str = "import java.util.List;\n\nclass Demo {\n    int score(List<Integer> xs, boolean strict) {\n        int total = 0;\n        for (int x : xs) {\n            if (x > 0 && strict) {\n                total += x;\n            } else if (x < 0) {\n                total -= x;\n            } else {\n                total = strict ? total : 0;\n            }\n        }\n        return total;\n    }\n}\n";

    #[test]
    fn test_method_metrics() {
        let tree = parse(SOURCE).unwrap();
        let ctx = SurroundingContext::gather(&tree, 7, 7, vec![]);
        let method = ctx.method.unwrap();
        assert_eq!(method.signature, "int score(List<Integer> xs, boolean strict)");
        assert_eq!(method.start_line, 4);
        assert_eq!(method.metrics.lines, 13);
        // for, if, else-if, ternary, &&
        assert_eq!(method.metrics.cyclomatic, 6);
        // for 1, if 2, && 1, else-if 1, else 1, ternary 3
        assert_eq!(method.metrics.cognitive, 9);
        assert_eq!(method.metrics.max_nesting, 3);
        assert_eq!(ctx.imports, vec!["import java.util.List;"]);
    }

    #[test]
    fn test_excerpt_window() {
        let text: String = (1..=30).map(|i| format!("line{}\n", i)).collect();
        let out = excerpt(&text, 15, 15);
        assert!(out.starts_with("    7 | line7"));
        assert!(out.trim_end().ends_with("23 | line23"));
        assert!(excerpt(&text, 2, 2).starts_with("    1 | line1"));
    }
}
