use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, BOOLEAN_LITERAL_COMPARISON};
use crate::syntax::java;
use crate::syntax::{StructuralNode, SyntaxTree};

pub struct NormalizeBooleanComparison;

/// `x == true` style comparison: returns the non-literal operand, whether the
/// literal is `true`, and whether the operator is `==`.
fn comparison(node: &StructuralNode) -> Option<(&StructuralNode, bool, bool)> {
    if node.kind() != "binary_expression" {
        return None;
    }
    let op = node.child_by_field("operator")?.kind();
    if op != "==" && op != "!=" {
        return None;
    }
    let left = node.child_by_field("left")?;
    let right = node.child_by_field("right")?;
    let (literal, other) = match (java::is_boolean_literal(left), java::is_boolean_literal(right)) {
        (true, false) => (left, right),
        (false, true) => (right, left),
        _ => return None,
    };
    Some((other, literal.kind() == "true", op == "=="))
}

/// Whether `text` can take a prefix `!` without parentheses: no operator or
/// whitespace outside brackets and string literals.
fn is_primary_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in text.chars() {
        if let Some(q) = quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                _ if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ if depth > 0 => {}
            c if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' => {}
            _ => return false,
        }
    }
    depth == 0
}

/// Inner text of `(...)` when the outer parentheses enclose all of `text`.
fn unwrap_parens(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('(')?.strip_suffix(')')?;
    // `(a) && (b)` must not unwrap to `a) && (b`
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return None;
        }
    }
    Some(inner)
}

fn negate(text: &str) -> String {
    let cancelled = text
        .strip_prefix('!')
        .or_else(|| unwrap_parens(text).and_then(|inner| inner.strip_prefix('!')));
    match cancelled {
        Some(rest) if is_primary_text(rest) => rest.to_string(),
        _ if is_primary_text(text) => format!("!{}", text),
        _ => format!("!({})", text),
    }
}

/// Source of `node` with every literal comparison inside it simplified.
fn render(tree: &SyntaxTree, node: &StructuralNode) -> String {
    if let Some((other, literal, equals)) = comparison(node) {
        let operand = render(tree, other);
        return if literal == equals { operand } else { negate(&operand) };
    }
    if !node.descendants().any(|d| comparison(d).is_some()) {
        return tree.text(node).to_string();
    }
    let source = tree.source();
    let mut out = String::new();
    let mut cursor = node.span().start_byte;
    for child in node.children() {
        out.push_str(&source[cursor..child.span().start_byte]);
        out.push_str(&render(tree, child));
        cursor = child.span().end_byte;
    }
    out.push_str(&source[cursor..node.span().end_byte]);
    out
}

impl Transform for NormalizeBooleanComparison {
    fn category(&self) -> &'static str {
        BOOLEAN_LITERAL_COMPARISON
    }

    fn name(&self) -> &'static str {
        "normalize-boolean-comparison"
    }

    fn apply(&self, tree: &SyntaxTree, _finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let targets: Vec<&StructuralNode> = tree
            .root()
            .descendants()
            .filter(|n| ctx.on_target_lines(n) && comparison(n).is_some())
            .collect();
        // Outermost only; render() rewrites nested comparisons itself.
        let outermost: Vec<&StructuralNode> = targets
            .iter()
            .filter(|n| !targets.iter().any(|o| o.span() != n.span() && o.span().contains(&n.span())))
            .copied()
            .collect();
        if outermost.is_empty() {
            return TransformResult::not_applicable("no comparison against a boolean literal");
        }

        let mut patched = tree.clone();
        let mut rewrites = Vec::new();
        for node in outermost {
            let replacement = render(tree, node);
            rewrites.push(format!("`{}` -> `{}`", tree.text(node), replacement));
            patched.replace(&node.span(), replacement);
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("simplified {}", rewrites.join(", ")),
            target_lines: None,
        }
    }
}
