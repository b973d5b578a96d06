use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, COLLECTION_IS_EMPTY};
use crate::syntax::{StructuralNode, SyntaxTree};

pub struct UseIsEmpty;

/// Receiver text of a no-argument `size()` call; empty for an implicit `this`.
fn size_call<'a>(tree: &'a SyntaxTree, node: &StructuralNode) -> Option<&'a str> {
    if node.kind() != "method_invocation" {
        return None;
    }
    let name = node.child_by_field("name")?;
    let args = node.child_by_field("arguments")?;
    if tree.text(name) != "size" || args.named_children().next().is_some() {
        return None;
    }
    Some(node.child_by_field("object").map(|o| tree.text(o)).unwrap_or(""))
}

fn small_literal(tree: &SyntaxTree, node: &StructuralNode) -> Option<u8> {
    if node.kind() != "decimal_integer_literal" {
        return None;
    }
    match tree.text(node) {
        "0" => Some(0),
        "1" => Some(1),
        _ => None,
    }
}

/// Receiver and whether the comparison means "is empty" rather than
/// "is not empty".
fn emptiness(tree: &SyntaxTree, node: &StructuralNode) -> Option<(String, bool)> {
    if node.kind() != "binary_expression" {
        return None;
    }
    let op = node.child_by_field("operator")?.kind();
    let left = node.child_by_field("left")?;
    let right = node.child_by_field("right")?;
    let (receiver, literal, op) = match (size_call(tree, left), size_call(tree, right)) {
        (Some(receiver), None) => (receiver, small_literal(tree, right)?, op),
        (None, Some(receiver)) => {
            let flipped = match op {
                "<" => ">",
                ">" => "<",
                "<=" => ">=",
                ">=" => "<=",
                other => other,
            };
            (receiver, small_literal(tree, left)?, flipped)
        }
        _ => return None,
    };
    let empty = match (op, literal) {
        ("==", 0) | ("<", 1) | ("<=", 0) => true,
        ("!=", 0) | (">", 0) | (">=", 1) => false,
        _ => return None,
    };
    Some((receiver.to_string(), empty))
}

impl Transform for UseIsEmpty {
    fn category(&self) -> &'static str {
        COLLECTION_IS_EMPTY
    }

    fn name(&self) -> &'static str {
        "use-is-empty"
    }

    fn apply(&self, tree: &SyntaxTree, _finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let targets: Vec<(&StructuralNode, String)> = tree
            .root()
            .descendants()
            .filter(|n| ctx.on_target_lines(n))
            .filter_map(|n| {
                emptiness(tree, n).map(|(receiver, empty)| {
                    let call = if receiver.is_empty() {
                        "isEmpty()".to_string()
                    } else {
                        format!("{}.isEmpty()", receiver)
                    };
                    (n, if empty { call } else { format!("!{}", call) })
                })
            })
            .collect();
        if targets.is_empty() {
            return TransformResult::not_applicable("no size() comparison against 0 or 1");
        }

        let mut patched = tree.clone();
        let mut rewrites = Vec::new();
        for (node, replacement) in targets {
            rewrites.push(format!("`{}` -> `{}`", tree.text(node), replacement));
            patched.replace(&node.span(), replacement);
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("replaced size() comparison: {}", rewrites.join(", ")),
            target_lines: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::testing::{finding, run, run_idempotent};

    fn rewrite(condition: &str) -> String {
        let src = format!(
            "class Demo {{\n    boolean m(java.util.List<String> items) {{\n        return {};\n    }}\n}}\n",
            condition
        );
        let f = finding(COLLECTION_IS_EMPTY, "Use isEmpty() to check whether the collection is empty or not.", 3);
        let out = run_idempotent(&UseIsEmpty, &src, &f);
        out.lines().nth(2).unwrap().trim().trim_start_matches("return ").trim_end_matches(';').to_string()
    }

    #[test]
    fn test_empty_forms() {
        assert_eq!(rewrite("items.size() == 0"), "items.isEmpty()");
        assert_eq!(rewrite("0 == items.size()"), "items.isEmpty()");
        assert_eq!(rewrite("items.size() < 1"), "items.isEmpty()");
    }

    #[test]
    fn test_not_empty_forms() {
        assert_eq!(rewrite("items.size() != 0"), "!items.isEmpty()");
        assert_eq!(rewrite("items.size() > 0"), "!items.isEmpty()");
        assert_eq!(rewrite("items.size() >= 1"), "!items.isEmpty()");
        assert_eq!(rewrite("0 < items.size()"), "!items.isEmpty()");
    }

    #[test]
    fn test_other_comparisons_are_not_applicable() {
        let src = "class Demo {\n    boolean m(java.util.List<String> items) {\n        return items.size() > 2;\n    }\n}\n";
        let f = finding(COLLECTION_IS_EMPTY, "Use isEmpty().", 3);
        assert!(run(&UseIsEmpty, src, &f).is_err());
    }
}
