use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, UNUSED_LOCAL_VARIABLE};
use crate::index::SymbolKind;
use crate::syntax::{StructuralNode, SyntaxTree};

pub struct RemoveUnusedVariable;

/// Initializers whose evaluation cannot be observed.
fn is_pure(node: &StructuralNode) -> bool {
    match node.kind() {
        "identifier" | "this" | "null_literal" | "true" | "false" | "character_literal"
        | "string_literal" | "decimal_integer_literal" | "hex_integer_literal"
        | "octal_integer_literal" | "binary_integer_literal" | "decimal_floating_point_literal"
        | "hex_floating_point_literal" | "class_literal" => true,
        "field_access" | "parenthesized_expression" => node.named_children().all(is_pure),
        _ => false,
    }
}

impl Transform for RemoveUnusedVariable {
    fn category(&self) -> &'static str {
        UNUSED_LOCAL_VARIABLE
    }

    fn name(&self) -> &'static str {
        "remove-unused-local-variable"
    }

    fn apply(&self, tree: &SyntaxTree, finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let Some(symbols) = ctx.symbols() else {
            return TransformResult::not_applicable("file is not indexed");
        };
        let wanted = finding.quoted_name();

        let declaration = tree.root().descendants().find(|n| {
            n.kind() == "local_variable_declaration"
                && ctx.on_target_lines(n)
                && n.children_by_field("declarator").any(|d| {
                    d.child_by_field("name")
                        .map(|name| wanted.map_or(true, |w| tree.text(name) == w))
                        .unwrap_or(false)
                })
        });
        let Some(declaration) = declaration else {
            return TransformResult::not_applicable("no matching local variable declaration");
        };

        let declarators: Vec<&StructuralNode> = declaration.children_by_field("declarator").collect();
        let [declarator] = declarators.as_slice() else {
            return TransformResult::not_applicable("declaration declares several variables");
        };
        if let Some(value) = declarator.child_by_field("value") {
            if !is_pure(value) {
                return TransformResult::not_applicable("initializer may have side effects");
            }
        }

        let Some(entry) = symbols.symbol_at(SymbolKind::Variable, &declarator.span()) else {
            return TransformResult::not_applicable("variable is not indexed");
        };
        if ctx.index.is_used(entry) {
            return TransformResult::not_applicable(format!("{} is still referenced", entry.name));
        }

        let mut patched = tree.clone();
        if !patched.remove(&declaration.span()) {
            return TransformResult::not_applicable("declaration could not be removed");
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("removed unused local variable {}", entry.name),
            target_lines: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::testing::{finding, run, run_idempotent};

    const SOURCE: &str = "class Demo {\n    int total(int[] xs) {\n        int unused = 0;\n        int sum = 0;\n        String probe = load();\n        for (int x : xs) {\n            sum += x;\n        }\n        return sum;\n    }\n}\n";

    #[test]
    fn test_removes_unused_declaration() {
        let f = finding(UNUSED_LOCAL_VARIABLE, "Remove this unused \"unused\" local variable.", 3);
        let out = run_idempotent(&RemoveUnusedVariable, SOURCE, &f);
        assert!(out.contains("    int total(int[] xs) {\n        int sum = 0;"));
    }

    #[test]
    fn test_used_variable_is_not_applicable() {
        let f = finding(UNUSED_LOCAL_VARIABLE, "Remove this unused \"sum\" local variable.", 4);
        assert!(run(&RemoveUnusedVariable, SOURCE, &f).unwrap_err().contains("still referenced"));
    }

    #[test]
    fn test_side_effecting_initializer_is_kept() {
        let f = finding(UNUSED_LOCAL_VARIABLE, "Remove this unused \"probe\" local variable.", 5);
        assert!(run(&RemoveUnusedVariable, SOURCE, &f).unwrap_err().contains("side effects"));
    }

    #[test]
    fn test_multiple_declarators_are_left_alone() {
        let src = "class Demo {\n    void m() {\n        int a = 1, b = 2;\n        System.out.println(b);\n    }\n}\n";
        let f = finding(UNUSED_LOCAL_VARIABLE, "Remove this unused \"a\" local variable.", 3);
        assert!(run(&RemoveUnusedVariable, src, &f).is_err());
    }
}
