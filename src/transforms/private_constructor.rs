use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, UTILITY_CLASS_CONSTRUCTOR};
use crate::syntax::java;
use crate::syntax::{StructuralNode, SyntaxTree};

pub struct InsertPrivateConstructor;

/// Only static members, at least one of them, and no constructor.
fn is_utility_class(body: &StructuralNode) -> Result<(), &'static str> {
    let mut members = 0;
    for member in body.named_children() {
        match member.kind() {
            "constructor_declaration" => return Err("class already declares a constructor"),
            "method_declaration" | "field_declaration" => {
                if !java::has_modifier(member, "static") {
                    return Err("class has instance members");
                }
                members += 1;
            }
            "block" => return Err("class has an instance initializer"),
            "line_comment" | "block_comment" | "static_initializer" => {}
            _ if java::is_type_declaration(member) => {}
            _ => members += 1,
        }
    }
    if members == 0 {
        Err("class has no static members")
    } else {
        Ok(())
    }
}

impl Transform for InsertPrivateConstructor {
    fn category(&self) -> &'static str {
        UTILITY_CLASS_CONSTRUCTOR
    }

    fn name(&self) -> &'static str {
        "insert-private-constructor"
    }

    fn apply(&self, tree: &SyntaxTree, finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let class = match finding.quoted_name() {
            Some(name) => tree.root().descendants().find(|n| {
                n.kind() == "class_declaration" && java::declared_name(tree, n) == Some(name)
            }),
            None => java::innermost_covering(tree.root(), ctx.start_line, &["class_declaration"]),
        };
        let Some(class) = class else {
            return TransformResult::not_applicable("no class declaration at the reported line");
        };
        let Some(name) = java::declared_name(tree, class) else {
            return TransformResult::not_applicable("class has no name");
        };
        if java::has_modifier(class, "abstract") {
            return TransformResult::not_applicable("abstract classes are meant to be extended");
        }
        let Some(body) = class.child_by_field("body") else {
            return TransformResult::not_applicable("class has no body");
        };
        if let Err(reason) = is_utility_class(body) {
            return TransformResult::not_applicable(reason);
        }
        let Some(open) = body.child_of_kind("{") else {
            return TransformResult::not_applicable("class body has no opening brace");
        };

        let outer = java::indentation_of(tree, class);
        let member = body
            .named_children()
            .next()
            .filter(|m| m.span().start_line > open.span().start_line)
            .map(|m| java::indentation_of(tree, m).to_string())
            .unwrap_or_else(|| format!("{}    ", outer));
        let step = member.strip_prefix(outer).filter(|s| !s.is_empty()).unwrap_or("    ");
        let constructor = format!(
            "\n{m}private {name}() {{\n{m}{s}throw new IllegalStateException(\"Utility class\");\n{m}}}\n",
            m = member,
            s = step,
            name = name
        );

        let mut patched = tree.clone();
        if !patched.insert_after(&open.span(), constructor) {
            return TransformResult::not_applicable("could not insert constructor");
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("added private constructor to utility class {}", name),
            target_lines: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::testing::{finding, run, run_idempotent};

    const MESSAGE: &str = "Add a private constructor to hide the implicit public one.";

    #[test]
    fn test_inserts_constructor_with_member_indentation() {
        let src = "public final class Strings {\n  public static final String EMPTY = \"\";\n\n  public static boolean blank(String s) {\n    return s.trim().isEmpty();\n  }\n}\n";
        let out = run_idempotent(&InsertPrivateConstructor, src, &finding(UTILITY_CLASS_CONSTRUCTOR, MESSAGE, 1));
        assert!(out.starts_with(
            "public final class Strings {\n  private Strings() {\n    throw new IllegalStateException(\"Utility class\");\n  }\n\n  public static final String EMPTY"
        ));
    }

    #[test]
    fn test_instance_members_are_not_applicable() {
        let src = "class Holder {\n    int value;\n    static int count;\n}\n";
        let f = finding(UTILITY_CLASS_CONSTRUCTOR, MESSAGE, 1);
        assert!(run(&InsertPrivateConstructor, src, &f).unwrap_err().contains("instance members"));
    }

    #[test]
    fn test_nested_utility_class() {
        let src = "class Outer {\n    void run() {}\n\n    static class Keys {\n        static final String A = \"a\";\n    }\n}\n";
        let out = run_idempotent(&InsertPrivateConstructor, src, &finding(UTILITY_CLASS_CONSTRUCTOR, MESSAGE, 4));
        assert!(out.contains("    static class Keys {\n        private Keys() {\n            throw new IllegalStateException(\"Utility class\");\n        }\n\n        static final String A"));
    }
}
