use super::traits::{Transform, TransformContext, TransformResult};
use crate::core::finding::{Finding, COMMENTED_OUT_CODE};
use crate::syntax::{self, java, StructuralNode, SyntaxTree};

pub struct StripCommentedCode;

const PROSE_MARKERS: &[&str] = &["TODO", "FIXME", "NOTE", "XXX"];

/// Wrappers under which a comment body is tried as Java source.
const PROBES: &[(&str, &str)] = &[
    ("class __Probe { void __probe() {\n", "\n} }\n"),
    ("class __Probe {\n", "\n}\n"),
    ("", "\n"),
];

/// Comment text with the delimiters and leading `*` gutters removed.
fn comment_body(text: &str) -> String {
    if let Some(line) = text.strip_prefix("//") {
        return line.trim().to_string();
    }
    let inner = text
        .trim_start_matches("/*")
        .trim_end_matches("*/");
    inner
        .lines()
        .map(|l| {
            let l = l.trim();
            l.strip_prefix('*').map(str::trim).unwrap_or(l)
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// How much a comment run looks like disabled code, from 0.0 to 1.0.
pub fn code_score(comments: &[&str]) -> f64 {
    if comments.iter().any(|c| c.starts_with("/**")) {
        return 0.0;
    }
    let body = comments.iter().map(|c| comment_body(c)).collect::<Vec<_>>().join("\n");
    let body = body.trim();
    if body.is_empty() || PROSE_MARKERS.iter().any(|m| body.contains(m)) {
        return 0.0;
    }

    let mut score = 0.0;
    if PROBES
        .iter()
        .any(|(head, tail)| syntax::is_valid(&format!("{}{}{}", head, body, tail)))
    {
        score += 0.6;
    }
    if body.ends_with(';') || body.ends_with('{') || body.ends_with('}') {
        score += 0.2;
    }
    if body.contains('(') || body.contains('=') || body.contains('.') {
        score += 0.2;
    }
    score
}

/// Groups comments that occupy whole lines into runs of consecutive lines.
fn comment_runs<'a>(tree: &SyntaxTree, root: &'a StructuralNode) -> Vec<Vec<&'a StructuralNode>> {
    let mut runs: Vec<Vec<&StructuralNode>> = Vec::new();
    let full_line = root.descendants().filter(|n| {
        java::is_comment(n) && tree.line_text(n.span().start_line).trim_start().starts_with(tree.text(n).lines().next().unwrap_or(""))
    });
    for comment in full_line {
        match runs.last_mut() {
            Some(run)
                if run
                    .last()
                    .map(|prev| prev.span().end_line + 1 == comment.span().start_line)
                    .unwrap_or(false) =>
            {
                run.push(comment)
            }
            _ => runs.push(vec![comment]),
        }
    }
    runs
}

impl Transform for StripCommentedCode {
    fn category(&self) -> &'static str {
        COMMENTED_OUT_CODE
    }

    fn name(&self) -> &'static str {
        "strip-commented-out-code"
    }

    fn apply(&self, tree: &SyntaxTree, _finding: &Finding, ctx: &TransformContext<'_>) -> TransformResult {
        let runs: Vec<Vec<&StructuralNode>> = comment_runs(tree, tree.root())
            .into_iter()
            .filter(|run| run.iter().any(|c| ctx.on_target_lines(c)))
            .collect();
        if runs.is_empty() {
            return TransformResult::not_applicable("no comment on the reported lines");
        }

        let mut patched = tree.clone();
        let mut removed_lines = 0;
        let mut target: Option<(usize, usize)> = None;
        let mut best = 0.0f64;
        for run in &runs {
            let texts: Vec<&str> = run.iter().map(|c| tree.text(c)).collect();
            let score = code_score(&texts);
            best = best.max(score);
            if score + f64::EPSILON < ctx.commented_code_threshold {
                continue;
            }
            for comment in run {
                let span = comment.span();
                patched.remove(&span);
                removed_lines += span.end_line - span.start_line + 1;
                target = Some(target.map_or((span.start_line, span.end_line), |(a, b)| {
                    (a.min(span.start_line), b.max(span.end_line))
                }));
            }
        }

        if removed_lines == 0 {
            return TransformResult::not_applicable(format!(
                "comment scored {:.1} as code, below threshold {:.1}",
                best, ctx.commented_code_threshold
            ));
        }
        TransformResult::Applied {
            tree: patched,
            description: format!("removed {} line(s) of commented-out code", removed_lines),
            target_lines: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SymbolIndex;
    use crate::syntax::parse;
    use crate::transforms::testing::{finding, run, run_idempotent, PATH};
    use std::path::Path;

    const SOURCE: &str = "class Demo {\n    void m() {\n        int a = 1;\n        // int b = a + 1;\n        // System.out.println(b);\n        call(a);\n        // explain why a is one\n    }\n}\n";

    #[test]
    fn test_scores() {
        assert!(code_score(&["// int b = a + 1;"]) >= 0.99);
        assert!(code_score(&["/* if (ready) { start(); } */"]) >= 0.99);
        assert!(code_score(&["// TODO: foo();"]) == 0.0);
        assert!(code_score(&["/** Javadoc with code(); */"]) == 0.0);
        assert!(code_score(&["// this explains the flow."]) < 0.7);
        assert!(code_score(&["// private int count;"]) >= 0.7);
    }

    #[test]
    fn test_removes_code_run() {
        let f = finding(COMMENTED_OUT_CODE, "This block of commented-out lines of code should be removed.", 4);
        let out = run_idempotent(&StripCommentedCode, SOURCE, &f);
        assert!(out.contains("        int a = 1;\n        call(a);\n        // explain why a is one"));
    }

    #[test]
    fn test_reports_whole_run_as_target() {
        let src = "class Demo {\n    void m() {\n        int a = 1;\n        // int b = a + 1;\n        // int c = b + 1;\n        // int d = c + 1;\n        // int e = d + 1;\n        // int f = e + 1;\n        // int g = f + 1;\n        call(a);\n    }\n}\n";
        let tree = parse(src).unwrap();
        let index = SymbolIndex::build(vec![(Path::new(PATH), src)]);
        let f = finding(COMMENTED_OUT_CODE, "This block of commented-out lines of code should be removed.", 4);
        let ctx = TransformContext {
            path: Path::new(PATH),
            index: &index,
            start_line: 4,
            end_line: 4,
            commented_code_threshold: 0.7,
        };
        match StripCommentedCode.apply(&tree, &f, &ctx) {
            TransformResult::Applied { tree, target_lines, .. } => {
                assert_eq!(target_lines, Some((4, 9)));
                assert!(tree.serialize().contains("        int a = 1;\n        call(a);\n"));
            }
            TransformResult::NotApplicable { reason } => panic!("not applicable: {}", reason),
        }
    }

    #[test]
    fn test_prose_is_not_applicable() {
        let f = finding(COMMENTED_OUT_CODE, "This block of commented-out lines of code should be removed.", 7);
        assert!(run(&StripCommentedCode, SOURCE, &f).unwrap_err().contains("below threshold"));
    }

    #[test]
    fn test_trailing_comment_is_not_a_full_line_run() {
        let src = "class Demo {\n    int a = 1; // int b = 2;\n}\n";
        let f = finding(COMMENTED_OUT_CODE, "This block of commented-out lines of code should be removed.", 2);
        assert!(run(&StripCommentedCode, src, &f).is_err());
    }
}
