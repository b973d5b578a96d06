use anyhow::Result;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use crate::core::outcome::{FixOutcome, OutcomeKind, RunReport};
use crate::reporters::traits::Reporter;

/// Change-set summary: accepted fixes grouped per file, followed by every
/// finding that was left alone and why.
pub struct MarkdownReporter;

impl Reporter for MarkdownReporter {
    fn name(&self) -> &str {
        "Markdown"
    }

    fn extension(&self) -> &str {
        "md"
    }

    fn generate(&self, report: &RunReport) -> Result<String> {
        let mut out = String::new();
        let summary = &report.summary;

        writeln!(out, "# Fix summary")?;
        writeln!(out)?;
        if report.dry_run {
            writeln!(out, "_Dry run: no files were written._")?;
            writeln!(out)?;
        }
        writeln!(out, "| Outcome | Count |")?;
        writeln!(out, "|---------|-------|")?;
        for kind in [OutcomeKind::Accepted, OutcomeKind::Rejected, OutcomeKind::Skipped] {
            writeln!(out, "| {} | {} |", kind, summary.count(kind))?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "{} finding(s), {} file(s) changed, {} fallback call(s).",
            summary.total, summary.files_changed, summary.fallback_invocations
        )?;

        let mut by_file: BTreeMap<&Path, Vec<&FixOutcome>> = BTreeMap::new();
        for outcome in report.outcomes.iter().filter(|o| o.is_accepted()) {
            by_file.entry(outcome.finding.path.as_path()).or_default().push(outcome);
        }
        if !by_file.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Changes")?;
            for (path, outcomes) in &by_file {
                writeln!(out)?;
                writeln!(out, "### `{}`", path.display())?;
                writeln!(out)?;
                for outcome in outcomes {
                    writeln!(
                        out,
                        "- line {} `{}` ({}): {}",
                        outcome.finding.line, outcome.finding.category, outcome.strategy, outcome.rationale
                    )?;
                }
            }
        }

        let unresolved: Vec<_> = report.outcomes.iter().filter(|o| !o.is_accepted()).collect();
        if !unresolved.is_empty() {
            writeln!(out)?;
            writeln!(out, "## Needs attention")?;
            writeln!(out)?;
            writeln!(out, "| File | Line | Category | Outcome | Reason |")?;
            writeln!(out, "|------|------|----------|---------|--------|")?;
            for outcome in unresolved {
                writeln!(
                    out,
                    "| `{}` | {} | {} | {} | {} |",
                    outcome.finding.path.display(),
                    outcome.finding.line,
                    outcome.finding.category,
                    outcome.kind(),
                    outcome.rationale.replace('|', "\\|")
                )?;
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::finding::{Finding, UNUSED_IMPORT, UTILITY_CLASS_CONSTRUCTOR};
    use crate::core::outcome::{PatchHunk, Strategy};
    use std::path::PathBuf;
    use std::time::Duration;

    fn accepted(path: &str, line: usize) -> FixOutcome {
        FixOutcome::accepted(
            Finding::new(UNUSED_IMPORT, "unused", path, line),
            Strategy::Transform("remove-unused-import".to_string()),
            PatchHunk {
                start_line: line,
                removed: vec!["import a.B;".to_string()],
                added: vec![],
            },
            "removed import a.B",
        )
    }

    #[test]
    fn test_groups_accepted_by_file() {
        let outcomes = vec![
            accepted("src/B.java", 2),
            accepted("src/A.java", 1),
            accepted("src/B.java", 3),
        ];
        let changed = vec![PathBuf::from("src/A.java"), PathBuf::from("src/B.java")];
        let report = RunReport::new(outcomes, changed, 0, false, Duration::ZERO);
        let md = MarkdownReporter.generate(&report).unwrap();

        let a = md.find("### `src/A.java`").unwrap();
        let b = md.find("### `src/B.java`").unwrap();
        assert!(a < b);
        assert_eq!(md.matches("remove-unused-import").count(), 3);
        assert!(md.contains("| accepted | 3 |"));
        assert!(!md.contains("Needs attention"));
    }

    #[test]
    fn test_lists_unresolved_with_reason() {
        let outcomes = vec![
            FixOutcome::rejected(
                Finding::new(UTILITY_CLASS_CONSTRUCTOR, "add constructor", "src/U.java", 4),
                Strategy::Fallback,
                "patch touches line 40 | outside 1-7",
            ),
            FixOutcome::skipped(Finding::new(UNUSED_IMPORT, "unused", "src/U.java", 1), "fallback unavailable"),
        ];
        let report = RunReport::new(outcomes, vec![], 1, true, Duration::ZERO);
        let md = MarkdownReporter.generate(&report).unwrap();

        assert!(md.contains("Dry run"));
        assert!(md.contains("## Needs attention"));
        assert!(md.contains("| rejected | patch touches line 40 \\| outside 1-7 |"));
        assert!(md.contains("| skipped | fallback unavailable |"));
        assert!(!md.contains("## Changes"));
    }
}
