use anyhow::Result;

use crate::core::outcome::{OutcomeKind, RunReport};
use crate::reporters::traits::Reporter;

pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn name(&self) -> &str {
        "JSON"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn generate(&self, report: &RunReport) -> Result<String> {
        let output = serde_json::json!({
            "dry_run": report.dry_run,
            "outcomes": report.outcomes,
            "changed_files": report.changed_files,
            "summary": {
                "total": report.summary.total,
                "accepted": report.summary.count(OutcomeKind::Accepted),
                "rejected": report.summary.count(OutcomeKind::Rejected),
                "skipped": report.summary.count(OutcomeKind::Skipped),
                "by_strategy": report.summary.by_strategy,
                "fallback_invocations": report.summary.fallback_invocations,
                "files_changed": report.summary.files_changed,
            },
            "duration_ms": report.duration.as_millis(),
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
