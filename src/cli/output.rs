use anyhow::Result;
use colored::*;

use crate::core::outcome::{FixOutcome, OutcomeKind, RunReport};
use crate::reporters::{self, Reporter};

pub struct OutputFormatter {
    format: String,
}

impl OutputFormatter {
    pub fn new(format: &str) -> Self {
        Self {
            format: format.to_string(),
        }
    }

    pub fn display(&self, report: &RunReport) -> Result<()> {
        match reporters::for_format(&self.format) {
            Some(reporter) => {
                println!("{}", reporter.generate(report)?);
                Ok(())
            }
            None => {
                self.display_table(report);
                Ok(())
            }
        }
    }

    fn label(outcome: &FixOutcome, dry_run: bool) -> ColoredString {
        match outcome.kind() {
            OutcomeKind::Accepted if dry_run => "DRY-RUN".cyan(),
            OutcomeKind::Accepted => "FIXED".green(),
            OutcomeKind::Rejected => "REJECTED".red(),
            OutcomeKind::Skipped => "SKIP".yellow(),
        }
    }

    fn display_table(&self, report: &RunReport) {
        println!();
        println!("{}", format!("hybridfix v{}", env!("CARGO_PKG_VERSION")).bold());
        println!("{}", "─".repeat(64));
        println!();

        for outcome in &report.outcomes {
            let finding = &outcome.finding;
            println!(
                "  {:<9} {}:{} [{}]",
                Self::label(outcome, report.dry_run),
                finding.path.to_string_lossy(),
                finding.line,
                finding.category.cyan()
            );
            println!("            {} {}", outcome.strategy.to_string().dimmed(), outcome.rationale);
            if let Some(patch) = &outcome.patch {
                for line in &patch.removed {
                    println!("            {}", format!("- {}", line).red());
                }
                for line in &patch.added {
                    println!("            {}", format!("+ {}", line).green());
                }
            }
        }

        println!();
        println!("{}", "─".repeat(64));
        let summary = &report.summary;
        println!();
        println!("  SUMMARY");
        println!(
            "    {} findings ({} accepted, {} rejected, {} skipped)",
            summary.total,
            summary.count(OutcomeKind::Accepted).to_string().green(),
            summary.count(OutcomeKind::Rejected).to_string().red(),
            summary.count(OutcomeKind::Skipped).to_string().yellow()
        );
        for (strategy, count) in &summary.by_strategy {
            println!("      {:<40} {}", strategy, count);
        }
        let verb = if report.dry_run { "would change" } else { "changed" };
        println!("    {} file(s) {}", summary.files_changed, verb);
        if summary.fallback_invocations > 0 {
            println!("    {} fallback call(s)", summary.fallback_invocations);
        }
        println!("    completed in {:.1}s", report.duration.as_secs_f64());
        println!();
    }
}
