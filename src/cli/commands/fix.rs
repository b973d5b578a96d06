use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cli::output::OutputFormatter;
use crate::cli::progress::RunProgress;
use crate::core::config::Config;
use crate::core::engine::Engine;
use crate::core::finding::{load_findings, Finding};
use crate::core::store::DiskStore;
use crate::fallback::{CommandProvider, FixProvider};
use crate::reporters::{self, JsonReporter, Reporter};
use crate::utils::fs::load_snapshot;

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Path to the project to fix (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Findings file: a JSON/YAML list of findings or a Sonar issues response
    #[arg(long)]
    pub findings: PathBuf,

    /// Report what would be fixed without modifying files
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json", "markdown"])]
    pub format: String,

    /// Maximum number of fallback invocations for this run
    #[arg(long)]
    pub max_fallback: Option<usize>,

    /// Per-call fallback timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Lines a patch may touch beyond the finding's span
    #[arg(long)]
    pub margin: Option<usize>,

    /// Only fix findings of these categories (comma-separated, e.g. unused-import,collection-is-empty)
    #[arg(long, value_delimiter = ',')]
    pub only: Option<Vec<String>>,

    /// Also write the report to this file (JSON unless --format markdown)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl FixArgs {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(max) = self.max_fallback {
            config.fallback.max_invocations = max;
        }
        if let Some(secs) = self.timeout {
            config.fallback.timeout_secs = secs;
        }
        if let Some(margin) = self.margin {
            config.validation.locality_margin = margin;
        }
    }

    fn select(&self, findings: &mut Vec<Finding>) {
        if let Some(ref only) = self.only {
            findings.retain(|f| only.contains(&f.category));
        }
    }
}

pub async fn execute(args: &FixArgs) -> Result<()> {
    let mut config = Config::load(&args.path);
    args.apply_overrides(&mut config);

    let mut findings = load_findings(&args.findings)?;
    args.select(&mut findings);
    if findings.is_empty() {
        println!("{}", "No findings to fix.".green());
        return Ok(());
    }

    let progress = RunProgress::new();
    progress.set_stage(format!("Indexing {}", args.path.display()));
    let snapshot = load_snapshot(&args.path, &config)?;
    info!(files = snapshot.len(), findings = findings.len(), "project loaded");

    let provider: Option<Arc<dyn FixProvider>> = config
        .fallback
        .command
        .as_deref()
        .and_then(CommandProvider::new)
        .map(|p| Arc::new(p) as Arc<dyn FixProvider>);
    let engine = Engine::new(config, Arc::new(DiskStore::new(&args.path)), provider).dry_run(args.dry_run);

    progress.set_stage(format!("Fixing {} finding(s)", findings.len()));
    let report = engine.run(findings, &snapshot).await;
    progress.finish();

    OutputFormatter::new(&args.format).display(&report)?;

    if let Some(output) = &args.output {
        let reporter: Box<dyn Reporter> = reporters::for_format(&args.format).unwrap_or_else(|| Box::new(JsonReporter));
        std::fs::write(output, reporter.generate(&report)?)
            .with_context(|| format!("cannot write report to {}", output.display()))?;
        println!("{} report written to {}", reporter.name(), output.display());
    }

    Ok(())
}
