use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::finding::Finding;

/// How a finding was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Transform(String),
    Fallback,
    Skipped,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Transform(name) => write!(f, "transform:{}", name),
            Strategy::Fallback => write!(f, "fallback"),
            Strategy::Skipped => write!(f, "skipped"),
        }
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected(String),
    /// No candidate reached the validator.
    NotValidated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Accepted,
    Rejected,
    Skipped,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Accepted => write!(f, "accepted"),
            OutcomeKind::Rejected => write!(f, "rejected"),
            OutcomeKind::Skipped => write!(f, "skipped"),
        }
    }
}

/// A proposed new text for one file, not yet validated.
#[derive(Debug, Clone)]
pub struct CandidatePatch {
    pub path: PathBuf,
    pub new_text: String,
    pub provenance: Strategy,
    pub description: String,
}

/// Minimal line-level view of an accepted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchHunk {
    /// First changed line of the text the patch was applied to.
    pub start_line: usize,
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixOutcome {
    pub finding: Finding,
    pub strategy: Strategy,
    /// Empty unless the outcome is accepted.
    pub patch: Option<PatchHunk>,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub rationale: String,
}

impl FixOutcome {
    pub fn accepted(finding: Finding, strategy: Strategy, patch: PatchHunk, rationale: impl Into<String>) -> Self {
        Self {
            finding,
            strategy,
            patch: Some(patch),
            verdict: Verdict::Accepted,
            rationale: rationale.into(),
        }
    }

    pub fn rejected(finding: Finding, strategy: Strategy, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            finding,
            strategy,
            patch: None,
            verdict: Verdict::Rejected(reason.clone()),
            rationale: reason,
        }
    }

    pub fn skipped(finding: Finding, rationale: impl Into<String>) -> Self {
        Self {
            finding,
            strategy: Strategy::Skipped,
            patch: None,
            verdict: Verdict::NotValidated,
            rationale: rationale.into(),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self.verdict {
            Verdict::Accepted => OutcomeKind::Accepted,
            Verdict::Rejected(_) => OutcomeKind::Rejected,
            Verdict::NotValidated => OutcomeKind::Skipped,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.kind() == OutcomeKind::Accepted
    }

    /// Turns an accepted outcome into a skip, e.g. when its file could not
    /// be written.
    pub fn downgrade(self, rationale: impl Into<String>) -> Self {
        FixOutcome::skipped(self.finding, rationale)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub by_kind: BTreeMap<OutcomeKind, usize>,
    pub by_strategy: BTreeMap<String, usize>,
    pub fallback_invocations: usize,
    pub files_changed: usize,
}

impl RunSummary {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<FixOutcome>,
    pub summary: RunSummary,
    pub changed_files: Vec<PathBuf>,
    pub dry_run: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

impl RunReport {
    pub fn new(
        outcomes: Vec<FixOutcome>,
        changed_files: Vec<PathBuf>,
        fallback_invocations: usize,
        dry_run: bool,
        duration: Duration,
    ) -> Self {
        let mut summary = RunSummary {
            total: outcomes.len(),
            fallback_invocations,
            files_changed: changed_files.len(),
            ..RunSummary::default()
        };
        for outcome in &outcomes {
            *summary.by_kind.entry(outcome.kind()).or_insert(0) += 1;
            *summary.by_strategy.entry(outcome.strategy.to_string()).or_insert(0) += 1;
        }
        Self {
            outcomes,
            summary,
            changed_files,
            dry_run,
            duration,
        }
    }
}
