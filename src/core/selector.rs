use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::finding::Finding;
use crate::core::outcome::{CandidatePatch, FixOutcome, Strategy};
use crate::core::session::FileSession;
use crate::fallback::{FallbackAdapter, SurroundingContext};
use crate::index::SymbolIndex;
use crate::transforms::{Route, TransformContext, TransformRegistry, TransformResult};
use crate::validate::{patch_hunk, PatchScope, Validation, Validator};

/// Stages a finding moves through; logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    TransformAttempted,
    FallbackAttempted,
    Validated,
    Terminal,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Received => write!(f, "received"),
            Stage::TransformAttempted => write!(f, "transform-attempted"),
            Stage::FallbackAttempted => write!(f, "fallback-attempted"),
            Stage::Validated => write!(f, "validated"),
            Stage::Terminal => write!(f, "terminal"),
        }
    }
}

fn enter(stage: Stage, finding: &Finding) {
    debug!(finding = %finding.label(), stage = %stage, "stage transition");
}

/// Decides, produces and validates the fix for one finding at a time.
pub struct Selector {
    registry: TransformRegistry,
    fallback: FallbackAdapter,
    validator: Validator,
    commented_code_threshold: f64,
}

impl Selector {
    pub fn new(
        registry: TransformRegistry,
        fallback: FallbackAdapter,
        validator: Validator,
        commented_code_threshold: f64,
    ) -> Self {
        Self {
            registry,
            fallback,
            validator,
            commented_code_threshold,
        }
    }

    pub fn fallback(&self) -> &FallbackAdapter {
        &self.fallback
    }

    pub async fn decide(
        &self,
        session: &mut FileSession,
        finding: &Finding,
        index: &RwLock<SymbolIndex>,
    ) -> FixOutcome {
        enter(Stage::Received, finding);
        let outcome = self.resolve(session, finding, index).await;
        enter(Stage::Terminal, finding);
        info!(
            finding = %finding.label(),
            strategy = %outcome.strategy,
            outcome = %outcome.kind(),
            rationale = %outcome.rationale,
            "finding resolved"
        );
        outcome
    }

    async fn resolve(&self, session: &mut FileSession, finding: &Finding, index: &RwLock<SymbolIndex>) -> FixOutcome {
        if let Some(reason) = session.poisoned() {
            return FixOutcome::skipped(finding.clone(), reason.to_string());
        }
        let Some((start_line, end_line)) = session.map_finding(finding) else {
            return FixOutcome::skipped(finding.clone(), "region already removed by an earlier fix");
        };
        let tree = match session.tree() {
            Ok(tree) => tree,
            Err(e) => {
                return FixOutcome::skipped(finding.clone(), format!("file is not structurally fixable: {}", e))
            }
        };
        let scope = PatchScope {
            category: &finding.category,
            start_line,
            end_line,
        };

        let note = match self.registry.route(&finding.category) {
            Route::Transform(transform) => {
                enter(Stage::TransformAttempted, finding);
                let guard = index.read().await;
                let ctx = TransformContext {
                    path: session.path(),
                    index: &guard,
                    start_line,
                    end_line,
                    commented_code_threshold: self.commented_code_threshold,
                };
                match transform.apply(tree, finding, &ctx) {
                    TransformResult::Applied {
                        tree: patched,
                        description,
                        target_lines,
                    } => {
                        let patch = CandidatePatch {
                            path: session.path().to_path_buf(),
                            new_text: patched.serialize(),
                            provenance: Strategy::Transform(transform.name().to_string()),
                            description,
                        };
                        drop(guard);
                        let scope = match target_lines {
                            Some((first, last)) => scope.covering(first, last),
                            None => scope.clone(),
                        };
                        return self.validate_and_commit(session, finding, patch, &scope, index).await;
                    }
                    TransformResult::NotApplicable { reason } => {
                        format!("{} not applicable: {}", transform.name(), reason)
                    }
                }
            }
            Route::FallbackOnly => format!("{} requires semantic restructuring", finding.category),
            Route::Unregistered => format!("no deterministic transform for {}", finding.category),
        };

        if !self.fallback.is_available() {
            return FixOutcome::skipped(finding.clone(), format!("{}; fallback unavailable", note));
        }

        enter(Stage::FallbackAttempted, finding);
        let importers = index.read().await.importers(session.path()).into_iter().collect();
        let context = SurroundingContext::gather(tree, start_line, end_line, importers);
        let text = session.text().to_string();
        match self.fallback.propose(&text, finding, context).await {
            Ok(patch) => self.validate_and_commit(session, finding, patch, &scope, index).await,
            Err(e) => FixOutcome::skipped(finding.clone(), format!("{}; fallback failed: {}", note, e)),
        }
    }

    async fn validate_and_commit(
        &self,
        session: &mut FileSession,
        finding: &Finding,
        patch: CandidatePatch,
        scope: &PatchScope<'_>,
        index: &RwLock<SymbolIndex>,
    ) -> FixOutcome {
        let Ok(current) = session.tree() else {
            return FixOutcome::skipped(finding.clone(), "file is not structurally fixable");
        };
        let verdict = {
            let guard = index.read().await;
            self.validator.validate(current, &patch, scope, &guard)
        };
        enter(Stage::Validated, finding);

        match verdict {
            Validation::Rejected(reason) => FixOutcome::rejected(finding.clone(), patch.provenance, reason),
            Validation::Accepted { tree, hunk } => {
                let Some(lines) = patch_hunk(session.text(), tree.source()) else {
                    return FixOutcome::rejected(finding.clone(), patch.provenance, "patch does not change the file");
                };
                if let Err(e) = index.write().await.refresh_file(session.path(), &tree) {
                    session.poison(e.to_string());
                }
                session.commit(tree, hunk);
                FixOutcome::accepted(finding.clone(), patch.provenance, lines, patch.description)
            }
        }
    }
}
