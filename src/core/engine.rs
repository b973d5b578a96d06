use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{error, info, info_span, warn, Instrument};

use crate::core::config::Config;
use crate::core::finding::Finding;
use crate::core::outcome::{FixOutcome, OutcomeKind, RunReport};
use crate::core::selector::Selector;
use crate::core::session::FileSession;
use crate::core::store::{FileStore, ProjectSnapshot};
use crate::fallback::{FallbackAdapter, FixProvider};
use crate::index::SymbolIndex;
use crate::transforms::{default_registry, TransformRegistry};
use crate::validate::Validator;

pub struct Engine {
    selector: Arc<Selector>,
    store: Arc<dyn FileStore>,
    config: Config,
    dry_run: bool,
}

struct FileBatch {
    outcomes: Vec<(usize, FixOutcome)>,
    changed: bool,
}

impl Engine {
    pub fn new(config: Config, store: Arc<dyn FileStore>, provider: Option<Arc<dyn FixProvider>>) -> Self {
        let mut registry = default_registry();
        registry.disable(&config.transforms.disabled);
        Self::with_registry(config, store, provider, registry)
    }

    pub fn with_registry(
        config: Config,
        store: Arc<dyn FileStore>,
        provider: Option<Arc<dyn FixProvider>>,
        registry: TransformRegistry,
    ) -> Self {
        let selector = Selector::new(
            registry,
            FallbackAdapter::from_config(provider, &config.fallback),
            Validator::new(&config.validation),
            config.transforms.commented_code_threshold,
        );
        Self {
            selector: Arc::new(selector),
            store,
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn ignore_reason(&self, finding: &Finding) -> Option<&'static str> {
        if self.config.is_ignored_category(&finding.category) {
            Some("category ignored by configuration")
        } else if self.config.is_ignored_path(&finding.path) {
            Some("path ignored by configuration")
        } else {
            None
        }
    }

    /// Processes every finding and returns exactly one outcome per finding,
    /// in input order. Files are handled concurrently; findings of one file
    /// run in order against that file's evolving tree.
    pub async fn run(&self, findings: Vec<Finding>, snapshot: &ProjectSnapshot) -> RunReport {
        let index = Arc::new(RwLock::new(SymbolIndex::build(snapshot.iter())));
        self.run_with_index(findings, index).await
    }

    /// Like `run`, against an index the caller built and keeps. On return
    /// the index reflects every committed patch.
    pub async fn run_with_index(&self, findings: Vec<Finding>, index: Arc<RwLock<SymbolIndex>>) -> RunReport {
        let started = Instant::now();

        let mut outcomes: Vec<Option<FixOutcome>> = vec![None; findings.len()];
        let mut batches: BTreeMap<PathBuf, Vec<(usize, Finding)>> = BTreeMap::new();
        for (i, finding) in findings.iter().enumerate() {
            match self.ignore_reason(finding) {
                Some(reason) => outcomes[i] = Some(FixOutcome::skipped(finding.clone(), reason)),
                None => batches.entry(finding.path.clone()).or_default().push((i, finding.clone())),
            }
        }
        info!(findings = findings.len(), files = batches.len(), dry_run = self.dry_run, "fix run started");

        let limit = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut tasks = Vec::new();
        for (path, batch) in batches {
            let indices: Vec<usize> = batch.iter().map(|(i, _)| *i).collect();
            let selector = Arc::clone(&self.selector);
            let store = Arc::clone(&self.store);
            let index = Arc::clone(&index);
            let limit = Arc::clone(&limit);
            let dry_run = self.dry_run;
            let span = info_span!("file", path = %path.display());

            let handle = tokio::spawn(
                async move {
                    let _permit = limit.acquire_owned().await.ok();
                    process_file(path, batch, selector, store, index, dry_run).await
                }
                .instrument(span),
            );
            tasks.push((indices, handle));
        }

        let mut changed_files = Vec::new();
        for (indices, handle) in tasks {
            match handle.await {
                Ok(batch) => {
                    if batch.changed {
                        if let Some((i, _)) = batch.outcomes.first() {
                            changed_files.push(findings[*i].path.clone());
                        }
                    }
                    for (i, outcome) in batch.outcomes {
                        outcomes[i] = Some(outcome);
                    }
                }
                Err(e) => {
                    error!(error = %e, "file task failed");
                    for i in indices {
                        outcomes[i] = Some(FixOutcome::skipped(findings[i].clone(), format!("internal error: {}", e)));
                    }
                }
            }
        }
        changed_files.sort();

        let outcomes: Vec<FixOutcome> = outcomes
            .into_iter()
            .zip(&findings)
            .map(|(outcome, finding)| {
                outcome.unwrap_or_else(|| FixOutcome::skipped(finding.clone(), "finding was not processed"))
            })
            .collect();

        let report = RunReport::new(
            outcomes,
            changed_files,
            self.selector.fallback().invocations(),
            self.dry_run,
            started.elapsed(),
        );
        info!(
            accepted = report.summary.count(OutcomeKind::Accepted),
            rejected = report.summary.count(OutcomeKind::Rejected),
            skipped = report.summary.count(OutcomeKind::Skipped),
            files_changed = report.summary.files_changed,
            "fix run finished"
        );
        report
    }
}

async fn process_file(
    path: PathBuf,
    batch: Vec<(usize, Finding)>,
    selector: Arc<Selector>,
    store: Arc<dyn FileStore>,
    index: Arc<RwLock<SymbolIndex>>,
    dry_run: bool,
) -> FileBatch {
    let session = Arc::new(Mutex::new(FileSession::open(&path, store.as_ref())));
    {
        let mut guard = session.lock().await;
        let check = {
            let index = index.read().await;
            if index.file(&path).is_some() {
                Some(index.check_consistency(&path, guard.text()))
            } else {
                None
            }
        };
        let check = match (check, guard.tree()) {
            (Some(check), _) => check,
            (None, Ok(tree)) => index.write().await.refresh_file(&path, tree),
            (None, Err(_)) => Ok(()),
        };
        if let Err(e) = check {
            warn!(error = %e, "index inconsistency, skipping file");
            guard.poison(e.to_string());
        }
    }

    let mut outcomes = Vec::with_capacity(batch.len());
    for (i, finding) in batch {
        let mut guard = session.lock().await;
        let outcome = selector.decide(&mut guard, &finding, &index).await;
        outcomes.push((i, outcome));
    }

    let guard = session.lock().await;
    if !guard.is_changed() {
        return FileBatch { outcomes, changed: false };
    }
    if dry_run {
        return FileBatch { outcomes, changed: true };
    }
    match store.write(&path, guard.text()) {
        Ok(()) => {
            info!(commits = guard.commits(), "file written");
            FileBatch { outcomes, changed: true }
        }
        Err(e) => {
            error!(error = %e, "write failed, discarding accepted fixes");
            let reason = format!("write failed: {}", e);
            let outcomes = outcomes
                .into_iter()
                .map(|(i, o)| if o.is_accepted() { (i, o.downgrade(reason.clone())) } else { (i, o) })
                .collect();
            FileBatch { outcomes, changed: false }
        }
    }
}
