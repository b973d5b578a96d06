use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::context::SurroundingContext;
use super::traits::{FallbackRequest, FixProvider};
use crate::core::config::FallbackConfig;
use crate::core::error::FallbackError;
use crate::core::finding::Finding;
use crate::core::outcome::{CandidatePatch, Strategy};
use crate::syntax;

/// Wraps a `FixProvider` with a per-run call budget, a concurrency bound and
/// a per-call timeout.
pub struct FallbackAdapter {
    provider: Option<Arc<dyn FixProvider>>,
    max_invocations: usize,
    used: AtomicUsize,
    permits: Semaphore,
    timeout: Duration,
}

/// Body of the first ```java fence (or any fence), else the whole reply.
pub fn extract_code(reply: &str) -> String {
    let mut block: Option<Vec<&str>> = None;
    let mut fallback: Option<Vec<&str>> = None;
    let mut current: Option<(bool, Vec<&str>)> = None;

    for line in reply.lines() {
        let trimmed = line.trim();
        match current.take() {
            None if trimmed.starts_with("```") => {
                let lang = trimmed.trim_start_matches('`').trim();
                current = Some((lang.eq_ignore_ascii_case("java"), Vec::new()));
            }
            None => {}
            Some((is_java, lines)) if trimmed == "```" => {
                if is_java && block.is_none() {
                    block = Some(lines);
                } else if fallback.is_none() {
                    fallback = Some(lines);
                }
            }
            Some((is_java, mut lines)) => {
                lines.push(line);
                current = Some((is_java, lines));
            }
        }
    }
    // An unterminated fence still counts.
    if let Some((is_java, lines)) = current {
        if is_java && block.is_none() {
            block = Some(lines);
        } else if fallback.is_none() {
            fallback = Some(lines);
        }
    }

    match block.or(fallback) {
        Some(lines) => {
            let mut code = lines.join("\n");
            code.push('\n');
            code
        }
        None => reply.to_string(),
    }
}

impl FallbackAdapter {
    pub fn new(
        provider: Option<Arc<dyn FixProvider>>,
        max_invocations: usize,
        max_concurrent: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            max_invocations,
            used: AtomicUsize::new(0),
            permits: Semaphore::new(max_concurrent.max(1)),
            timeout,
        }
    }

    pub fn from_config(provider: Option<Arc<dyn FixProvider>>, config: &FallbackConfig) -> Self {
        Self::new(provider, config.max_invocations, config.max_concurrent, config.timeout())
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Provider calls made so far, retries included.
    pub fn invocations(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    fn reserve(&self) -> Result<(), FallbackError> {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                (used < self.max_invocations).then_some(used + 1)
            })
            .map(|_| ())
            .map_err(|_| FallbackError::BudgetExhausted {
                limit: self.max_invocations,
            })
    }

    fn check_reply(file_text: &str, reply: &str) -> Result<String, FallbackError> {
        let code = extract_code(reply);
        if code.trim().is_empty() {
            return Err(FallbackError::Malformed("empty reply".to_string()));
        }
        if code.trim() == file_text.trim() {
            return Err(FallbackError::Malformed("reply repeats the file unchanged".to_string()));
        }
        if let Err(e) = syntax::parse(&code) {
            return Err(FallbackError::Malformed(format!("reply does not parse: {}", e)));
        }
        Ok(code)
    }

    /// Asks the provider for a full replacement of `file_text`. Only a
    /// malformed reply earns the single reworded retry.
    pub async fn propose(
        &self,
        file_text: &str,
        finding: &Finding,
        context: SurroundingContext,
    ) -> Result<CandidatePatch, FallbackError> {
        let provider = self.provider.as_ref().ok_or(FallbackError::Unavailable)?;
        let mut request = FallbackRequest {
            file_text: file_text.to_string(),
            finding: finding.clone(),
            context,
            attempt: 0,
        };

        let mut last_error = FallbackError::Unavailable;
        for attempt in 0..2 {
            request.attempt = attempt;
            if let Err(e) = self.reserve() {
                return Err(if attempt == 0 { e } else { last_error });
            }
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| FallbackError::Provider(e.to_string()))?;

            debug!(provider = provider.name(), finding = %finding.label(), attempt, "calling fallback provider");
            let reply = match tokio::time::timeout(self.timeout, provider.propose(&request)).await {
                Err(_) => return Err(FallbackError::TimedOut(self.timeout)),
                Ok(Err(e)) => return Err(FallbackError::Provider(e.to_string())),
                Ok(Ok(reply)) => reply,
            };

            match Self::check_reply(file_text, &reply) {
                Ok(new_text) => {
                    return Ok(CandidatePatch {
                        path: finding.path.clone(),
                        new_text,
                        provenance: Strategy::Fallback,
                        description: format!("{} proposal for {}", provider.name(), finding.category),
                    })
                }
                Err(e) => {
                    warn!(finding = %finding.label(), attempt, error = %e, "unusable fallback reply");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
