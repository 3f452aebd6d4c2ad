/*!
 * Batch orchestrator.
 *
 * Drives a book translation to completion: each iteration runs three
 * phases in order (fresh shards on the primary tier, residue cleanup on
 * the lite tier, failure retries on the pro tier), then validates outputs
 * and refreshes the name glossary. Iterations repeat until every shard in
 * range is resolved or a cancellation is requested. Cancellation is
 * cooperative: it is checked before each phase and before each batch, so
 * in-flight requests finish and the progress document stays consistent.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};

use crate::app_config::ResidueThresholds;
use crate::book::BookWorkspace;
use crate::combine::ChapterCombiner;
use crate::glossary;
use crate::progress_store::{FailureKind, ProgressStore};
use crate::rate_limiter::RateLimiter;
use crate::translation::classify::{classify_error, classify_response, Verdict};
use crate::translation::postprocess;
use crate::translation::prompts::{PromptBuilder, PromptStyle};
use crate::translation::tasks::{TaskManager, TranslationTask};
use crate::translation::tiers::{ModelTier, ModelTierRegistry};
use crate::text_utils::normalize_translation;

/// Shared flag used to request a cooperative stop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every shard in range is resolved and chapters were reassembled.
    Completed,
    /// A stop was requested; progress is durable and the run can resume.
    Cancelled,
}

/// The three passes of one iteration, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    ResidueCleanup,
    FailureRetry,
}

impl Phase {
    fn is_retry(&self) -> bool {
        matches!(self, Phase::ResidueCleanup | Phase::FailureRetry)
    }

    fn is_residue_pass(&self) -> bool {
        matches!(self, Phase::ResidueCleanup)
    }

    fn label(&self) -> &'static str {
        match self {
            Phase::Fresh => "fresh shards",
            Phase::ResidueCleanup => "residue cleanup",
            Phase::FailureRetry => "failure retries",
        }
    }
}

pub struct TranslationOrchestrator {
    workspace: BookWorkspace,
    store: Arc<ProgressStore>,
    tiers: ModelTierRegistry,
    tasks: TaskManager,
    rate_limiter: RateLimiter,
    thresholds: ResidueThresholds,
    request_timeout: Duration,
    cancel: CancellationToken,
}

impl TranslationOrchestrator {
    pub fn new(
        workspace: BookWorkspace,
        store: Arc<ProgressStore>,
        tiers: ModelTierRegistry,
        batch_interval: Duration,
        thresholds: ResidueThresholds,
        request_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let tasks = TaskManager::new(workspace.clone(), Arc::clone(&store));
        Self {
            workspace,
            store,
            tiers,
            tasks,
            rate_limiter: RateLimiter::new(batch_interval),
            thresholds,
            request_timeout,
            cancel,
        }
    }

    /// Run the translation to completion or cancellation.
    pub async fn run(
        &self,
        style: PromptStyle,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<RunOutcome> {
        info!(
            "Starting translation of {} (chapters {}-{})",
            self.workspace.book_dir().display(),
            start.map_or("begin".into(), |c| c.to_string()),
            end.map_or("end".into(), |c| c.to_string()),
        );

        // A prior run that stopped cleanly left stale batch timing behind;
        // honoring it would stall the first batch for a full interval.
        if self.store.reset_after_clean_cancellation()? {
            info!("Previous run ended cleanly, batch timing reset");
        }

        loop {
            if self.cancel.is_cancelled() {
                break;
            }
            if self.is_complete(start, end)? {
                ChapterCombiner::combine(&self.workspace, start, end)?;
                info!("Translation completed for {}", self.workspace.book_dir().display());
                return Ok(RunOutcome::Completed);
            }

            self.run_phase(Phase::Fresh, style, start, end).await?;
            self.run_phase(Phase::ResidueCleanup, style, start, end).await?;
            self.run_phase(Phase::FailureRetry, style, start, end).await?;

            if self.cancel.is_cancelled() {
                break;
            }

            postprocess::delete_invalid_translations(&self.workspace)?;
            glossary::harvest(&self.workspace)?;
        }

        self.store.set_clean_cancellation()?;
        info!("Translation stopped before completion, progress saved");
        Ok(RunOutcome::Cancelled)
    }

    /// A shard is resolved when it has an output and its failure record,
    /// if any, is terminal. Partial and failed shards with pending retries
    /// keep the run going.
    fn is_complete(&self, start: Option<u32>, end: Option<u32>) -> Result<bool> {
        let state = self.store.snapshot();
        let mut unresolved = 0usize;

        for shard_id in self.workspace.prompt_shard_ids(start, end)? {
            let resolved = self.workspace.has_response(&shard_id)
                && state
                    .failed_translations
                    .get(&shard_id)
                    .is_none_or(|record| record.retried);
            if !resolved {
                unresolved += 1;
            }
        }

        if unresolved > 0 {
            info!("{unresolved} shards still unresolved");
            return Ok(false);
        }
        Ok(true)
    }

    async fn run_phase(
        &self,
        phase: Phase,
        style: PromptStyle,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }

        let mut pending = match phase {
            Phase::Fresh => self.tasks.new_tasks(start, end)?,
            Phase::ResidueCleanup => self.tasks.residue_retry_tasks(start, end)?,
            Phase::FailureRetry => self.tasks.generic_retry_tasks(start, end)?,
        };
        if pending.is_empty() {
            info!("No {} to process", phase.label());
            return Ok(());
        }
        info!("Processing {} {}", pending.len(), phase.label());

        let tier = self.tiers.select(phase.is_retry(), phase.is_residue_pass());
        let glossary_info = match phase {
            Phase::ResidueCleanup => None,
            _ => glossary::formatted_names(&self.workspace).map(|n| PromptBuilder::names_block(&n)),
        };

        let mut batch_index = 0usize;
        while !pending.is_empty() {
            if self.cancel.is_cancelled() {
                break;
            }

            self.rate_limiter
                .enforce(&self.store, tier.model_id(), pending.len(), tier.batch_size)
                .await;

            let take = tier.batch_size.min(pending.len());
            let batch: Vec<TranslationTask> = pending.drain(..take).collect();
            batch_index += 1;
            info!(
                "Dispatching {} batch {} with {} tasks: {:?}",
                phase.label(),
                batch_index,
                batch.len(),
                batch.iter().map(|t| t.shard_id.as_str()).collect::<Vec<_>>()
            );

            // Retry passes get exactly one attempt: flag the records up
            // front so a crash mid-batch cannot re-run them forever.
            if phase.is_retry() {
                for task in &batch {
                    self.store.mark_retried(&task.shard_id)?;
                }
            }
            self.store.record_batch_dispatch(tier.model_id(), batch.len())?;

            stream::iter(batch)
                .map(|task| self.process_task(task, phase, tier, style, glossary_info.as_deref()))
                .buffer_unordered(tier.batch_size)
                .collect::<Vec<_>>()
                .await;
        }

        Ok(())
    }

    async fn process_task(
        &self,
        task: TranslationTask,
        phase: Phase,
        tier: &ModelTier,
        style: PromptStyle,
        glossary_info: Option<&str>,
    ) {
        if self.cancel.is_cancelled() {
            info!("Task {} cancelled", task.shard_id);
            return;
        }

        let prompt = if phase.is_residue_pass() {
            PromptBuilder::build(&task.content, PromptStyle::ResidueCleanup, None)
        } else {
            PromptBuilder::build(&task.content, style, glossary_info)
        };

        let verdict =
            match tokio::time::timeout(self.request_timeout, tier.provider.generate(&prompt)).await
            {
                Err(_) => Verdict::Transient {
                    description: format!(
                        "no response within {} seconds",
                        self.request_timeout.as_secs()
                    ),
                },
                Ok(Err(err)) => classify_error(&err),
                Ok(Ok(raw)) => {
                    let normalized = normalize_translation(&raw);
                    if normalized.is_empty() {
                        Verdict::Failed {
                            kind: FailureKind::Generic,
                            description: "empty translation result".into(),
                        }
                    } else {
                        classify_response(normalized, &self.thresholds, phase.is_residue_pass())
                    }
                }
            };

        if let Err(err) = self.apply_verdict(&task.shard_id, verdict) {
            error!("Failed to record outcome for {}: {err}", task.shard_id);
        }
    }

    /// Persist a verdict: write or discard output, update the failure map.
    fn apply_verdict(&self, shard_id: &str, verdict: Verdict) -> Result<()> {
        match verdict {
            Verdict::Success { text } => {
                self.workspace.write_response(shard_id, &text)?;
                self.store.clear_failure(shard_id)?;
                info!("Successfully translated {shard_id}");
            }
            Verdict::PartialResidue { text, ratio } => {
                self.workspace.write_response(shard_id, &text)?;
                self.store.mark_failed(
                    shard_id,
                    FailureKind::PartialResidue,
                    &format!("translation keeps source characters at ratio {ratio:.2}%"),
                )?;
                warn!("{shard_id} kept {ratio:.2}% source characters, queued for cleanup");
            }
            Verdict::ExcessiveResidue { ratio } => {
                let description =
                    format!("translation dominated by source characters at ratio {ratio:.2}%");
                self.store.mark_failed(shard_id, FailureKind::ExcessiveResidue, &description)?;
                self.workspace.write_failure_marker(
                    shard_id,
                    FailureKind::ExcessiveResidue.as_str(),
                    &description,
                )?;
                error!("{shard_id} rejected: {ratio:.2}% source characters");
            }
            Verdict::Failed { kind, description } => {
                self.store.mark_failed(shard_id, kind, &description)?;
                self.workspace
                    .write_failure_marker(shard_id, kind.as_str(), &description)?;
                error!("{shard_id} failed: {description}");
            }
            Verdict::Transient { description } => {
                warn!("{shard_id} hit a transient error, will re-queue: {description}");
            }
        }
        Ok(())
    }
}
