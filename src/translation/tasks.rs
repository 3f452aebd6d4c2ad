/*!
 * Task planning.
 *
 * Each translation phase starts from a plan: the sorted list of shards it
 * should attempt, with the text the model will be asked to work on. Fresh
 * shards are read from the prompt files; residue cleanup re-reads the
 * previous partial output instead, since the cleanup pass finishes an
 * existing translation rather than starting over.
 */

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use log::warn;

use crate::book::BookWorkspace;
use crate::progress_store::{FailureKind, ProgressStore};

/// One shard queued for a model call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationTask {
    pub shard_id: String,
    pub content: String,
}

/// Builds the per-phase task lists from workspace state and the progress
/// store. All three builders return tasks sorted by shard id.
#[derive(Debug, Clone)]
pub struct TaskManager {
    workspace: BookWorkspace,
    store: Arc<ProgressStore>,
}

impl TaskManager {
    pub fn new(workspace: BookWorkspace, store: Arc<ProgressStore>) -> Self {
        Self { workspace, store }
    }

    /// Shards with a prompt file but no output yet.
    pub fn new_tasks(&self, start: Option<u32>, end: Option<u32>) -> Result<Vec<TranslationTask>> {
        let done: BTreeSet<String> = self
            .workspace
            .response_shard_ids(start, end)?
            .into_iter()
            .collect();

        let mut tasks = Vec::new();
        for shard_id in self.workspace.prompt_shard_ids(start, end)? {
            if done.contains(&shard_id) {
                continue;
            }
            match self.workspace.load_prompt(&shard_id) {
                Ok(content) => tasks.push(TranslationTask { shard_id, content }),
                Err(err) => warn!("Skipping unreadable prompt {shard_id}: {err}"),
            }
        }
        Ok(tasks)
    }

    /// Shards whose previous output kept a tolerable amount of untranslated
    /// text. The task content is that previous output, not the prompt.
    pub fn residue_retry_tasks(
        &self,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<Vec<TranslationTask>> {
        let mut tasks = Vec::new();
        for (shard_id, record) in self.store.snapshot().failed_translations {
            if record.retried || record.kind != FailureKind::PartialResidue {
                continue;
            }
            if !crate::text_utils::is_in_chapter_range(&shard_id, start, end) {
                continue;
            }
            match self.workspace.load_response(&shard_id) {
                Some(content) => tasks.push(TranslationTask { shard_id, content }),
                None => warn!("Partial output missing for {shard_id}, skipping cleanup"),
            }
        }
        Ok(tasks)
    }

    /// Shards that failed outright and have not been retried yet. These go
    /// back through the full prompt on a stronger model.
    pub fn generic_retry_tasks(
        &self,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<Vec<TranslationTask>> {
        let mut tasks = Vec::new();
        for (shard_id, record) in self.store.snapshot().failed_translations {
            if record.retried || record.kind == FailureKind::PartialResidue {
                continue;
            }
            if !crate::text_utils::is_in_chapter_range(&shard_id, start, end) {
                continue;
            }
            match self.workspace.load_prompt(&shard_id) {
                Ok(content) => tasks.push(TranslationTask { shard_id, content }),
                Err(err) => warn!("Prompt missing for failed shard {shard_id}: {err}"),
            }
        }
        Ok(tasks)
    }
}
