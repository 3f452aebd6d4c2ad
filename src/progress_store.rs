/*!
 * Durable, lock-protected translation progress.
 *
 * One JSON document per book records per-shard failure state and per-model
 * rate-limit bookkeeping. The document is always written as a whole through
 * a temp-file-then-rename so a crash mid-write never leaves a torn file,
 * and the write is guarded by an OS advisory lock so concurrent processes
 * cannot corrupt it. Callers never hold the raw state: all changes go
 * through transactional [`ProgressStore::mutate`].
 */

use fs2::FileExt;
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::StoreError;

/// Classification of a failed shard translation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Any failure with no more specific category
    Generic,
    /// Output kept, but 0.5-20% of it is still source-language text
    PartialResidue,
    /// Output discarded, more than 20% was still source-language text
    ExcessiveResidue,
    /// The model refused the content as prohibited
    ProhibitedContent,
    /// The model refused the content as copyrighted
    CopyrightedContent,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::PartialResidue => "partial_residue",
            Self::ExcessiveResidue => "excessive_residue",
            Self::ProhibitedContent => "prohibited_content",
            Self::CopyrightedContent => "copyrighted_content",
        }
    }

    /// Categorize a failure from its error description when the caller has
    /// no more specific kind to offer
    pub fn from_description(description: &str) -> Self {
        let lower = description.to_lowercase();
        if lower.contains("prohibited") {
            Self::ProhibitedContent
        } else if lower.contains("copyright") {
            Self::CopyrightedContent
        } else {
            Self::Generic
        }
    }
}

/// Durable record marking a shard as unresolved
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FailureRecord {
    pub failure_description: String,
    #[serde(rename = "failure_type")]
    pub kind: FailureKind,
    pub timestamp: f64,
    #[serde(default)]
    pub retried: bool,
}

/// Rate-limit bookkeeping for one model identity
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct RateLimitEntry {
    pub last_batch_time: f64,
    pub last_batch_size: u64,
}

/// The single durable root object, serialized as a whole
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProgressState {
    #[serde(default)]
    pub model_rate_limits: BTreeMap<String, RateLimitEntry>,

    #[serde(default)]
    pub failed_translations: BTreeMap<String, FailureRecord>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub clean_cancellation: bool,
}

fn now_unix_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Lock-protected progress store for one book
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    state: Mutex<ProgressState>,
}

impl ProgressStore {
    /// Load the store from disk. A missing or corrupt document is replaced
    /// with a fresh empty one rather than raising.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match Self::read_state(&path) {
            Some(state) => state,
            None => {
                info!("Progress file not found or corrupt, initializing new progress");
                ProgressState::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn lock_path(path: &Path) -> PathBuf {
        path.with_extension("json.lock")
    }

    fn read_state(path: &Path) -> Option<ProgressState> {
        // Shared lock on the writer's sibling lock file so a concurrent
        // checkpoint cannot hand us a half-written view
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(Self::lock_path(path))
            .ok();
        if let Some(lock) = &lock_file {
            if let Err(e) = lock.lock_shared() {
                warn!("Could not lock progress file for reading: {}", e);
            }
        }
        let file = match File::open(path) {
            Ok(file) => file,
            Err(_) => {
                if let Some(lock) = &lock_file {
                    let _ = fs2::FileExt::unlock(lock);
                }
                return None;
            }
        };
        let result = serde_json::from_reader(&file);
        if let Some(lock) = &lock_file {
            let _ = fs2::FileExt::unlock(lock);
        }
        match result {
            Ok(state) => Some(state),
            Err(e) => {
                error!("Progress file is corrupt, re-initializing: {}", e);
                None
            }
        }
    }

    /// A point-in-time copy of the state, for read-only aggregation
    pub fn snapshot(&self) -> ProgressState {
        self.state.lock().clone()
    }

    /// Apply a change under the in-memory lock and checkpoint the whole
    /// document to disk before returning.
    pub fn mutate<F>(&self, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ProgressState),
    {
        let mut state = self.state.lock();
        apply(&mut state);
        self.save(&state)
    }

    /// Atomic write: temp file, fsync, rename, all under an exclusive
    /// advisory lock on a sibling lock file.
    fn save(&self, state: &ProgressState) -> Result<(), StoreError> {
        let lock_path = Self::lock_path(&self.path);
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;
        lock_file.lock_exclusive()?;

        let result = self.write_document(state);
        let _ = fs2::FileExt::unlock(&lock_file);

        if let Err(e) = &result {
            error!("Error saving progress to file: {}", e);
            // Best-effort fallback so the next run at least finds a valid document
            if let Err(recover_error) = self.write_document(&ProgressState::default()) {
                error!("Failed to recover progress file: {}", recover_error);
            }
        }
        result
    }

    fn write_document(&self, state: &ProgressState) -> Result<(), StoreError> {
        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)?;
            serde_json::to_writer_pretty(&mut file, state)?;
            file.flush()?;
            file.sync_all()?;
        }
        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    /// Record that a batch was just dispatched against a model identity
    pub fn record_batch_dispatch(&self, model_id: &str, batch_size: usize) -> Result<(), StoreError> {
        self.mutate(|state| {
            let entry = state
                .model_rate_limits
                .entry(model_id.to_string())
                .or_default();
            entry.last_batch_time = now_unix_secs();
            entry.last_batch_size = batch_size as u64;
        })
    }

    /// The rate-limit bucket for a model identity, if one exists yet
    pub fn rate_limit_entry(&self, model_id: &str) -> Option<RateLimitEntry> {
        self.state.lock().model_rate_limits.get(model_id).copied()
    }

    /// The failure record for a shard, if one exists
    pub fn failure(&self, shard_id: &str) -> Option<FailureRecord> {
        self.state.lock().failed_translations.get(shard_id).cloned()
    }

    /// Mark a shard translation as failed.
    ///
    /// A record that already existed and fails again with anything other
    /// than partial residue becomes terminal (`retried=true`); partial
    /// residue stays eligible for the lite-tier cleanup pass. A record
    /// already marked retried never loses that marker.
    pub fn mark_failed(
        &self,
        shard_id: &str,
        kind: FailureKind,
        description: &str,
    ) -> Result<(), StoreError> {
        warn!("Translation for {} marked as failed: {}", shard_id, kind.as_str());
        self.mutate(|state| {
            let existing = state.failed_translations.get(shard_id);
            let retried = existing.is_some_and(|r| r.retried)
                || (existing.is_some() && kind != FailureKind::PartialResidue);
            state.failed_translations.insert(
                shard_id.to_string(),
                FailureRecord {
                    failure_description: description.to_string(),
                    kind,
                    timestamp: now_unix_secs(),
                    retried,
                },
            );
        })
    }

    /// Mark a shard's failure record as having spent its retry
    pub fn mark_retried(&self, shard_id: &str) -> Result<(), StoreError> {
        self.mutate(|state| {
            if let Some(record) = state.failed_translations.get_mut(shard_id) {
                record.retried = true;
            }
        })
    }

    /// Remove a shard's failure record the instant a retry succeeds
    pub fn clear_failure(&self, shard_id: &str) -> Result<(), StoreError> {
        self.mutate(|state| {
            if state.failed_translations.remove(shard_id).is_some() {
                info!("Removing {} from failed translations after success", shard_id);
            }
        })
    }

    /// Record that a cancellation completed cleanly
    pub fn set_clean_cancellation(&self) -> Result<(), StoreError> {
        self.mutate(|state| {
            state.clean_cancellation = true;
        })
    }

    /// At run start: if the previous run ended with a clean cancellation,
    /// the batch timing data refers to a dead run and is discarded.
    pub fn reset_after_clean_cancellation(&self) -> Result<bool, StoreError> {
        let mut was_cancelled = false;
        self.mutate(|state| {
            if state.clean_cancellation {
                info!("Detected previous clean cancellation, resetting batch timing data");
                state.model_rate_limits.clear();
                state.clean_cancellation = false;
                was_cancelled = true;
            }
        })?;
        Ok(was_cancelled)
    }
}
