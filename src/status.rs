/*!
 * Read-only progress reporting.
 *
 * Derives a per-chapter view from the shard files on disk and the failure
 * map in the progress document. Purely observational: nothing here writes
 * to the workspace or the store.
 */

use std::collections::BTreeMap;

use anyhow::Result;

use crate::book::{split_shard_id, BookWorkspace};
use crate::progress_store::ProgressState;

/// Lifecycle stage of one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStage {
    /// No shard files exist yet.
    NotStarted,
    /// Some shards still lack output.
    Translating,
    /// Every shard has output and no failure is pending a retry.
    Translated,
    /// Every shard has output but at least one is a terminal failure.
    Incomplete,
}

impl ChapterStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStage::NotStarted => "not started",
            ChapterStage::Translating => "translating",
            ChapterStage::Translated => "translated",
            ChapterStage::Incomplete => "incomplete",
        }
    }
}

/// Shard tallies for one chapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterStatus {
    pub total_shards: usize,
    pub translated_shards: usize,
    pub failed_shards: usize,
    pub percent: f64,
    pub stage: ChapterStage,
}

/// Tally shard state per chapter in the given range, sorted by chapter.
pub fn chapter_statuses(
    workspace: &BookWorkspace,
    state: &ProgressState,
    start: Option<u32>,
    end: Option<u32>,
) -> Result<BTreeMap<String, ChapterStatus>> {
    let mut totals: BTreeMap<String, (usize, usize, usize)> = BTreeMap::new();

    for shard_id in workspace.prompt_shard_ids(start, end)? {
        let Some((chapter, _)) = split_shard_id(&shard_id) else {
            continue;
        };
        let entry = totals.entry(chapter.to_string()).or_default();
        entry.0 += 1;
        if workspace.has_response(&shard_id) {
            entry.1 += 1;
        }
        if state
            .failed_translations
            .get(&shard_id)
            .is_some_and(|record| record.retried)
        {
            entry.2 += 1;
        }
    }

    let mut statuses: BTreeMap<String, ChapterStatus> = totals
        .into_iter()
        .map(|(chapter, (total, translated, failed))| {
            let percent = if total > 0 {
                (translated as f64 / total as f64 * 1000.0).round() / 10.0
            } else {
                0.0
            };
            let stage = if translated < total {
                ChapterStage::Translating
            } else if failed > 0 {
                ChapterStage::Incomplete
            } else {
                ChapterStage::Translated
            };
            (
                chapter,
                ChapterStatus {
                    total_shards: total,
                    translated_shards: translated,
                    failed_shards: failed,
                    percent,
                    stage,
                },
            )
        })
        .collect();

    // Input chapters that were never split yet have no shard files at all.
    for chapter in workspace.input_chapter_stems(start, end)? {
        statuses.entry(chapter).or_insert(ChapterStatus {
            total_shards: 0,
            translated_shards: 0,
            failed_shards: 0,
            percent: 0.0,
            stage: ChapterStage::NotStarted,
        });
    }

    Ok(statuses)
}
