use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::book::BookWorkspace;
use crate::progress_store::ProgressStore;
use crate::sharding::ShardSplitter;
use crate::status::{self, ChapterStage};
use crate::translation::{
    CancellationToken, ModelTierRegistry, PromptStyle, RunOutcome, TranslationOrchestrator,
};

// @module: Application controller wiring configuration to the engine

/// Main application controller for book translation
pub struct Controller {
    config: Config,
    cancel: CancellationToken,
}

impl Controller {
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Token a signal handler can use to request a clean stop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the full workflow for one book directory: split chapters into
    /// shards, drive the translation to completion, report the result.
    pub async fn run(
        &self,
        book_dir: PathBuf,
        style: PromptStyle,
        start_chapter: Option<u32>,
        end_chapter: Option<u32>,
    ) -> Result<RunOutcome> {
        let start_time = std::time::Instant::now();
        let workspace = BookWorkspace::open(&book_dir)
            .with_context(|| format!("Failed to open book directory: {}", book_dir.display()))?;

        let created = self.split_chapters(&workspace, start_chapter, end_chapter)?;
        if created > 0 {
            info!("Created {created} new shard files");
        }

        let store = Arc::new(ProgressStore::load(workspace.progress_path()));
        let tiers = ModelTierRegistry::from_config(&self.config)?;
        let orchestrator = TranslationOrchestrator::new(
            workspace.clone(),
            store,
            tiers,
            Duration::from_secs(self.config.batch_interval_secs),
            self.config.thresholds,
            Duration::from_secs(self.config.request_timeout_secs),
            self.cancel.clone(),
        );

        let outcome = orchestrator.run(style, start_chapter, end_chapter).await?;
        match outcome {
            RunOutcome::Completed => info!(
                "Finished {} in {:.1}s",
                book_dir.display(),
                start_time.elapsed().as_secs_f64()
            ),
            RunOutcome::Cancelled => warn!(
                "Stopped {} after {:.1}s, run again to resume",
                book_dir.display(),
                start_time.elapsed().as_secs_f64()
            ),
        }
        Ok(outcome)
    }

    /// Split every chapter in range into shard files. Chapters that already
    /// have shards are skipped.
    fn split_chapters(
        &self,
        workspace: &BookWorkspace,
        start_chapter: Option<u32>,
        end_chapter: Option<u32>,
    ) -> Result<usize> {
        let chapters = workspace.input_chapter_stems(start_chapter, end_chapter)?;
        if chapters.is_empty() {
            return Ok(0);
        }

        let progress_bar = ProgressBar::new(chapters.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        progress_bar.set_message("Splitting chapters");

        let splitter = ShardSplitter::new(self.config.max_shard_chars);
        let created = splitter.create_shard_files(workspace, start_chapter, end_chapter)?;

        progress_bar.finish_with_message(format!("{created} shards created"));
        Ok(created)
    }

    /// Print the per-chapter progress table for a book. Read-only.
    pub fn report_status(
        &self,
        book_dir: PathBuf,
        start_chapter: Option<u32>,
        end_chapter: Option<u32>,
    ) -> Result<()> {
        let workspace = BookWorkspace::open(&book_dir)
            .with_context(|| format!("Failed to open book directory: {}", book_dir.display()))?;
        let store = ProgressStore::load(workspace.progress_path());
        let statuses =
            status::chapter_statuses(&workspace, &store.snapshot(), start_chapter, end_chapter)?;

        if statuses.is_empty() {
            println!("No chapters found in {}", book_dir.display());
            return Ok(());
        }

        println!("{:<40} {:>7} {:>7} {:>7} {:>8}  status", "chapter", "shards", "done", "failed", "percent");
        for (chapter, status) in &statuses {
            println!(
                "{:<40} {:>7} {:>7} {:>7} {:>7.1}%  {}",
                chapter,
                status.total_shards,
                status.translated_shards,
                status.failed_shards,
                status.percent,
                status.stage.as_str()
            );
        }

        let incomplete = statuses
            .values()
            .filter(|s| s.stage == ChapterStage::Incomplete)
            .count();
        if incomplete > 0 {
            warn!("{incomplete} chapters contain shards that failed for good");
        }
        Ok(())
    }
}
