/*!
 * Resumability and cancellation tests: a stopped run leaves durable state
 * a later run picks up without redoing finished work.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use yantwai::progress_store::{FailureKind, ProgressStore};
use yantwai::providers::mock::MockProvider;
use yantwai::sharding::ShardSplitter;
use yantwai::translation::{
    CancellationToken, PromptStyle, RunOutcome, TranslationOrchestrator,
};

use crate::common;

fn full_line_translation() -> String {
    "Đây là một dòng dịch hoàn chỉnh và đủ dài của đoạn văn này.".to_string()
}

#[tokio::test]
async fn test_cancellation_midRun_shouldStopCleanlyWithoutCombining() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[
        ("chapter_0001", "第一章的内容。"),
        ("chapter_0002", "第二章的内容。"),
    ])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    // the first completed call requests a stop, as a signal handler would
    let cancel = CancellationToken::new();
    let cancel_from_handler = cancel.clone();
    let provider = Arc::new(MockProvider::with_handler("mock-flash", move |_prompt| {
        cancel_from_handler.cancel();
        full_line_translation()
    }));
    let registry = common::single_provider_registry(Arc::clone(&provider), 1);
    let store = Arc::new(ProgressStore::load(workspace.progress_path()));
    let orchestrator = TranslationOrchestrator::new(
        workspace.clone(),
        Arc::clone(&store),
        registry,
        Duration::from_secs(0),
        common::thresholds(),
        Duration::from_secs(5),
        cancel.clone(),
    );

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Cancelled);
    // only the first batch ran
    assert_eq!(provider.call_count(), 1);
    assert!(workspace.has_response("chapter_0001_1"));
    assert!(!workspace.has_response("chapter_0002_1"));
    // a cancelled run never combines chapters
    assert!(!workspace.chapters_dir().join("chapter_0001.txt").exists());
    // the stop is recorded for the next run
    assert!(store.snapshot().clean_cancellation);
    Ok(())
}

#[tokio::test]
async fn test_resume_afterCancellation_shouldFinishRemainingWorkOnly() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[
        ("chapter_0001", "第一章的内容。"),
        ("chapter_0002", "第二章的内容。"),
    ])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    // simulate a previous run: one shard done, clean cancellation recorded
    workspace.write_response("chapter_0001_1", &full_line_translation())?;
    {
        let store = ProgressStore::load(workspace.progress_path());
        store.record_batch_dispatch("mock-flash", 1)?;
        store.set_clean_cancellation()?;
    }

    let provider = Arc::new(MockProvider::returning("mock-flash", full_line_translation()));
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Completed);
    // only the untranslated shard was dispatched
    assert_eq!(provider.call_count(), 1);
    // the stale cancellation flag and batch timing were discarded at start,
    // then fresh timing was recorded for the dispatched batch
    let state = store.snapshot();
    assert!(!state.clean_cancellation);
    assert_eq!(
        state.model_rate_limits.get("mock-flash").map(|m| m.last_batch_size),
        Some(1)
    );
    assert!(workspace.chapters_dir().join("chapter_0001.txt").exists());
    assert!(workspace.chapters_dir().join("chapter_0002.txt").exists());
    Ok(())
}

#[tokio::test]
async fn test_resume_afterCrash_keepsFailureRecords() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", "第一章的内容。")])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    // simulate a crash right after a terminal failure was recorded
    {
        let store = ProgressStore::load(workspace.progress_path());
        store.mark_failed(
            "chapter_0001_1",
            FailureKind::ProhibitedContent,
            "blocked by safety filter",
        )?;
        store.mark_retried("chapter_0001_1")?;
        workspace.write_failure_marker(
            "chapter_0001_1",
            "prohibited_content",
            "blocked by safety filter",
        )?;
    }

    let provider = Arc::new(MockProvider::returning("mock-flash", full_line_translation()));
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    // the terminal failure is honored, not retried
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(provider.call_count(), 0);
    assert!(store.failure("chapter_0001_1").unwrap().retried);
    Ok(())
}
