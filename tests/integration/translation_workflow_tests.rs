/*!
 * End-to-end translation workflow tests: split, translate through mock
 * providers, classify, combine.
 */

use std::sync::Arc;

use anyhow::Result;
use yantwai::combine::ChapterCombiner;
use yantwai::progress_store::FailureKind;
use yantwai::providers::mock::{MockErrorKind, MockProvider};
use yantwai::providers::Provider;
use yantwai::sharding::ShardSplitter;
use yantwai::translation::{ModelTierRegistry, PromptStyle, RunOutcome};

use crate::common;

/// Extract the passage between the content markers of a prompt.
fn passage_of(prompt: &str) -> String {
    let marker = "[**NỘI DUNG ĐOẠN VĂN**]";
    let start = prompt.find(marker).map(|i| i + marker.len()).unwrap_or(0);
    let end = prompt.rfind(marker).unwrap_or(prompt.len());
    prompt[start..end].trim().to_string()
}

/// A translator that answers every passage line with a full target-language
/// sentence, so outputs survive the validity heuristics.
fn translating_mock(model: &str) -> MockProvider {
    MockProvider::with_handler(model, |prompt| {
        passage_of(prompt)
            .lines()
            .enumerate()
            .map(|(i, _)| format!("Đây là dòng dịch hoàn chỉnh thứ {} của đoạn văn này.", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

#[tokio::test]
async fn test_run_withCleanMock_shouldTranslateAndCombine() -> Result<()> {
    let (_dir, workspace) =
        common::create_book(&[("chapter_0001", &common::chinese_chapter(15_000))])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;
    assert_eq!(workspace.prompt_shard_ids(None, None)?.len(), 3);

    let provider = Arc::new(translating_mock("mock-flash"));
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(provider.call_count(), 3);
    assert!(store.snapshot().failed_translations.is_empty());

    let combined =
        std::fs::read_to_string(workspace.chapters_dir().join("chapter_0001.txt"))?;
    assert!(combined.contains("dòng dịch hoàn chỉnh"));
    // shard outputs are separated by a blank line
    assert!(combined.contains("\n\n"));
    Ok(())
}

#[tokio::test]
async fn test_run_secondInvocation_shouldMakeZeroModelCalls() -> Result<()> {
    let (_dir, workspace) =
        common::create_book(&[("chapter_0001", &common::chinese_chapter(10_000))])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    let provider = Arc::new(translating_mock("mock-flash"));
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (_store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);
    orchestrator.run(PromptStyle::Modern, None, None).await?;
    let calls_after_first = provider.call_count();

    // fresh orchestrator over the same workspace: everything is resolved
    let provider2 = Arc::new(translating_mock("mock-flash"));
    let registry2 = common::single_provider_registry(Arc::clone(&provider2), 15);
    let (_store2, orchestrator2, _cancel2) = common::build_orchestrator(&workspace, registry2);
    let outcome = orchestrator2.run(PromptStyle::Modern, None, None).await?;

    assert_eq!(outcome, RunOutcome::Completed);
    assert!(calls_after_first > 0);
    assert_eq!(provider2.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_withTransientErrorFirst_shouldRetryWithoutRecording() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", "这是一个短章节。")])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    let provider = Arc::new(translating_mock("mock-flash"));
    provider.push_error(MockErrorKind::RateLimit);
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Completed);
    // first call hit the quota error, second succeeded
    assert_eq!(provider.call_count(), 2);
    // transient failures never reach the durable failure map
    assert!(store.snapshot().failed_translations.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_withPartialResidue_shouldCleanUpOnLiteTier() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", "这是一个短章节。")])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    // primary leaves some source characters behind (between 0.5% and 20%)
    let primary = Arc::new(MockProvider::returning(
        "mock-flash",
        format!("{} 残留 còn sót vài chữ.", "Đây là một bản dịch khá dài và hoàn chỉnh của đoạn văn."),
    ));
    let lite = Arc::new(translating_mock("mock-lite"));
    let pro = Arc::new(translating_mock("mock-pro"));
    let registry = ModelTierRegistry::with_providers(
        (Arc::clone(&primary) as Arc<dyn Provider>, 15),
        (Arc::clone(&lite) as Arc<dyn Provider>, 30),
        (Arc::clone(&pro) as Arc<dyn Provider>, 5),
    );
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(primary.call_count(), 1);
    assert_eq!(lite.call_count(), 1);
    assert_eq!(pro.call_count(), 0);
    // the cleanup pass got the previous partial output, not the prompt
    let last_prompt = lite.tracker().lock().last_prompt.clone().unwrap();
    assert!(last_prompt.contains("còn sót vài chữ"));
    // success cleared the partial-residue record
    assert!(store.snapshot().failed_translations.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_run_withProhibitedContent_shouldFailTerminally() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", "这是一个短章节。")])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    // both the first attempt and the pro retry are refused
    let provider = Arc::new(translating_mock("mock-flash"));
    provider.push_error(MockErrorKind::Prohibited);
    provider.push_error(MockErrorKind::Prohibited);
    let registry = common::single_provider_registry(Arc::clone(&provider), 15);
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    // terminal failure still counts as resolved, so the run completes
    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(provider.call_count(), 2);

    let record = store.failure("chapter_0001_1").expect("failure should be recorded");
    assert_eq!(record.kind, FailureKind::ProhibitedContent);
    assert!(record.retried);
    assert!(workspace.response_is_failure_marker("chapter_0001_1"));
    Ok(())
}

#[tokio::test]
async fn test_run_withExcessiveResidue_shouldDiscardAndRetryOnPro() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", "这是一个短章节。")])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    let primary = Arc::new(MockProvider::returning("mock-flash", "完全没有翻译的中文输出内容"));
    let lite = Arc::new(translating_mock("mock-lite"));
    let pro = Arc::new(translating_mock("mock-pro"));
    let registry = ModelTierRegistry::with_providers(
        (Arc::clone(&primary) as Arc<dyn Provider>, 15),
        (Arc::clone(&lite) as Arc<dyn Provider>, 30),
        (Arc::clone(&pro) as Arc<dyn Provider>, 5),
    );
    let (store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);

    let outcome = orchestrator.run(PromptStyle::Modern, None, None).await?;
    assert_eq!(outcome, RunOutcome::Completed);
    // the discarded output went back through the pro tier, not the lite tier
    assert_eq!(primary.call_count(), 1);
    assert_eq!(lite.call_count(), 0);
    assert_eq!(pro.call_count(), 1);
    // pro succeeded, so the record is gone and real output exists
    assert!(store.snapshot().failed_translations.is_empty());
    assert!(!workspace.response_is_failure_marker("chapter_0001_1"));
    Ok(())
}

#[tokio::test]
async fn test_combine_isDrivenByRunCompletion() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[
        ("chapter_0001", "第一章的内容。"),
        ("chapter_0002", "第二章的内容。"),
    ])?;
    ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;

    let provider = Arc::new(translating_mock("mock-flash"));
    let registry = common::single_provider_registry(provider, 15);
    let (_store, orchestrator, _cancel) = common::build_orchestrator(&workspace, registry);
    orchestrator.run(PromptStyle::Modern, None, None).await?;

    assert!(workspace.chapters_dir().join("chapter_0001.txt").exists());
    assert!(workspace.chapters_dir().join("chapter_0002.txt").exists());

    // re-combining by hand is idempotent
    assert_eq!(ChapterCombiner::combine(&workspace, None, None)?, 2);
    Ok(())
}
