/*!
 * Tests for chapter splitting
 */

use anyhow::Result;
use yantwai::book::BookWorkspace;
use yantwai::sharding::ShardSplitter;

use crate::common;

#[test]
fn test_split_withTextUnderBudget_shouldProduceSingleShard() {
    let splitter = ShardSplitter::new(100);
    let shards = splitter.split("第一行\n第二行\n第三行");
    assert_eq!(shards.len(), 1);
    assert_eq!(shards[0], "第一行\n第二行\n第三行");
}

#[test]
fn test_split_withLongText_shouldRespectLineBoundaries() {
    // each line is 10 chars, budget fits two lines plus separator
    let line = "一二三四五六七八九十";
    let text = [line, line, line, line].join("\n");
    let splitter = ShardSplitter::new(21);
    let shards = splitter.split(&text);
    assert_eq!(shards.len(), 2);
    for shard in &shards {
        assert!(shard.chars().count() <= 21);
        assert_eq!(shard.lines().count(), 2);
    }
}

#[test]
fn test_split_withBlankLines_shouldDropThem() {
    let splitter = ShardSplitter::new(100);
    let shards = splitter.split("第一行\n\n   \n第二行\n");
    assert_eq!(shards, vec!["第一行\n第二行".to_string()]);
}

#[test]
fn test_split_withOverlongLine_shouldHardSplitAtBudget() {
    let splitter = ShardSplitter::new(10);
    let long_line: String = "字".repeat(25);
    let shards = splitter.split(&long_line);
    assert_eq!(shards.len(), 3);
    assert_eq!(shards[0].chars().count(), 10);
    assert_eq!(shards[1].chars().count(), 10);
    assert_eq!(shards[2].chars().count(), 5);
}

#[test]
fn test_split_isDeterministic() {
    let text = common::chinese_chapter(15_000);
    let splitter = ShardSplitter::new(6_000);
    assert_eq!(splitter.split(&text), splitter.split(&text));
}

#[test]
fn test_split_preservesAllContent() {
    let text = common::chinese_chapter(2_000);
    let splitter = ShardSplitter::new(300);
    let shards = splitter.split(&text);
    let rejoined: String = shards.join("\n");
    assert_eq!(rejoined, text);
}

#[test]
fn test_create_shard_files_withFreshChapter_shouldWriteNumberedShards() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", &common::chinese_chapter(15_000))])?;

    let created = ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?;
    assert_eq!(created, 3);
    let ids = workspace.prompt_shard_ids(None, None)?;
    assert_eq!(ids, vec!["chapter_0001_1", "chapter_0001_2", "chapter_0001_3"]);
    Ok(())
}

#[test]
fn test_create_shard_files_reRun_shouldBeNoOp() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[("chapter_0001", &common::chinese_chapter(15_000))])?;
    let splitter = ShardSplitter::new(6_000);

    let first = splitter.create_shard_files(&workspace, None, None)?;
    assert!(first > 0);
    // even with a different budget, an already-split chapter is untouched
    let second = ShardSplitter::new(1_000).create_shard_files(&workspace, None, None)?;
    assert_eq!(second, 0);
    assert_eq!(workspace.prompt_shard_ids(None, None)?.len(), first);
    Ok(())
}

#[test]
fn test_create_shard_files_withRange_shouldSkipChaptersOutside() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[
        ("chapter_0001", "第一章内容"),
        ("chapter_0002", "第二章内容"),
    ])?;

    ShardSplitter::new(6_000).create_shard_files(&workspace, Some(2), Some(2))?;
    let ids = workspace.prompt_shard_ids(None, None)?;
    assert_eq!(ids, vec!["chapter_0002_1"]);
    Ok(())
}

#[test]
fn test_create_shard_files_withEmptyBook_shouldReturnZero() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let workspace = BookWorkspace::open(dir.path())?;
    assert_eq!(ShardSplitter::new(6_000).create_shard_files(&workspace, None, None)?, 0);
    Ok(())
}
