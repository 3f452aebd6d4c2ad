/*!
 * Tests for the book directory layout
 */

use anyhow::Result;
use yantwai::book::{split_shard_id, BookWorkspace, FAILURE_MARKER};

use crate::common;

#[test]
fn test_open_createsRoleDirectories() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let workspace = BookWorkspace::open(dir.path())?;

    assert!(workspace.input_dir().is_dir());
    assert!(workspace.prompts_dir().is_dir());
    assert!(workspace.responses_dir().is_dir());
    assert!(workspace.chapters_dir().is_dir());
    Ok(())
}

#[test]
fn test_split_shard_id_separatesChapterAndIndex() {
    assert_eq!(split_shard_id("chapter_0001_12"), Some(("chapter_0001", 12)));
    assert_eq!(split_shard_id("intro_3"), Some(("intro", 3)));
    assert_eq!(split_shard_id("no-index"), None);
}

#[test]
fn test_response_roundTrip() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[])?;
    assert!(!workspace.has_response("chapter_0001_1"));

    workspace.write_response("chapter_0001_1", "bản dịch")?;
    assert!(workspace.has_response("chapter_0001_1"));
    assert_eq!(workspace.load_response("chapter_0001_1").as_deref(), Some("bản dịch"));

    assert!(workspace.delete_response("chapter_0001_1")?);
    assert!(!workspace.has_response("chapter_0001_1"));
    // deleting again reports nothing to do
    assert!(!workspace.delete_response("chapter_0001_1")?);
    Ok(())
}

#[test]
fn test_failure_marker_roundTrip() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[])?;
    workspace.write_failure_marker("chapter_0001_1", "prohibited_content", "blocked by safety filter")?;

    assert!(workspace.has_response("chapter_0001_1"));
    assert!(workspace.response_is_failure_marker("chapter_0001_1"));
    let content = workspace.load_response("chapter_0001_1").unwrap();
    assert!(content.contains(FAILURE_MARKER));
    assert!(content.contains("prohibited_content"));
    assert!(content.contains("blocked by safety filter"));

    // a real translation is not mistaken for a marker
    workspace.write_response("chapter_0001_2", "bản dịch bình thường")?;
    assert!(!workspace.response_is_failure_marker("chapter_0001_2"));
    Ok(())
}

#[test]
fn test_shard_ids_areSortedAndRangeFiltered() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[])?;
    for shard_id in ["chapter_0002_1", "chapter_0001_2", "chapter_0001_1"] {
        std::fs::write(workspace.prompt_path(shard_id), "原文")?;
    }

    let all = workspace.prompt_shard_ids(None, None)?;
    assert_eq!(all, vec!["chapter_0001_1", "chapter_0001_2", "chapter_0002_1"]);

    let only_first = workspace.prompt_shard_ids(Some(1), Some(1))?;
    assert_eq!(only_first, vec!["chapter_0001_1", "chapter_0001_2"]);
    Ok(())
}

#[test]
fn test_load_prompt_missingFile_isError() -> Result<()> {
    let (_dir, workspace) = common::create_book(&[])?;
    assert!(workspace.load_prompt("chapter_0001_1").is_err());
    assert!(workspace.load_response("chapter_0001_1").is_none());
    Ok(())
}
