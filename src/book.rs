/*!
 * Book workspace: directory roles and shard file naming under one book.
 *
 * A book directory holds four roles plus the durable progress document:
 * - `input_chapters/`: one text file per chapter, written by the fetcher
 * - `prompt_files/`: one file per shard, `{chapter_stem}_{index}.txt`
 * - `translation_responses/`: one output or failure-marker file per shard
 * - `translated_chapters/`: one combined file per fully-resolved chapter
 */

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;
use crate::text_utils::is_in_chapter_range;

/// First line of the human-readable file written in place of an output when
/// a translation fails with excessive residue or an outright model error.
pub const FAILURE_MARKER: &str = "[TRANSLATION FAILED]";

static SHARD_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*)_(\d+)$").unwrap());

/// Split a shard id into its chapter stem and 1-based shard index.
/// Returns None for names that do not follow `{stem}_{index}`.
pub fn split_shard_id(shard_id: &str) -> Option<(&str, u32)> {
    let caps = SHARD_STEM.captures(shard_id)?;
    let stem = caps.get(1)?.as_str();
    let index: u32 = caps.get(2)?.as_str().parse().ok()?;
    Some((stem, index))
}

/// Handle to one book's directory layout
#[derive(Debug, Clone)]
pub struct BookWorkspace {
    book_dir: PathBuf,
}

impl BookWorkspace {
    /// Open a book directory, creating the role subdirectories if needed
    pub fn open<P: AsRef<Path>>(book_dir: P) -> Result<Self> {
        let workspace = Self {
            book_dir: book_dir.as_ref().to_path_buf(),
        };
        for dir in [
            workspace.input_dir(),
            workspace.prompts_dir(),
            workspace.responses_dir(),
            workspace.chapters_dir(),
        ] {
            FileManager::ensure_dir(&dir)
                .with_context(|| format!("Failed to create book subdirectory: {:?}", dir))?;
        }
        Ok(workspace)
    }

    pub fn book_dir(&self) -> &Path {
        &self.book_dir
    }

    pub fn input_dir(&self) -> PathBuf {
        self.book_dir.join("input_chapters")
    }

    pub fn prompts_dir(&self) -> PathBuf {
        self.book_dir.join("prompt_files")
    }

    pub fn responses_dir(&self) -> PathBuf {
        self.book_dir.join("translation_responses")
    }

    pub fn chapters_dir(&self) -> PathBuf {
        self.book_dir.join("translated_chapters")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.book_dir.join("progress.json")
    }

    pub fn names_path(&self) -> PathBuf {
        self.book_dir.join("names.json")
    }

    /// Shard ids (file stems) present in a role directory, filtered to the
    /// chapter range and sorted for deterministic batching.
    fn shard_ids_in(&self, dir: &Path, start: Option<u32>, end: Option<u32>) -> Result<Vec<String>> {
        let mut ids: Vec<String> = FileManager::list_txt_files(dir)?
            .into_iter()
            .map(|p| FileManager::file_stem(&p))
            .filter(|stem| is_in_chapter_range(stem, start, end))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Shard ids that have a prompt file
    pub fn prompt_shard_ids(&self, start: Option<u32>, end: Option<u32>) -> Result<Vec<String>> {
        self.shard_ids_in(&self.prompts_dir(), start, end)
    }

    /// Shard ids that have an output (or failure-marker) file
    pub fn response_shard_ids(&self, start: Option<u32>, end: Option<u32>) -> Result<Vec<String>> {
        self.shard_ids_in(&self.responses_dir(), start, end)
    }

    /// Chapter stems present in the input directory
    pub fn input_chapter_stems(&self, start: Option<u32>, end: Option<u32>) -> Result<Vec<String>> {
        let mut stems: Vec<String> = FileManager::list_txt_files(&self.input_dir())?
            .into_iter()
            .map(|p| FileManager::file_stem(&p))
            .filter(|stem| is_in_chapter_range(stem, start, end))
            .collect();
        stems.sort();
        Ok(stems)
    }

    pub fn prompt_path(&self, shard_id: &str) -> PathBuf {
        self.prompts_dir().join(format!("{}.txt", shard_id))
    }

    pub fn response_path(&self, shard_id: &str) -> PathBuf {
        self.responses_dir().join(format!("{}.txt", shard_id))
    }

    /// Load a shard's prompt content
    pub fn load_prompt(&self, shard_id: &str) -> Result<String> {
        FileManager::read_to_string(self.prompt_path(shard_id))
    }

    /// Load a shard's output content, None when no output exists yet
    pub fn load_response(&self, shard_id: &str) -> Option<String> {
        FileManager::read_to_string(self.response_path(shard_id)).ok()
    }

    /// Write a shard's translated output
    pub fn write_response(&self, shard_id: &str, content: &str) -> Result<()> {
        FileManager::write_to_file(self.response_path(shard_id), content)
    }

    /// Delete a shard's output file. Returns true when a file was removed.
    pub fn delete_response(&self, shard_id: &str) -> Result<bool> {
        FileManager::delete_file(self.response_path(shard_id))
    }

    /// Whether a shard has any output file (real output or failure marker)
    pub fn has_response(&self, shard_id: &str) -> bool {
        FileManager::file_exists(self.response_path(shard_id))
    }

    /// Write a human-readable failure marker in place of the shard output
    pub fn write_failure_marker(
        &self,
        shard_id: &str,
        failure_type: &str,
        description: &str,
    ) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let content = format!(
            "{}\n\nFailure Type: {}\n\nDescription: {}\n\nTimestamp: {}\n\n\
             This file indicates a failed translation. Please check the error \
             details above or manually translate this content.",
            FAILURE_MARKER, failure_type, description, timestamp
        );
        self.write_response(shard_id, &content)
    }

    /// Whether the shard's output file is a failure marker
    pub fn response_is_failure_marker(&self, shard_id: &str) -> bool {
        self.load_response(shard_id)
            .is_some_and(|content| content.contains(FAILURE_MARKER))
    }
}
