/*!
 * Chapter sharding: split chapter text into size-bounded, order-preserving
 * work units and materialize them as prompt files.
 */

use anyhow::Result;
use log::{debug, info, warn};

use crate::book::{split_shard_id, BookWorkspace};
use crate::file_utils::FileManager;
use crate::text_utils::is_in_chapter_range;

/// Splits chapter text into shards within a character budget
pub struct ShardSplitter {
    max_shard_chars: usize,
}

impl ShardSplitter {
    pub fn new(max_shard_chars: usize) -> Self {
        Self { max_shard_chars }
    }

    /// Split text into ordered shards, packing whole lines greedily while
    /// the running size stays within the budget. Blank lines are dropped.
    /// A single line longer than the budget is hard-split at the budget
    /// boundary since no line break is available to respect.
    pub fn split(&self, text: &str) -> Vec<String> {
        let budget = self.max_shard_chars;
        let mut shards: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let line_len = line.chars().count();

            if line_len > budget {
                if !current.is_empty() {
                    shards.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(budget) {
                    shards.push(piece.iter().collect());
                }
                continue;
            }

            let separator_len = usize::from(!current.is_empty());
            if current_len + separator_len + line_len <= budget {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(line);
                current_len += separator_len + line_len;
            } else {
                shards.push(std::mem::take(&mut current));
                current.push_str(line);
                current_len = line_len;
            }
        }

        if !current.is_empty() {
            shards.push(current);
        }
        shards
    }

    /// Create shard prompt files for every chapter in range that does not
    /// already have them. Re-running on an already-split chapter is a no-op,
    /// so shard identities stay stable across runs.
    pub fn create_shard_files(
        &self,
        workspace: &BookWorkspace,
        start_chapter: Option<u32>,
        end_chapter: Option<u32>,
    ) -> Result<usize> {
        let chapter_files: Vec<_> = FileManager::list_txt_files(workspace.input_dir())?
            .into_iter()
            .filter(|p| {
                is_in_chapter_range(&FileManager::file_stem(p), start_chapter, end_chapter)
            })
            .collect();
        if chapter_files.is_empty() {
            warn!("No chapter files found in: {:?}", workspace.input_dir());
            return Ok(0);
        }

        let mut existing_chapters: Vec<String> = Vec::new();
        for shard_id in workspace.prompt_shard_ids(None, None)? {
            if let Some((chapter, _)) = split_shard_id(&shard_id) {
                existing_chapters.push(chapter.to_string());
            }
        }

        let mut shard_count = 0usize;
        let mut new_chapter_count = 0usize;
        for chapter_file in chapter_files {
            let stem = FileManager::file_stem(&chapter_file);
            if existing_chapters.iter().any(|c| c == &stem) {
                debug!("Skipping {} - shard files already exist", stem);
                continue;
            }

            let chapter_text = FileManager::read_to_string(&chapter_file)?;
            let shards = self.split(&chapter_text);
            for (idx, shard_text) in shards.iter().enumerate() {
                let shard_id = format!("{}_{}", stem, idx + 1);
                FileManager::write_to_file(workspace.prompt_path(&shard_id), shard_text)?;
                shard_count += 1;
            }
            new_chapter_count += 1;
        }

        if new_chapter_count > 0 {
            info!(
                "Created {} shard files from {} new chapters",
                shard_count, new_chapter_count
            );
        } else {
            info!("No new chapters to split - all chapters already have shard files");
        }
        Ok(shard_count)
    }
}
