/*!
 * Chapter reassembly: merge shard outputs back into one file per chapter.
 */

use anyhow::Result;
use log::{error, info};
use std::collections::BTreeMap;

use crate::book::{split_shard_id, BookWorkspace};
use crate::file_utils::FileManager;

/// Merges a chapter's shard outputs, in shard order, into one finished file
pub struct ChapterCombiner;

impl ChapterCombiner {
    /// Combine all shard outputs in the chapter range into
    /// `translated_chapters/{chapter_stem}.txt`, one file per chapter.
    ///
    /// Shards are ordered by their numeric index and concatenated with a
    /// separating blank line; re-running with identical outputs produces
    /// byte-identical files.
    pub fn combine(
        workspace: &BookWorkspace,
        start_chapter: Option<u32>,
        end_chapter: Option<u32>,
    ) -> Result<usize> {
        let mut chapters: BTreeMap<String, Vec<(u32, String)>> = BTreeMap::new();
        for shard_id in workspace.response_shard_ids(start_chapter, end_chapter)? {
            if let Some((chapter, index)) = split_shard_id(&shard_id) {
                chapters
                    .entry(chapter.to_string())
                    .or_default()
                    .push((index, shard_id.clone()));
            }
        }

        let mut combined_count = 0usize;
        for (chapter, mut shards) in chapters {
            shards.sort_by_key(|(index, _)| *index);

            let mut parts = Vec::with_capacity(shards.len());
            for (_, shard_id) in &shards {
                match workspace.load_response(shard_id) {
                    Some(content) => parts.push(content.trim_end().to_string()),
                    None => error!("Error reading shard output: {}", shard_id),
                }
            }

            let output_path = workspace.chapters_dir().join(format!("{}.txt", chapter));
            let combined = parts.join("\n\n") + "\n";
            FileManager::write_to_file(&output_path, &combined)?;
            info!("Combined chapter translation: {}", chapter);
            combined_count += 1;
        }

        info!("Combine chapter translations complete");
        Ok(combined_count)
    }
}
