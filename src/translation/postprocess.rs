/*!
 * Output validation between iterations.
 *
 * Models occasionally return degenerate output: a single line for a long
 * passage, a word repeated hundreds of times, or text cut off mid-sentence.
 * These files pass the residue check (they contain no source characters)
 * so they are caught here instead, deleted, and the shard re-enters the
 * fresh-work plan on the next iteration. Failure marker files are not
 * outputs and are never touched.
 */

use anyhow::Result;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::book::BookWorkspace;

static SPECIAL_CHAR_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[_\-=]{100,}").expect("invalid special-run pattern"));

/// Word repeated more than `max_repeats` times in a row, case-insensitive.
fn has_repeated_word_run(text: &str, max_repeats: usize) -> bool {
    let mut previous: Option<String> = None;
    let mut run = 0usize;
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let lower = word.to_lowercase();
        if previous.as_deref() == Some(lower.as_str()) {
            run += 1;
            if run > max_repeats {
                return true;
            }
        } else {
            previous = Some(lower);
            run = 1;
        }
    }
    false
}

fn invalid_reasons(content: &str, prompt: &str) -> Vec<&'static str> {
    let mut reasons = Vec::new();

    let content_lines = content.lines().count();
    let prompt_lines = prompt.lines().count();
    if content_lines <= 1 && prompt_lines > 1 {
        reasons.push("short content");
    }
    if has_repeated_word_run(content, 20) {
        reasons.push("repeated words");
    }
    if SPECIAL_CHAR_RUN.is_match(content) {
        reasons.push("repeated special characters");
    }
    let content_len = content.chars().count();
    let prompt_len = prompt.chars().count();
    if (content_len as f64) < prompt_len as f64 * 0.3
        && (content_lines as f64) < prompt_lines as f64 * 0.5
    {
        reasons.push("suspicious length ratio");
    }
    if let Some(last) = content.trim_end().chars().last() {
        let terminal = matches!(last, '.' | '!' | '?' | '。' | '…');
        if !terminal && (content_len as f64) < prompt_len as f64 * 0.9 {
            reasons.push("ends mid-sentence");
        }
    }

    reasons
}

/// Delete outputs that are unreadable, orphaned, or fail the validity
/// heuristics. Returns the number of files deleted.
pub fn delete_invalid_translations(workspace: &BookWorkspace) -> Result<usize> {
    let mut deleted = 0usize;

    for shard_id in workspace.response_shard_ids(None, None)? {
        if workspace.response_is_failure_marker(&shard_id) {
            continue;
        }

        let content = match workspace.load_response(&shard_id) {
            Some(content) => content,
            None => {
                if workspace.delete_response(&shard_id)? {
                    warn!("Deleted unreadable translation: {shard_id}");
                    deleted += 1;
                }
                continue;
            }
        };

        let prompt = match workspace.load_prompt(&shard_id) {
            Ok(prompt) => prompt,
            Err(_) => {
                if workspace.delete_response(&shard_id)? {
                    warn!("Deleted translation with no prompt: {shard_id}");
                    deleted += 1;
                }
                continue;
            }
        };

        let reasons = invalid_reasons(&content, &prompt);
        if !reasons.is_empty() && workspace.delete_response(&shard_id)? {
            warn!(
                "Deleted likely invalid translation {shard_id} ({})",
                reasons.join(", ")
            );
            deleted += 1;
        }
    }

    if deleted > 0 {
        info!("Deleted {deleted} invalid translation files");
    }
    Ok(deleted)
}
