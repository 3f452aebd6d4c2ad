/*!
 * Character-name glossary.
 *
 * Proper names drift between shards unless the model is told what earlier
 * shards settled on. After each iteration the accumulated outputs are
 * scanned for capitalized multi-word phrases; names seen often enough are
 * persisted to `names.json` (sorted by count, descending) and the list is
 * fed back into subsequent first-pass prompts.
 */

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;

use crate::book::BookWorkspace;

/// A phrase must occur at least this often across outputs to be kept.
const MIN_OCCURRENCES: u64 = 10;

/// Names must span 2 to 4 capitalized words.
const NAME_PARTS: std::ops::RangeInclusive<usize> = 2..=4;

fn is_name_part(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_alphabetic() && c.is_uppercase())
}

fn clean_name(parts: &[&str]) -> Option<String> {
    let joined = parts.join(" ");
    let cleaned: String = joined
        .chars()
        .filter(|&c| !c.is_ascii_punctuation() || c == '-' || c == '\'')
        .collect();
    let cleaned = cleaned.trim().to_string();
    // reject phrases with interior punctuation beyond hyphens/apostrophes:
    // those are sentence fragments, not names
    let stripped: String = joined.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    let comparable: String = cleaned.chars().filter(|&c| c != '-' && c != '\'').collect();
    if comparable != stripped {
        return None;
    }
    Some(cleaned)
}

/// Extract candidate names and occurrence counts from one text.
pub fn count_names(text: &str) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    let mut current: Vec<&str> = Vec::new();

    let flush = |current: &mut Vec<&str>, counts: &mut HashMap<String, u64>| {
        if NAME_PARTS.contains(&current.len()) {
            if let Some(name) = clean_name(current) {
                *counts.entry(name).or_insert(0) += 1;
            }
        }
        current.clear();
    };

    for word in text.split_whitespace() {
        if is_name_part(word) {
            current.push(word);
        } else {
            flush(&mut current, &mut counts);
        }
    }
    flush(&mut current, &mut counts);
    counts
}

/// Scan all translation outputs, aggregate name counts and rewrite
/// `names.json` with phrases at or above the occurrence floor.
pub fn harvest(workspace: &BookWorkspace) -> Result<usize> {
    let mut aggregated: HashMap<String, u64> = HashMap::new();

    for shard_id in workspace.response_shard_ids(None, None)? {
        if workspace.response_is_failure_marker(&shard_id) {
            continue;
        }
        if let Some(content) = workspace.load_response(&shard_id) {
            for (name, count) in count_names(&content) {
                *aggregated.entry(name).or_insert(0) += count;
            }
        }
    }

    let mut kept: Vec<(String, u64)> = aggregated
        .into_iter()
        .filter(|(_, count)| *count >= MIN_OCCURRENCES)
        .collect();

    if kept.is_empty() {
        debug!("No recurring names found yet");
        return Ok(0);
    }

    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let document: serde_json::Map<String, Value> = kept
        .iter()
        .map(|(name, count)| (name.clone(), Value::from(*count)))
        .collect();

    let path = workspace.names_path();
    std::fs::write(&path, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Failed to write glossary: {}", path.display()))?;
    info!("Saved {} recurring names to {}", kept.len(), path.display());
    Ok(kept.len())
}

/// Load `names.json` and format it as `Name - count` lines for prompt
/// inclusion. Returns `None` when no glossary exists yet.
pub fn formatted_names(workspace: &BookWorkspace) -> Option<String> {
    let content = std::fs::read_to_string(workspace.names_path()).ok()?;
    let data: serde_json::Map<String, Value> = serde_json::from_str(&content).ok()?;
    if data.is_empty() {
        return None;
    }
    let mut out = String::new();
    for (name, count) in &data {
        if let Some(count) = count.as_u64() {
            out.push_str(&format!("{name} - {count}\n"));
        }
    }
    Some(out)
}
