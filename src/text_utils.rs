/*!
 * Pure, stateless text helpers used by the translation core.
 *
 * Nothing here touches the filesystem or holds state: residue measurement,
 * output normalization and chapter-range helpers only.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Instruction-echo fragments that must never survive into an output file.
/// The model occasionally parrots the prompt scaffolding back.
const IGNORE_WORDS_IN_TRANSLATION: [&str; 2] = ["BẢN DỊCH", "NỘI DUNG ĐOẠN VĂN"];

/// Replacement table applied to every normalized line, case-aware
const REPLACEMENTS: [(&str, &str); 1] = [("chị rể", "anh rể")];

static CJK_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[一-鿿]").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());
static CHAPTER_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Measure the share of untranslated source-language (CJK) characters in a
/// text, as a percentage of all characters. Empty text measures 0.
pub fn residue_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let residue = CJK_CHAR.find_iter(text).count();
    (residue as f64 / total as f64) * 100.0
}

/// Normalize a model completion: drop blank and instruction-echo lines,
/// collapse whitespace, straighten curly quotes and apply the replacement
/// table. Lines are re-joined with a blank line between paragraphs.
pub fn normalize_translation(content: &str) -> String {
    let mut normalized_lines = Vec::new();

    for line in content.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if IGNORE_WORDS_IN_TRANSLATION.iter().any(|w| stripped.contains(w)) {
            continue;
        }

        let mut processed = stripped.replace('_', " ");
        processed = MULTI_SPACE.replace_all(&processed, " ").into_owned();
        processed = processed.replace('”', "\"").replace('“', "\"");

        for (pattern, replacement) in REPLACEMENTS {
            processed = replace_case_aware(&processed, pattern, replacement);
        }

        normalized_lines.push(processed);
    }

    normalized_lines.join("\n\n")
}

/// Replace every occurrence of `pattern` (case-insensitively) with
/// `replacement`, capitalizing the replacement when the match was.
fn replace_case_aware(text: &str, pattern: &str, replacement: &str) -> String {
    let re = Regex::new(&format!("(?i){}", regex::escape(pattern))).unwrap();
    re.replace_all(text, |caps: &regex::Captures| {
        let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let starts_upper = matched.chars().next().is_some_and(|c| c.is_uppercase());
        if starts_upper {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        } else {
            replacement.to_string()
        }
    })
    .into_owned()
}

/// Extract the chapter number from a filename, if present
pub fn extract_chapter_number(filename: &str) -> Option<u32> {
    CHAPTER_NUMBER
        .find(filename)
        .and_then(|m| m.as_str().parse().ok())
}

/// Check if a file belongs to the specified chapter range. Files without a
/// chapter number are always included.
pub fn is_in_chapter_range(filename: &str, start: Option<u32>, end: Option<u32>) -> bool {
    let Some(chapter) = extract_chapter_number(filename) else {
        return true;
    };
    if let Some(lower) = start {
        if chapter < lower {
            return false;
        }
    }
    if let Some(upper) = end {
        if chapter > upper {
            return false;
        }
    }
    true
}
