//! Boundary-counting text statistics.
//!
//! Every function here is pure: the same input always produces the same
//! [`StatisticsRecord`], which is what makes caching analysis results by
//! document safe.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::stats::StatisticsRecord;
use crate::error::{AppError, AppResult};

/// Punctuation removed from tokens before counting words
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.,!?;:()]").unwrap());

/// One or more dots close a sentence. `!` and `?` are not terminators.
static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.+").unwrap());

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

/// Compute statistics for `text`.
pub fn analyze(text: &str) -> StatisticsRecord {
    let stripped = PUNCTUATION.replace_all(text.trim(), "");

    let mut word_count = 0;
    let mut longest_word = String::new();
    let mut longest_len = 0;
    for word in stripped.split_whitespace() {
        word_count += 1;
        let len = word.chars().count();
        // strict comparison keeps the first of equally long words
        if len > longest_len {
            longest_len = len;
            longest_word = word.to_lowercase();
        }
    }

    StatisticsRecord {
        word_count,
        character_count: text.chars().filter(|c| !c.is_whitespace()).count(),
        sentence_count: count_segments(&SENTENCE_BREAK, text),
        paragraph_count: count_segments(&PARAGRAPH_BREAK, text),
        longest_word,
    }
}

/// Analyze an untyped JSON value, rejecting anything that is not a string.
pub fn analyze_value(value: &Value) -> AppResult<StatisticsRecord> {
    match value {
        Value::String(text) => Ok(analyze(text)),
        _ => Err(AppError::InvalidInput("Text must be a string".to_string())),
    }
}

// Whitespace-only segments do not count.
fn count_segments(separator: &Regex, text: &str) -> usize {
    separator
        .split(text)
        .filter(|segment| !segment.trim().is_empty())
        .count()
}
