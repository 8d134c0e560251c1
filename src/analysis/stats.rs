use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Statistics derived from a text's content. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRecord {
    pub word_count: usize,
    pub character_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub longest_word: String,
}

impl StatisticsRecord {
    /// Pull a single statistic out of the record
    pub fn get(&self, stat: StatName) -> StatValue {
        match stat {
            StatName::WordCount => StatValue::Count(self.word_count),
            StatName::CharacterCount => StatValue::Count(self.character_count),
            StatName::SentenceCount => StatValue::Count(self.sentence_count),
            StatName::ParagraphCount => StatValue::Count(self.paragraph_count),
            StatName::LongestWord => StatValue::Word(self.longest_word.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(usize),
    Word(String),
}

/// One individually addressable statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatName {
    WordCount,
    CharacterCount,
    SentenceCount,
    ParagraphCount,
    LongestWord,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown statistic '{0}'")]
pub struct UnknownStat(pub String);

impl StatName {
    pub const ALL: [StatName; 5] = [
        StatName::WordCount,
        StatName::CharacterCount,
        StatName::SentenceCount,
        StatName::ParagraphCount,
        StatName::LongestWord,
    ];

    /// Field name used in payloads and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            StatName::WordCount => "wordCount",
            StatName::CharacterCount => "characterCount",
            StatName::SentenceCount => "sentenceCount",
            StatName::ParagraphCount => "paragraphCount",
            StatName::LongestWord => "longestWord",
        }
    }

    /// Path segment form, e.g. `word-count`
    pub fn slug(&self) -> &'static str {
        match self {
            StatName::WordCount => "word-count",
            StatName::CharacterCount => "character-count",
            StatName::SentenceCount => "sentence-count",
            StatName::ParagraphCount => "paragraph-count",
            StatName::LongestWord => "longest-word",
        }
    }

    /// Human readable label: `wordCount` becomes `Word count`
    pub fn readable(&self) -> String {
        let mut out = String::with_capacity(self.as_str().len() + 2);
        for (i, ch) in self.as_str().chars().enumerate() {
            if i == 0 {
                out.extend(ch.to_uppercase());
            } else if ch.is_uppercase() {
                out.push(' ');
                out.extend(ch.to_lowercase());
            } else {
                out.push(ch);
            }
        }
        out
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatName {
    type Err = UnknownStat;

    /// Accepts both the slug and the camelCase field name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatName::ALL
            .into_iter()
            .find(|stat| stat.slug() == s || stat.as_str() == s)
            .ok_or_else(|| UnknownStat(s.to_string()))
    }
}
