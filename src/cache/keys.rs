use std::fmt;

use crate::analysis::StatName;

/// Every key template the text service reads or writes.
///
/// Both the read paths and the invalidation path format keys through this
/// type, so a new template only has to be added here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// `texts:all`
    AllTexts,
    /// `text:{id}:owner`
    OwnerView(i64),
    /// `text:{id}:viewer`
    ViewerView(i64),
    /// `text:{id}:{statName}`
    Statistic(i64, StatName),
}

impl CacheKey {
    /// View key for a document, chosen by whether the viewer owns it
    pub fn view(text_id: i64, is_owner: bool) -> Self {
        if is_owner {
            CacheKey::OwnerView(text_id)
        } else {
            CacheKey::ViewerView(text_id)
        }
    }

    /// All keys derived from a single document
    pub fn document_keys(text_id: i64) -> Vec<CacheKey> {
        let mut keys = Vec::with_capacity(2 + StatName::ALL.len());
        keys.push(CacheKey::OwnerView(text_id));
        keys.push(CacheKey::ViewerView(text_id));
        keys.extend(
            StatName::ALL
                .into_iter()
                .map(|stat| CacheKey::Statistic(text_id, stat)),
        );
        keys
    }

    /// Keys to drop after a document is updated or deleted
    pub fn invalidation_set(text_id: i64) -> Vec<String> {
        let mut keys = CacheKey::document_keys(text_id);
        keys.push(CacheKey::AllTexts);
        keys.into_iter().map(|k| k.to_string()).collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllTexts => f.write_str("texts:all"),
            CacheKey::OwnerView(id) => write!(f, "text:{}:owner", id),
            CacheKey::ViewerView(id) => write!(f, "text:{}:viewer", id),
            CacheKey::Statistic(id, stat) => write!(f, "text:{}:{}", id, stat.as_str()),
        }
    }
}
