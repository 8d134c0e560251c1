//! Text CRUD with read-through caching of analysis results.
//!
//! Reads go cache first; on a miss the document is loaded, analyzed and the
//! result stored. Writes commit to the repository first and then drop every
//! cache key derived from the document before reporting success.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::{analyze, StatName, StatisticsRecord};
use crate::cache::{CacheKey, CacheStore};
use crate::error::{AppError, AppResult};
use crate::storage::{NewText, Text, TextChanges, TextRepository};

pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 255;

#[derive(Debug, Clone)]
pub struct TextServiceConfig {
    /// TTL for per-document entries
    pub cache_ttl: Duration,
    /// TTL for the `texts:all` listing
    pub list_cache_ttl: Duration,
    pub require_title: bool,
    /// Apply the owner/viewer split to single-statistic reads as well
    pub owner_only_statistics: bool,
}

impl Default for TextServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            list_cache_ttl: Duration::from_secs(60),
            require_title: false,
            owner_only_statistics: false,
        }
    }
}

/// Fields supplied by a caller when creating or updating a text
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// A payload together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub from_cache: bool,
}

impl<T> Cached<T> {
    fn hit(value: T) -> Self {
        Self {
            value,
            from_cache: true,
        }
    }

    fn miss(value: T) -> Self {
        Self {
            value,
            from_cache: false,
        }
    }
}

/// What a viewer gets back for a single text.
///
/// Owners see the statistics report, everybody else the bare text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextView {
    Owner { report: StatisticsRecord, text: Text },
    Viewer(Text),
}

impl TextView {
    pub fn text(&self) -> &Text {
        match self {
            TextView::Owner { text, .. } => text,
            TextView::Viewer(text) => text,
        }
    }

    pub fn report(&self) -> Option<&StatisticsRecord> {
        match self {
            TextView::Owner { report, .. } => Some(report),
            TextView::Viewer(_) => None,
        }
    }
}

pub struct TextService {
    texts: Arc<dyn TextRepository>,
    cache: Arc<dyn CacheStore>,
    config: TextServiceConfig,
}

impl TextService {
    pub fn new(
        texts: Arc<dyn TextRepository>,
        cache: Arc<dyn CacheStore>,
        config: TextServiceConfig,
    ) -> Self {
        Self {
            texts,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &TextServiceConfig {
        &self.config
    }

    pub async fn create(&self, input: TextInput, owner_id: i64) -> AppResult<Text> {
        let (title, content) = Self::validate(input, self.config.require_title)?;

        let text = self
            .texts
            .create(NewText {
                title,
                content,
                owner_id,
            })
            .await?;
        tracing::info!(text_id = text.id, owner_id, "Text created");

        // the listing changed; per-document entries are filled lazily
        self.invalidate(vec![CacheKey::AllTexts.to_string()]).await;

        Ok(text)
    }

    pub async fn list_all(&self) -> AppResult<Cached<Vec<Text>>> {
        let key = CacheKey::AllTexts;
        if let Some(texts) = self.cache_read::<Vec<Text>>(&key).await {
            return Ok(Cached::hit(texts));
        }

        let texts = self.texts.find_all().await?;
        self.cache_write(&key, &texts, self.config.list_cache_ttl).await;
        Ok(Cached::miss(texts))
    }

    pub async fn get_by_id(&self, id: i64, viewer_id: i64) -> AppResult<Cached<TextView>> {
        let text = self.load(id).await?;
        let is_owner = text.is_owned_by(viewer_id);
        let key = CacheKey::view(id, is_owner);

        if let Some(view) = self.cache_read::<TextView>(&key).await {
            return Ok(Cached::hit(view));
        }

        let view = if is_owner {
            TextView::Owner {
                report: analyze(&text.content),
                text,
            }
        } else {
            TextView::Viewer(text)
        };
        self.cache_write(&key, &view, self.config.cache_ttl).await;
        Ok(Cached::miss(view))
    }

    pub async fn update(&self, id: i64, input: TextInput, caller_id: i64) -> AppResult<Text> {
        let existing = self.load(id).await?;
        Self::ensure_owner(&existing, caller_id)?;

        // a missing title keeps the stored one
        let (title, content) = Self::validate(input, false)?;

        let text = self
            .texts
            .update(id, TextChanges { title, content })
            .await?
            .ok_or_else(|| AppError::NotFound("Text".to_string()))?;
        tracing::info!(text_id = id, "Text updated");

        self.invalidate(CacheKey::invalidation_set(id)).await;
        Ok(text)
    }

    pub async fn delete(&self, id: i64, caller_id: i64) -> AppResult<()> {
        let existing = self.load(id).await?;
        Self::ensure_owner(&existing, caller_id)?;

        if !self.texts.delete(id).await? {
            return Err(AppError::NotFound("Text".to_string()));
        }
        tracing::info!(text_id = id, "Text deleted");

        self.invalidate(CacheKey::invalidation_set(id)).await;
        Ok(())
    }

    /// Single statistic as `{ statName: value }`.
    pub async fn get_statistic(
        &self,
        id: i64,
        stat: StatName,
        viewer_id: i64,
    ) -> AppResult<Cached<Map<String, Value>>> {
        if self.config.owner_only_statistics {
            let text = self.load(id).await?;
            if !text.is_owned_by(viewer_id) {
                return Err(AppError::Forbidden(
                    "Only the owner can view statistics for this text".to_string(),
                ));
            }
        }

        let key = CacheKey::Statistic(id, stat);
        if let Some(entry) = self.cache_read::<Map<String, Value>>(&key).await {
            return Ok(Cached::hit(entry));
        }

        let text = self.load(id).await?;
        let value = serde_json::to_value(analyze(&text.content).get(stat))?;
        let mut entry = Map::new();
        entry.insert(stat.as_str().to_string(), value);

        self.cache_write(&key, &entry, self.config.cache_ttl).await;
        Ok(Cached::miss(entry))
    }

    async fn load(&self, id: i64) -> AppResult<Text> {
        self.texts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Text".to_string()))
    }

    fn ensure_owner(text: &Text, caller_id: i64) -> AppResult<()> {
        if text.is_owned_by(caller_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not allowed to modify this text".to_string(),
            ))
        }
    }

    fn validate(input: TextInput, title_required: bool) -> AppResult<(Option<String>, String)> {
        let content = input
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::MissingField("Content".to_string()))?;

        let title = input.title.map(|t| t.trim().to_string());
        match &title {
            None if title_required => return Err(AppError::MissingField("Title".to_string())),
            Some(t) if t.is_empty() && title_required => {
                return Err(AppError::MissingField("Title".to_string()))
            }
            Some(t) => {
                let len = t.chars().count();
                if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
                    return Err(AppError::BadRequest(format!(
                        "Title must be between {} and {} characters",
                        TITLE_MIN_CHARS, TITLE_MAX_CHARS
                    )));
                }
            }
            None => {}
        }

        Ok((title, content))
    }

    // Cache failures and undecodable entries are treated as misses.
    async fn cache_read<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let key = key.to_string();
        match self.cache.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => {
                    tracing::debug!(key = %key, "Cache hit");
                    Some(decoded)
                }
                Err(e) => {
                    tracing::warn!(key = %key, "Discarding undecodable cache entry: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, "Cache read failed, treating as miss: {}", e);
                None
            }
        }
    }

    async fn cache_write<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let key = key.to_string();
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(key = %key, "Skipping cache write: {}", e);
                return;
            }
        };
        if let Err(e) = self.cache.set(&key, value, Some(ttl)).await {
            tracing::warn!(key = %key, "Cache write failed: {}", e);
        }
    }

    async fn invalidate(&self, keys: Vec<String>) {
        if let Err(e) = self.cache.delete_all(&keys).await {
            tracing::warn!(keys = ?keys, "Cache invalidation failed: {}", e);
        }
    }
}
