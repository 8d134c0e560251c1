//! Analysis service tests
//!
//! Exercise the read-through cache, ownership rules and invalidation
//! directly against `TextService`, without the HTTP layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use text_analyzer::cache::{CacheError, CacheKey, CacheResult, CacheStore, MemoryCache};
use text_analyzer::service::{TextInput, TextService, TextServiceConfig, TextView};
use text_analyzer::{AppError, MemoryStore, StatName};
use tokio_test::{assert_err, assert_ok};

const OWNER: i64 = 1;
const STRANGER: i64 = 2;
const SAMPLE: &str = "Hello world! This is a test. It has two sentences.";

fn service_with(cache: Arc<dyn CacheStore>, config: TextServiceConfig) -> TextService {
    TextService::new(Arc::new(MemoryStore::new()), cache, config)
}

fn setup() -> (TextService, MemoryCache) {
    let cache = MemoryCache::new();
    let service = service_with(Arc::new(cache.clone()), TextServiceConfig::default());
    (service, cache)
}

fn input(title: Option<&str>, content: &str) -> TextInput {
    TextInput {
        title: title.map(str::to_string),
        content: Some(content.to_string()),
    }
}

async fn cached(cache: &MemoryCache, key: CacheKey) -> Option<Value> {
    cache.get(&key.to_string()).await.unwrap()
}

/// Fill every per-document key plus the listing
async fn warm(service: &TextService, id: i64) {
    assert_ok!(service.list_all().await);
    assert_ok!(service.get_by_id(id, OWNER).await);
    assert_ok!(service.get_by_id(id, STRANGER).await);
    for stat in StatName::ALL {
        assert_ok!(service.get_statistic(id, stat, OWNER).await);
    }
}

/// A cache whose every operation fails
#[derive(Default)]
struct BrokenCache {
    calls: AtomicUsize,
}

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn flush(&self) -> CacheResult<()> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

// ============================================================================
// Create / validation
// ============================================================================

#[tokio::test]
async fn test_create_assigns_owner() {
    let (service, _cache) = setup();
    let text = assert_ok!(service.create(input(Some("Greeting"), SAMPLE), OWNER).await);

    assert_eq!(text.owner_id, OWNER);
    assert_eq!(text.title.as_deref(), Some("Greeting"));
    assert_eq!(text.content, SAMPLE);
}

#[tokio::test]
async fn test_create_requires_content() {
    let (service, _cache) = setup();

    let err = assert_err!(service.create(TextInput::default(), OWNER).await);
    assert!(matches!(err, AppError::MissingField(_)));
    assert_eq!(err.to_string(), "Content is required");

    let err = assert_err!(service.create(input(None, "   "), OWNER).await);
    assert!(matches!(err, AppError::MissingField(_)));
}

#[tokio::test]
async fn test_create_title_length() {
    let (service, _cache) = setup();

    let err = assert_err!(service.create(input(Some("ab"), SAMPLE), OWNER).await);
    assert_eq!(err.to_string(), "Title must be between 3 and 255 characters");

    let long = "x".repeat(256);
    assert_err!(service.create(input(Some(&long), SAMPLE), OWNER).await);

    assert_ok!(service.create(input(Some(&"x".repeat(255)), SAMPLE), OWNER).await);
}

#[tokio::test]
async fn test_require_title_flag() {
    let config = TextServiceConfig {
        require_title: true,
        ..TextServiceConfig::default()
    };
    let service = service_with(Arc::new(MemoryCache::new()), config);

    let err = assert_err!(service.create(input(None, SAMPLE), OWNER).await);
    assert_eq!(err.to_string(), "Title is required");
}

#[tokio::test]
async fn test_create_invalidates_listing() {
    let (service, cache) = setup();
    assert_ok!(service.create(input(None, "first"), OWNER).await);

    let listing = assert_ok!(service.list_all().await);
    assert_eq!(listing.value.len(), 1);
    assert!(cached(&cache, CacheKey::AllTexts).await.is_some());

    assert_ok!(service.create(input(None, "second"), OWNER).await);
    assert!(cached(&cache, CacheKey::AllTexts).await.is_none());

    let listing = assert_ok!(service.list_all().await);
    assert!(!listing.from_cache);
    assert_eq!(listing.value.len(), 2);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_listing_is_cached_between_writes() {
    let (service, _cache) = setup();
    assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    let first = assert_ok!(service.list_all().await);
    let second = assert_ok!(service.list_all().await);

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.value, second.value);
}

#[tokio::test]
async fn test_owner_sees_report() {
    let (service, _cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    let view = assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(!view.from_cache);
    let report = view.value.report().expect("owner view carries a report");
    assert_eq!(report.word_count, 10);
    assert_eq!(report.sentence_count, 2);
    assert_eq!(report.paragraph_count, 1);
    assert_eq!(report.longest_word, "sentences");

    let json = serde_json::to_value(&view.value).unwrap();
    assert!(json.get("report").is_some());
    assert_eq!(json["text"]["id"], json!(text.id));
}

#[tokio::test]
async fn test_non_owner_never_sees_report() {
    let (service, _cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    // Owner first so the owner entry is cached before the viewer asks
    assert_ok!(service.get_by_id(text.id, OWNER).await);

    for _ in 0..2 {
        let view = assert_ok!(service.get_by_id(text.id, STRANGER).await);
        assert!(matches!(view.value, TextView::Viewer(_)));
        let json = serde_json::to_value(&view.value).unwrap();
        assert!(json.get("report").is_none());
        assert_eq!(json["content"], json!(SAMPLE));
    }
}

#[tokio::test]
async fn test_views_are_cached_per_role() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(cached(&cache, CacheKey::OwnerView(text.id)).await.is_some());
    assert!(cached(&cache, CacheKey::ViewerView(text.id)).await.is_none());

    let again = assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(again.from_cache);
    assert!(again.value.report().is_some());
}

#[tokio::test]
async fn test_get_statistic() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    let first = assert_ok!(service.get_statistic(text.id, StatName::WordCount, STRANGER).await);
    assert!(!first.from_cache);
    assert_eq!(Value::Object(first.value.clone()), json!({"wordCount": 10}));

    let second = assert_ok!(service.get_statistic(text.id, StatName::WordCount, OWNER).await);
    assert!(second.from_cache);
    assert_eq!(second.value, first.value);

    let longest = assert_ok!(service.get_statistic(text.id, StatName::LongestWord, OWNER).await);
    assert_eq!(Value::Object(longest.value), json!({"longestWord": "sentences"}));

    assert_eq!(
        cached(&cache, CacheKey::Statistic(text.id, StatName::WordCount)).await,
        Some(json!({"wordCount": 10}))
    );
}

#[tokio::test]
async fn test_owner_only_statistics_flag() {
    let config = TextServiceConfig {
        owner_only_statistics: true,
        ..TextServiceConfig::default()
    };
    let service = service_with(Arc::new(MemoryCache::new()), config);
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    assert_ok!(service.get_statistic(text.id, StatName::SentenceCount, OWNER).await);

    // Even with the owner's entry cached, others are refused
    let err = assert_err!(
        service
            .get_statistic(text.id, StatName::SentenceCount, STRANGER)
            .await
    );
    assert!(matches!(err, AppError::Forbidden(_)));
}

// ============================================================================
// Writes and invalidation
// ============================================================================

#[tokio::test]
async fn test_update_invalidates_every_derived_key() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);
    warm(&service, text.id).await;
    assert_eq!(cache.len(), 8);

    let updated = assert_ok!(
        service
            .update(text.id, input(None, "Short one."), OWNER)
            .await
    );
    assert_eq!(updated.content, "Short one.");

    assert!(cached(&cache, CacheKey::AllTexts).await.is_none());
    for key in CacheKey::document_keys(text.id) {
        assert!(cached(&cache, key).await.is_none(), "{} survived update", key);
    }

    // Fresh reads reflect the new content
    let view = assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(!view.from_cache);
    assert_eq!(view.value.report().unwrap().word_count, 2);
}

#[tokio::test]
async fn test_update_keeps_title_when_omitted() {
    let (service, _cache) = setup();
    let text = assert_ok!(service.create(input(Some("Keep me"), SAMPLE), OWNER).await);

    let updated = assert_ok!(service.update(text.id, input(None, "New body"), OWNER).await);
    assert_eq!(updated.title.as_deref(), Some("Keep me"));

    let updated = assert_ok!(
        service
            .update(text.id, input(Some("Renamed"), "New body"), OWNER)
            .await
    );
    assert_eq!(updated.title.as_deref(), Some("Renamed"));
}

#[tokio::test]
async fn test_delete_invalidates_every_derived_key() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);
    warm(&service, text.id).await;

    assert_ok!(service.delete(text.id, OWNER).await);
    assert!(cache.is_empty());

    let err = assert_err!(service.get_by_id(text.id, OWNER).await);
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(Some("Mine"), SAMPLE), OWNER).await);
    warm(&service, text.id).await;

    let err = assert_err!(
        service
            .update(text.id, input(None, "hijacked"), STRANGER)
            .await
    );
    assert!(matches!(err, AppError::Forbidden(_)));

    // ownership is checked before the body is validated
    let err = assert_err!(service.update(text.id, TextInput::default(), STRANGER).await);
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = assert_err!(service.delete(text.id, STRANGER).await);
    assert!(matches!(err, AppError::Forbidden(_)));

    // Document and cache untouched
    assert_eq!(cache.len(), 8);
    let view = assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(view.from_cache);
    assert_eq!(view.value.text().content, SAMPLE);
}

#[tokio::test]
async fn test_missing_text_is_not_found_without_cache_writes() {
    let (service, cache) = setup();

    let err = assert_err!(service.get_by_id(42, OWNER).await);
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Text not found");

    assert_err!(service.update(42, input(None, SAMPLE), OWNER).await);
    // an empty body still reports the missing text first
    let err = assert_err!(service.update(42, TextInput::default(), OWNER).await);
    assert!(matches!(err, AppError::NotFound(_)));
    assert_err!(service.delete(42, OWNER).await);
    for stat in StatName::ALL {
        let err = assert_err!(service.get_statistic(42, stat, OWNER).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    assert!(cache.is_empty());
}

// ============================================================================
// Cache failures
// ============================================================================

#[tokio::test]
async fn test_broken_cache_degrades_to_misses() {
    let cache = Arc::new(BrokenCache::default());
    let service = service_with(cache.clone(), TextServiceConfig::default());

    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    for _ in 0..2 {
        let view = assert_ok!(service.get_by_id(text.id, OWNER).await);
        assert!(!view.from_cache);
        assert_eq!(view.value.report().unwrap().word_count, 10);

        let stat = assert_ok!(service.get_statistic(text.id, StatName::WordCount, OWNER).await);
        assert!(!stat.from_cache);
    }

    let listing = assert_ok!(service.list_all().await);
    assert_eq!(listing.value.len(), 1);

    assert_ok!(service.update(text.id, input(None, "changed"), OWNER).await);
    assert_ok!(service.delete(text.id, OWNER).await);

    assert!(cache.calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_undecodable_entry_is_a_miss() {
    let (service, cache) = setup();
    let text = assert_ok!(service.create(input(None, SAMPLE), OWNER).await);

    cache
        .set(
            &CacheKey::OwnerView(text.id).to_string(),
            json!("garbage"),
            None,
        )
        .await
        .unwrap();

    let view = assert_ok!(service.get_by_id(text.id, OWNER).await);
    assert!(!view.from_cache);
    assert!(view.value.report().is_some());
}
