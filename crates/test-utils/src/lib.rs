//! Tuskfish test utilities.
//!
//! Helpers for integration testing: content fixtures, an in-memory
//! content store that records every criteria it receives, and
//! assertion utilities for JSON payloads.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tuskfish_kernel::content::{Content, ContentStore, ContentType};
use tuskfish_kernel::criteria::{ConditionItem, ConditionSet, ConditionValue, Operator};
use tuskfish_kernel::error::HandlerResult;

/// Create an online test record with default values.
pub fn test_content(kind: ContentType, title: &str) -> TestContent {
    TestContent {
        content: Content {
            id: 1,
            content_type: kind.as_str().to_string(),
            title: title.to_string(),
            teaser: format!("{title} teaser"),
            description: format!("{title} description"),
            media: None,
            format: None,
            file_size: None,
            creator: None,
            image: None,
            caption: None,
            date: None,
            parent: None,
            language: "en".to_string(),
            rights: None,
            publisher: None,
            online_status: 1,
            submission_time: 1_700_000_000,
            last_updated: 1_700_000_000,
            expires_on: None,
            counter: 0,
            meta_title: None,
            meta_description: None,
            seo: None,
        },
        tags: Vec::new(),
    }
}

/// A content record builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestContent {
    pub content: Content,
    pub tags: Vec<i64>,
}

impl TestContent {
    /// Set a custom ID.
    pub fn with_id(mut self, id: i64) -> Self {
        self.content.id = id;
        self
    }

    /// Set as offline.
    pub fn offline(mut self) -> Self {
        self.content.online_status = 0;
        self
    }

    /// Attach a media file.
    pub fn with_media(mut self, media: &str, format: &str, file_size: i64) -> Self {
        self.content.media = Some(media.to_string());
        self.content.format = Some(format.to_string());
        self.content.file_size = Some(file_size);
        self
    }

    /// Set the creator.
    pub fn with_creator(mut self, creator: &str) -> Self {
        self.content.creator = Some(creator.to_string());
        self
    }

    /// Set the publication date.
    pub fn with_date(mut self, date: &str) -> Self {
        self.content.date = Some(date.to_string());
        self
    }

    /// Set the submission timestamp.
    pub fn submitted_at(mut self, timestamp: i64) -> Self {
        self.content.submission_time = timestamp;
        self
    }

    /// Tag the record.
    pub fn with_tag(mut self, tag_id: i64) -> Self {
        self.tags.push(tag_id);
        self
    }

    /// Finish building.
    pub fn build(self) -> Content {
        self.content
    }
}

/// In-memory content store.
///
/// Evaluates `=`, `!=` and `IN` on the `id`, `type` and `online_status`
/// columns and honours type restrictions, tag filters, offset and limit. Other predicates
/// match everything. Every criteria passed in is recorded.
#[derive(Default)]
pub struct RecordingStore {
    records: Mutex<Vec<TestContent>>,
    seen: Mutex<Vec<ConditionSet>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with records.
    pub fn with_records(records: impl IntoIterator<Item = TestContent>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every criteria received, oldest first.
    pub fn seen(&self) -> Vec<ConditionSet> {
        lock(&self.seen).clone()
    }

    /// The most recent criteria received.
    pub fn last_seen(&self) -> Option<ConditionSet> {
        lock(&self.seen).last().cloned()
    }

    /// Current copy of a stored record.
    pub fn record(&self, id: i64) -> Option<Content> {
        lock(&self.records)
            .iter()
            .find(|r| r.content.id == id)
            .map(|r| r.content.clone())
    }

    fn matching(&self, criteria: &ConditionSet) -> Vec<Content> {
        lock(&self.seen).push(criteria.clone());

        lock(&self.records)
            .iter()
            .filter(|r| matches(r, criteria))
            .map(|r| r.content.clone())
            .collect()
    }

    fn page(&self, criteria: &ConditionSet) -> Vec<Content> {
        let offset = usize::try_from(criteria.offset()).unwrap_or(usize::MAX);
        let rows = self.matching(criteria).into_iter().skip(offset);

        match usize::try_from(criteria.limit()) {
            Ok(0) | Err(_) => rows.collect(),
            Ok(limit) => rows.take(limit).collect(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn matches(record: &TestContent, criteria: &ConditionSet) -> bool {
    if criteria
        .type_filter()
        .is_some_and(|kind| kind != record.content.content_type)
    {
        return false;
    }

    let tags = criteria.tags();
    if !tags.is_empty() && !record.tags.iter().any(|t| tags.contains(t)) {
        return false;
    }

    let groups = criteria.or_groups();
    groups.is_empty()
        || groups
            .iter()
            .any(|group| group.iter().all(|item| item_matches(&record.content, item)))
}

fn item_matches(content: &Content, item: &ConditionItem) -> bool {
    let field = match item.column().to_ascii_lowercase().as_str() {
        "id" => ConditionValue::Int(content.id),
        "type" => ConditionValue::Text(content.content_type.clone()),
        "online_status" => ConditionValue::Int(i64::from(content.online_status)),
        _ => return true,
    };

    match item.operator() {
        Operator::Equals => &field == item.value(),
        Operator::NotEquals => &field != item.value(),
        Operator::In => item.value().elements().contains(&field),
        Operator::NotIn => !item.value().elements().contains(&field),
        _ => true,
    }
}

#[async_trait]
impl ContentStore for RecordingStore {
    async fn fetch(&self, criteria: &ConditionSet) -> HandlerResult<Vec<Content>> {
        Ok(self.page(criteria))
    }

    async fn count(&self, criteria: &ConditionSet) -> HandlerResult<i64> {
        let total = self.matching(criteria).len();
        Ok(i64::try_from(total).unwrap_or(i64::MAX))
    }

    async fn fetch_list(&self, criteria: &ConditionSet) -> HandlerResult<Vec<(i64, String)>> {
        Ok(self
            .page(criteria)
            .into_iter()
            .map(|c| (c.id, c.title))
            .collect())
    }

    async fn distinct_types(&self) -> HandlerResult<Vec<String>> {
        let mut types: Vec<String> = lock(&self.records)
            .iter()
            .map(|r| r.content.content_type.clone())
            .collect();
        types.sort();
        types.dedup();
        Ok(types)
    }

    async fn increment_counter(&self, id: i64) -> HandlerResult<bool> {
        let mut records = lock(&self.records);
        Ok(match records.iter_mut().find(|r| r.content.id == id) {
            Some(record) => {
                record.content.counter += 1;
                true
            }
            None => false,
        })
    }

    async fn toggle_online_status(&self, id: i64) -> HandlerResult<bool> {
        let mut records = lock(&self.records);
        Ok(match records.iter_mut().find(|r| r.content.id == id) {
            Some(record) => {
                record.content.online_status = 1 - record.content.online_status;
                true
            }
            None => false,
        })
    }
}

/// Tally of records per type, for quick assertions on listings.
pub fn count_by_type(items: &[serde_json::Value]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for item in items {
        if let Some(kind) = item.get("type").and_then(|t| t.as_str()) {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value lacks a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to lack key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
