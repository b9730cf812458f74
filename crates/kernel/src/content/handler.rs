//! Content handlers.
//!
//! [`ContentHandler`] runs condition sets against a [`ContentStore`] and
//! hydrates the rows. [`TypedHandler`] is the per-type façade: it swaps
//! whatever type filter the caller supplied for its own before delegating.

use std::sync::Arc;

use tracing::{debug, warn};

use super::model::{Content, ContentType, TypedContent};
use super::store::ContentStore;
use super::type_filter::normalize_type;
use crate::criteria::{ConditionSet, CriteriaFactory, Operator};
use crate::error::HandlerResult;

/// Column holding the online flag.
const ONLINE_COLUMN: &str = "online_status";

/// Generic handler over every content type.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct ContentHandler {
    inner: Arc<ContentHandlerInner>,
}

struct ContentHandlerInner {
    store: Arc<dyn ContentStore>,
    factory: CriteriaFactory,
}

impl ContentHandler {
    /// Create a handler using the default validator.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_factory(store, CriteriaFactory::default())
    }

    /// Create a handler whose fresh condition sets come from `factory`.
    pub fn with_factory(store: Arc<dyn ContentStore>, factory: CriteriaFactory) -> Self {
        Self {
            inner: Arc::new(ContentHandlerInner { store, factory }),
        }
    }

    /// A fresh, empty condition set.
    pub fn criteria(&self) -> ConditionSet {
        self.inner.factory.criteria()
    }

    /// Per-type façade sharing this handler's store.
    pub fn typed(&self, kind: ContentType) -> TypedHandler {
        TypedHandler {
            kind,
            generic: self.clone(),
        }
    }

    /// Fetch and hydrate records matching `criteria` (all records if none).
    ///
    /// Rows whose type column names no known type are skipped.
    pub async fn get_objects(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<TypedContent>> {
        let criteria = criteria.unwrap_or_else(|| self.criteria());
        let rows = self.inner.store.fetch(&criteria).await?;
        debug!(rows = rows.len(), "content fetched");
        Ok(hydrate(rows))
    }

    /// Count records matching `criteria` (all records if none).
    pub async fn get_count(&self, criteria: Option<ConditionSet>) -> HandlerResult<i64> {
        let criteria = criteria.unwrap_or_else(|| self.criteria());
        self.inner.store.count(&criteria).await
    }

    /// `(id, title)` pairs matching `criteria`, for select boxes.
    pub async fn get_list(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<(i64, String)>> {
        let criteria = criteria.unwrap_or_else(|| self.criteria());
        self.inner.store.fetch_list(&criteria).await
    }

    /// Only online records matching `criteria`.
    pub async fn get_online_objects(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<TypedContent>> {
        let criteria = self.online(criteria)?;
        self.get_objects(Some(criteria)).await
    }

    /// Count of online records matching `criteria`.
    pub async fn get_online_count(&self, criteria: Option<ConditionSet>) -> HandlerResult<i64> {
        let criteria = self.online(criteria)?;
        self.get_count(Some(criteria)).await
    }

    /// A single record by ID.
    pub async fn get_object(&self, id: i64) -> HandlerResult<Option<TypedContent>> {
        let mut criteria = self.criteria();
        criteria.push("id", id, Operator::Equals)?;
        criteria.set_limit(1)?;

        let rows = self.inner.store.fetch(&criteria).await?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(TypedContent::try_from(row)?)),
            None => Ok(None),
        }
    }

    /// Content types that have at least one record.
    pub async fn get_types(&self) -> HandlerResult<Vec<ContentType>> {
        let names = self.inner.store.distinct_types().await?;
        Ok(names
            .into_iter()
            .filter_map(|name| match name.parse() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    warn!(error = %e, "ignoring unknown type in content table");
                    None
                }
            })
            .collect())
    }

    /// Increment a record's view counter. Returns false if it does not exist.
    pub async fn update_counter(&self, id: i64) -> HandlerResult<bool> {
        self.inner.store.increment_counter(id).await
    }

    /// Flip a record between online and offline. Returns false if it does not exist.
    pub async fn toggle_online_status(&self, id: i64) -> HandlerResult<bool> {
        let changed = self.inner.store.toggle_online_status(id).await?;
        if changed {
            debug!(id, "online status toggled");
        }
        Ok(changed)
    }

    fn online(&self, criteria: Option<ConditionSet>) -> HandlerResult<ConditionSet> {
        let mut criteria = criteria.unwrap_or_else(|| self.criteria());
        criteria.push(ONLINE_COLUMN, 1, Operator::Equals)?;
        Ok(criteria)
    }
}

/// Handler restricted to one content type.
#[derive(Clone)]
pub struct TypedHandler {
    kind: ContentType,
    generic: ContentHandler,
}

impl TypedHandler {
    pub fn kind(&self) -> ContentType {
        self.kind
    }

    /// Swap any caller-supplied type filter for this handler's own.
    pub fn prepare(&self, criteria: Option<ConditionSet>) -> HandlerResult<ConditionSet> {
        let criteria = criteria.unwrap_or_else(|| self.generic.criteria());
        if let Some(previous) = criteria.content_type()
            && previous != self.kind.as_str()
        {
            debug!(previous, kind = %self.kind, "replacing type filter");
        }
        Ok(normalize_type(criteria, self.kind)?)
    }

    pub async fn get_objects(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<TypedContent>> {
        let criteria = self.prepare(criteria)?;
        self.generic.get_objects(Some(criteria)).await
    }

    pub async fn get_count(&self, criteria: Option<ConditionSet>) -> HandlerResult<i64> {
        let criteria = self.prepare(criteria)?;
        self.generic.get_count(Some(criteria)).await
    }

    pub async fn get_list(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<(i64, String)>> {
        let criteria = self.prepare(criteria)?;
        self.generic.get_list(Some(criteria)).await
    }

    pub async fn get_online_objects(
        &self,
        criteria: Option<ConditionSet>,
    ) -> HandlerResult<Vec<TypedContent>> {
        let criteria = self.prepare(criteria)?;
        self.generic.get_online_objects(Some(criteria)).await
    }

    pub async fn get_online_count(&self, criteria: Option<ConditionSet>) -> HandlerResult<i64> {
        let criteria = self.prepare(criteria)?;
        self.generic.get_online_count(Some(criteria)).await
    }
}

fn hydrate(rows: Vec<Content>) -> Vec<TypedContent> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match TypedContent::try_from(row) {
                Ok(content) => Some(content),
                Err(e) => {
                    warn!(id, error = %e, "skipping content row with unknown type");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{ConditionItem, CriteriaError};
    use crate::error::{AppError, HandlerError};
    use axum::response::IntoResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Store that records the last condition set and serves fixed rows.
    #[derive(Default)]
    struct FakeStore {
        rows: Vec<Content>,
        seen: Mutex<Vec<ConditionSet>>,
    }

    impl FakeStore {
        fn last(&self) -> ConditionSet {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl ContentStore for FakeStore {
        async fn fetch(&self, criteria: &ConditionSet) -> HandlerResult<Vec<Content>> {
            self.seen.lock().unwrap().push(criteria.clone());
            Ok(self.rows.clone())
        }

        async fn count(&self, criteria: &ConditionSet) -> HandlerResult<i64> {
            self.seen.lock().unwrap().push(criteria.clone());
            Ok(self.rows.len() as i64)
        }

        async fn fetch_list(&self, criteria: &ConditionSet) -> HandlerResult<Vec<(i64, String)>> {
            self.seen.lock().unwrap().push(criteria.clone());
            Ok(self.rows.iter().map(|r| (r.id, r.title.clone())).collect())
        }

        async fn distinct_types(&self) -> HandlerResult<Vec<String>> {
            let mut types: Vec<String> = self.rows.iter().map(|r| r.content_type.clone()).collect();
            types.sort();
            types.dedup();
            Ok(types)
        }

        async fn increment_counter(&self, id: i64) -> HandlerResult<bool> {
            Ok(self.rows.iter().any(|r| r.id == id))
        }

        async fn toggle_online_status(&self, id: i64) -> HandlerResult<bool> {
            Ok(self.rows.iter().any(|r| r.id == id))
        }
    }

    fn row(id: i64, content_type: &str) -> Content {
        Content {
            id,
            content_type: content_type.to_string(),
            title: format!("Item {id}"),
            teaser: String::new(),
            description: String::new(),
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
            submission_time: 0,
            last_updated: 0,
            expires_on: None,
            counter: 0,
            meta_title: None,
            meta_description: None,
            seo: None,
        }
    }

    fn handler(rows: Vec<Content>) -> (Arc<FakeStore>, ContentHandler) {
        let store = Arc::new(FakeStore {
            rows,
            ..Default::default()
        });
        let handler = ContentHandler::new(store.clone());
        (store, handler)
    }

    #[tokio::test]
    async fn typed_handler_replaces_caller_type() {
        let (store, handler) = handler(vec![row(1, "video")]);
        let mut criteria = handler.criteria();
        criteria.set_type("image").unwrap();

        let objects = handler
            .typed(ContentType::Video)
            .get_objects(Some(criteria))
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);

        let seen = store.last();
        assert!(!seen.items().iter().any(ConditionItem::is_type_predicate));
        assert_eq!(seen.type_filter(), Some("video"));
    }

    #[tokio::test]
    async fn typed_handler_defaults_to_empty_criteria() {
        let (store, handler) = handler(vec![]);
        let count = handler.typed(ContentType::Tag).get_count(None).await.unwrap();
        assert_eq!(count, 0);

        let seen = store.last();
        assert!(seen.is_empty());
        assert_eq!(seen.content_type(), Some("tag"));
    }

    #[tokio::test]
    async fn generic_handler_passes_criteria_untouched() {
        let (store, handler) = handler(vec![row(1, "article"), row(2, "image")]);
        let mut criteria = handler.criteria();
        criteria.set_limit(2).unwrap();

        let objects = handler.get_objects(Some(criteria)).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].kind(), ContentType::Image);
        assert!(store.last().is_empty());
        assert_eq!(store.last().limit(), 2);
    }

    #[tokio::test]
    async fn unknown_rows_are_skipped() {
        let (_, handler) = handler(vec![row(1, "article"), row(2, "podcast")]);
        let objects = handler.get_objects(None).await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].id(), 1);
    }

    #[tokio::test]
    async fn online_listing_adds_status_filter() {
        let (store, handler) = handler(vec![row(1, "audio")]);
        handler
            .typed(ContentType::Audio)
            .get_online_objects(None)
            .await
            .unwrap();

        let seen = store.last();
        let columns: Vec<_> = seen.items().iter().map(ConditionItem::column).collect();
        assert_eq!(columns, vec!["online_status"]);
        assert_eq!(seen.type_filter(), Some("audio"));
    }

    #[tokio::test]
    async fn get_object_by_id() {
        let (store, handler) = handler(vec![row(9, "download")]);
        let object = handler.get_object(9).await.unwrap().unwrap();
        assert_eq!(object.kind(), ContentType::Download);

        let seen = store.last();
        assert_eq!(seen.items()[0].column(), "id");
        assert_eq!(seen.limit(), 1);
    }

    #[tokio::test]
    async fn get_object_with_unknown_stored_type_is_a_server_error() {
        let (_, handler) = handler(vec![row(4, "bogus")]);
        let err = handler.get_object(4).await.unwrap_err();
        assert!(matches!(err, HandlerError::UnknownContentType(_)));

        let status = AppError::from(err).into_response().status();
        assert_eq!(status, axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn get_types_skips_unknown() {
        let (_, handler) = handler(vec![row(1, "video"), row(2, "bogus"), row(3, "article")]);
        let types = handler.get_types().await.unwrap();
        assert_eq!(types, vec![ContentType::Article, ContentType::Video]);
    }

    #[tokio::test]
    async fn criteria_errors_propagate() {
        let (_, handler) = handler(vec![]);
        let mut criteria = handler.criteria();
        let err = criteria.set_offset(-1).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidArgument(_)));

        let err: HandlerError = err.into();
        assert!(err.as_criteria().is_some());
    }

    #[tokio::test]
    async fn fresh_criteria_use_the_handler_factory() {
        struct NoLanguage;

        impl crate::criteria::Validator for NoLanguage {
            fn validate_column_name(&self, name: &str) -> bool {
                name != "language"
            }

            fn validate_operator(&self, _operator: Operator) -> bool {
                true
            }
        }

        let store = Arc::new(FakeStore::default());
        let factory = CriteriaFactory::new(crate::criteria::SharedValidator::new(NoLanguage));
        let handler = ContentHandler::with_factory(store, factory);

        let mut criteria = handler.criteria();
        assert!(matches!(
            criteria.push("language", "en", Operator::Equals),
            Err(CriteriaError::InvalidColumnName(_))
        ));
        assert!(criteria.push("title", "x", Operator::Equals).is_ok());
    }

    #[tokio::test]
    async fn list_and_counter() {
        let (_, handler) = handler(vec![row(4, "collection")]);
        let list = handler.typed(ContentType::Collection).get_list(None).await.unwrap();
        assert_eq!(list, vec![(4, "Item 4".to_string())]);
        assert!(handler.update_counter(4).await.unwrap());
        assert!(!handler.update_counter(5).await.unwrap());
        assert!(handler.toggle_online_status(4).await.unwrap());
    }
}
