//! Application state shared across all routes.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::content::{ContentHandler, ContentStore, PgContentStore};
use crate::db;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Handler over every content type.
    content: ContentHandler,

    /// Records per page on listing routes.
    items_per_page: u32,
}

impl AppState {
    /// Connect to the database and build services.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        Ok(Self::from_pool(pool, config.items_per_page))
    }

    /// Build state around an existing pool.
    pub fn from_pool(pool: PgPool, items_per_page: u32) -> Self {
        let store = Arc::new(PgContentStore::new(pool.clone()));
        Self::from_parts(pool, store, items_per_page)
    }

    /// Build state with a custom content store.
    ///
    /// The pool is still used for health checks.
    pub fn from_parts(pool: PgPool, store: Arc<dyn ContentStore>, items_per_page: u32) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db: pool,
                content: ContentHandler::new(store),
                items_per_page,
            }),
        }
    }

    pub fn content(&self) -> &ContentHandler {
        &self.inner.content
    }

    pub fn items_per_page(&self) -> u32 {
        self.inner.items_per_page
    }

    /// Check if PostgreSQL is reachable.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
