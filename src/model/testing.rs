//! Fixtures shared by model and controller tests

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};

use super::cache::{ContentStore, FetchPolicy};
use super::media::{ImageUrlBuilder, MediaLoader};
use super::sanity_client::{ContentSource, FetchError};
use super::types::Category;

/// Serves fixed documents per category, instantly
pub struct StaticSource {
    pub settings: Value,
    pub shows: Value,
    pub releases: Value,
    /// Category that answers with a 404
    pub failing: Option<Category>,
}

impl Default for StaticSource {
    fn default() -> Self {
        Self {
            settings: json!({}),
            shows: json!([]),
            releases: json!([]),
            failing: None,
        }
    }
}

impl ContentSource for StaticSource {
    fn fetch(&self, category: Category) -> BoxFuture<'_, Result<Value, FetchError>> {
        if self.failing == Some(category) {
            let err = FetchError::Status { status: 404, body: String::new() };
            return async move { Err(err) }.boxed();
        }
        let value = match category {
            Category::SiteSettings => self.settings.clone(),
            Category::Shows => self.shows.clone(),
            Category::Releases => self.releases.clone(),
        };
        async move { Ok(value) }.boxed()
    }
}

/// Every load succeeds
pub struct NoopLoader;

impl MediaLoader for NoopLoader {
    fn load(&self, _url: String) -> BoxFuture<'static, Result<(), FetchError>> {
        async { Ok(()) }.boxed()
    }
}

pub fn builder() -> ImageUrlBuilder {
    ImageUrlBuilder::new("proj", "production")
}

/// A store that already committed `source`'s content
pub async fn loaded_store(source: StaticSource) -> ContentStore {
    let store = ContentStore::new(Arc::new(source), FetchPolicy::default());
    store.refresh().await;
    store
}
