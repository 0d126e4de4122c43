//! Content cache and fetch orchestrator
//!
//! `ContentStore` owns the single in-memory copy of the site content. Pages read
//! it through `snapshot()` and ask for freshness with `ensure_fresh()`; only the
//! store writes to it. Commits go through one `watch` channel so every reader
//! sees either the whole previous snapshot or the whole new one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::config::CacheConfig;
use super::accessors::list;
use super::content::{ContentSnapshot, LOAD_ERROR};
use super::sanity_client::{ContentSource, FetchError};
use super::types::Category;

type SharedFetch = Shared<BoxFuture<'static, Result<Value, FetchError>>>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Result of a refresh as seen by the caller; the store already recorded it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Failed(String),
}

/// Freshness, timeout and retry settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for FetchPolicy {
    fn from(cfg: &CacheConfig) -> Self {
        Self {
            ttl: cfg.ttl,
            fetch_timeout: cfg.fetch_timeout,
            max_retries: cfg.max_retries,
            retry_backoff: cfg.retry_backoff,
        }
    }
}

struct Inner {
    source: Arc<dyn ContentSource>,
    policy: FetchPolicy,
    snapshot: watch::Sender<Arc<ContentSnapshot>>,
    refresh_in_flight: Mutex<Option<SharedRefresh>>,
    category_in_flight: Mutex<HashMap<Category, SharedFetch>>,
}

/// Cheap to clone; all clones share one snapshot
#[derive(Clone)]
pub struct ContentStore {
    inner: Arc<Inner>,
}

impl ContentStore {
    pub fn new(source: Arc<dyn ContentSource>, policy: FetchPolicy) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ContentSnapshot::default()));
        Self {
            inner: Arc::new(Inner {
                source,
                policy,
                snapshot,
                refresh_in_flight: Mutex::new(None),
                category_in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<ContentSnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Receivers see every commit; dropping one is how a page unsubscribes
    pub fn subscribe(&self) -> watch::Receiver<Arc<ContentSnapshot>> {
        self.inner.snapshot.subscribe()
    }

    pub fn is_stale(&self) -> bool {
        match self.inner.snapshot.borrow().fetched_at {
            Some(fetched_at) => fetched_at.elapsed() > self.inner.policy.ttl,
            None => true,
        }
    }

    /// Refresh only if nothing was committed yet or the TTL has passed.
    /// Returns `None` when the cached content was fresh.
    pub async fn ensure_fresh(&self) -> Option<RefreshOutcome> {
        if !self.is_stale() {
            tracing::trace!("Content fresh, skipping refresh");
            return None;
        }
        Some(self.refresh().await)
    }

    /// Fetch all three categories in parallel and commit them together.
    /// Concurrent callers share the refresh already in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let shared = {
            let mut slot = self.inner.refresh_in_flight.lock().await;
            match slot.as_ref() {
                Some(existing) => {
                    tracing::debug!("Joining in-flight refresh");
                    existing.clone()
                }
                None => {
                    let store = self.clone();
                    let handle = tokio::spawn(async move { store.run_refresh().await });
                    let shared = async move {
                        handle.await.unwrap_or_else(|e| {
                            tracing::error!(error = %e, "Refresh task failed");
                            RefreshOutcome::Failed(LOAD_ERROR.to_string())
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Fetch and replace one category; other categories and `fetched_at` are untouched
    pub async fn refresh_category(&self, category: Category) -> RefreshOutcome {
        match self.fetch_category(category).await {
            Ok(value) => {
                self.inner.snapshot.send_modify(|current| {
                    let snapshot = Arc::make_mut(current);
                    match category {
                        Category::SiteSettings => snapshot.site_settings = settings_record(value),
                        Category::Shows => snapshot.shows = list(Some(&value)),
                        Category::Releases => snapshot.releases = list(Some(&value)),
                    }
                });
                tracing::info!(category = %category, "Category refreshed");
                RefreshOutcome::Updated
            }
            Err(e) => {
                let message = format!("Failed to load {}", category.label());
                tracing::error!(category = %category, error = %e, "Category refresh failed");
                let recorded = message.clone();
                self.inner.snapshot.send_modify(|current| {
                    let snapshot = Arc::make_mut(current);
                    snapshot.error = Some(recorded);
                    snapshot.failures += 1;
                });
                RefreshOutcome::Failed(message)
            }
        }
    }

    async fn run_refresh(&self) -> RefreshOutcome {
        self.inner.snapshot.send_modify(|current| {
            let snapshot = Arc::make_mut(current);
            snapshot.loading = true;
            snapshot.error = None;
        });

        let started = Instant::now();
        let (settings, shows, releases) = tokio::join!(
            self.fetch_category(Category::SiteSettings),
            self.fetch_category(Category::Shows),
            self.fetch_category(Category::Releases),
        );

        let outcome = match (settings, shows, releases) {
            (Ok(settings), Ok(shows), Ok(releases)) => {
                let committed = ContentSnapshot {
                    site_settings: settings_record(settings),
                    shows: list(Some(&shows)),
                    releases: list(Some(&releases)),
                    fetched_at: Some(Instant::now()),
                    loading: false,
                    error: None,
                    failures: self.inner.snapshot.borrow().failures,
                };
                tracing::info!(
                    shows = committed.shows.len(),
                    releases = committed.releases.len(),
                    has_settings = committed.site_settings.is_some(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Content refreshed"
                );
                self.inner.snapshot.send_replace(Arc::new(committed));
                RefreshOutcome::Updated
            }
            (settings, shows, releases) => {
                for (category, err) in [
                    (Category::SiteSettings, settings.err()),
                    (Category::Shows, shows.err()),
                    (Category::Releases, releases.err()),
                ] {
                    if let Some(err) = err {
                        tracing::error!(
                            category = %category,
                            error = %err,
                            "Error fetching content"
                        );
                    }
                }
                self.inner.snapshot.send_modify(|current| {
                    let snapshot = Arc::make_mut(current);
                    snapshot.loading = false;
                    snapshot.error = Some(LOAD_ERROR.to_string());
                    snapshot.failures += 1;
                });
                RefreshOutcome::Failed(LOAD_ERROR.to_string())
            }
        };

        *self.inner.refresh_in_flight.lock().await = None;
        outcome
    }

    async fn fetch_category(&self, category: Category) -> Result<Value, FetchError> {
        let shared = {
            let mut in_flight = self.inner.category_in_flight.lock().await;
            match in_flight.get(&category) {
                Some(existing) => {
                    tracing::debug!(category = %category, "Joining in-flight fetch");
                    existing.clone()
                }
                None => {
                    let inner = self.inner.clone();
                    let handle = tokio::spawn(async move {
                        let result = inner.fetch_with_retry(category).await;
                        inner.category_in_flight.lock().await.remove(&category);
                        result
                    });
                    let shared = async move {
                        handle
                            .await
                            .unwrap_or_else(|e| Err(FetchError::Aborted(e.to_string())))
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(category, shared.clone());
                    shared
                }
            }
        };
        shared.await
    }
}

impl Inner {
    async fn fetch_with_retry(&self, category: Category) -> Result<Value, FetchError> {
        let mut attempt: u32 = 0;
        let mut backoff = self.policy.retry_backoff;
        loop {
            crate::log_fetch_request!(category.as_str(), attempt = attempt);
            let result = match tokio::time::timeout(
                self.policy.fetch_timeout,
                self.source.fetch(category),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(self.policy.fetch_timeout)),
            };
            crate::log_fetch_result!(category.as_str(), result);

            match result {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        category = %category,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Retrying fetch"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                other => return other,
            }
        }
    }
}

/// The settings query yields a singleton document or null
fn settings_record(value: Value) -> Option<Value> {
    value.is_object().then_some(value)
}
