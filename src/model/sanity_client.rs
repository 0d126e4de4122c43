//! Sanity query API client behind the `ContentSource` seam

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client as HttpClient;
use serde_json::Value;
use thiserror::Error;

use crate::config::SanityConfig;
use super::types::Category;

/// Errors from the remote content service or a media download
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("fetch task ended unexpectedly: {0}")]
    Aborted(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) | FetchError::Aborted(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Asynchronous source of untyped content records
pub trait ContentSource: Send + Sync {
    fn fetch(&self, category: Category) -> BoxFuture<'_, Result<Value, FetchError>>;
}

/// GROQ text for each category; releases and shows come back newest first
pub fn query_for(category: Category) -> &'static str {
    match category {
        Category::SiteSettings => {
            r#"*[_type == "siteSettings"][0] {
    shortBio,
    mainPicture,
    backgroundImage,
    longBio,
    gallery,
    epkFile,
    contactEmail,
    bookingEmail
}"#
        }
        Category::Shows => {
            r#"*[_type == "show"] | order(date desc) {
    _id,
    date,
    venue,
    city,
    ticketLink,
    venueImage
}"#
        }
        Category::Releases => {
            r#"*[_type == "release"] | order(releaseDate desc) {
    _id,
    title,
    releaseDate,
    albumCover,
    streamLink,
    buyLink,
    lyricsLink
}"#
        }
    }
}

pub fn endpoint(config: &SanityConfig) -> String {
    let host = if config.use_cdn { "apicdn" } else { "api" };
    format!(
        "https://{}.{}.sanity.io/v{}/data/query/{}",
        config.project_id,
        host,
        config.api_version.trim_start_matches('v'),
        config.dataset
    )
}

#[derive(Clone)]
pub struct SanityClient {
    http: HttpClient,
    endpoint: String,
}

impl SanityClient {
    pub fn new(config: &SanityConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.project_id.trim().is_empty(),
            "sanity: project_id is required"
        );
        anyhow::ensure!(!config.dataset.trim().is_empty(), "sanity: dataset is required");

        let http = HttpClient::builder()
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("sanity: build http client")?;

        let endpoint = endpoint(config);
        tracing::debug!(endpoint = %endpoint, "Sanity client initialized");
        Ok(Self { http, endpoint })
    }

    async fn query(&self, groq: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("query", groq)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut payload: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        match payload.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(FetchError::Decode("response has no `result` field".to_string())),
        }
    }
}

impl ContentSource for SanityClient {
    fn fetch(&self, category: Category) -> BoxFuture<'_, Result<Value, FetchError>> {
        async move { self.query(query_for(category)).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_uses_cdn_host_and_version_prefix() {
        let config = SanityConfig::default();
        assert_eq!(
            endpoint(&config),
            "https://85zzbmzs.apicdn.sanity.io/v2023-05-03/data/query/production"
        );

        let live = SanityConfig {
            use_cdn: false,
            api_version: "v2024-01-01".into(),
            ..SanityConfig::default()
        };
        assert_eq!(
            endpoint(&live),
            "https://85zzbmzs.api.sanity.io/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn list_queries_are_ordered_newest_first() {
        assert!(query_for(Category::Shows).contains("order(date desc)"));
        assert!(query_for(Category::Releases).contains("order(releaseDate desc)"));
        assert!(query_for(Category::SiteSettings).contains("[0]"));
    }

    #[test]
    fn only_network_and_server_errors_are_transient() {
        assert!(FetchError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(FetchError::Status { status: 503, body: String::new() }.is_transient());
        assert!(FetchError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!FetchError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!FetchError::Decode("x".into()).is_transient());
    }

    #[test]
    fn client_requires_project() {
        let config = SanityConfig {
            project_id: "  ".into(),
            ..SanityConfig::default()
        };
        assert!(SanityClient::new(&config).is_err());
    }
}
