//! Media references and their resolution into fetchable CDN URLs

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client as HttpClient;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::sanity_client::FetchError;

const CDN_BASE: &str = "https://cdn.sanity.io";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("media reference missing")]
    Missing,
    #[error("malformed asset reference `{0}`")]
    Malformed(String),
    #[error("invalid transform: {0}")]
    Transform(String),
}

/// Transform parameters applied when resolving a reference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Transform {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

/// An opaque asset identifier plus the transform to request it with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaReference {
    pub asset_ref: String,
    pub alt: Option<String>,
    pub transform: Transform,
}

impl MediaReference {
    /// Accepts a bare `_ref` string, `{ "_ref": .. }` or `{ "asset": { "_ref" | "_id": .. } }`
    pub fn from_value(value: Option<&Value>) -> Result<Self, MediaError> {
        let value = value.ok_or(MediaError::Missing)?;
        let asset_ref = match value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("asset")
                .and_then(|asset| asset.get("_ref").or_else(|| asset.get("_id")))
                .or_else(|| map.get("_ref"))
                .and_then(Value::as_str),
            Value::Null => return Err(MediaError::Missing),
            _ => None,
        }
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MediaError::Malformed(value.to_string()))?;

        let alt = value
            .get("alt")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            asset_ref: asset_ref.to_string(),
            alt,
            transform: Transform::default(),
        })
    }

    pub fn width(mut self, width: u32) -> Self {
        self.transform.width = Some(width);
        self
    }

    pub fn height(mut self, height: Option<u32>) -> Self {
        self.transform.height = height;
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.transform.quality = Some(quality);
        self
    }
}

/// Decomposed `<kind>-<id>[-<W>x<H>]-<ext>` asset id
#[derive(Debug, PartialEq, Eq)]
struct AssetId<'a> {
    id: &'a str,
    dimensions: Option<(u32, u32)>,
    ext: &'a str,
}

fn parse_asset_id<'a>(asset_ref: &'a str, kind: &str) -> Result<AssetId<'a>, MediaError> {
    let malformed = || MediaError::Malformed(asset_ref.to_string());
    let rest = asset_ref
        .strip_prefix(kind)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(malformed)?;

    let (rest, ext) = rest.rsplit_once('-').ok_or_else(malformed)?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(malformed());
    }

    let (id, dimensions) = if kind == "image" {
        let (id, dims) = rest.rsplit_once('-').ok_or_else(malformed)?;
        let (w, h) = dims.split_once('x').ok_or_else(malformed)?;
        let w: u32 = w.parse().map_err(|_| malformed())?;
        let h: u32 = h.parse().map_err(|_| malformed())?;
        (id, Some((w, h)))
    } else {
        (rest, None)
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed());
    }

    Ok(AssetId { id, dimensions, ext })
}

/// Builds CDN URLs for image and file assets of one project/dataset
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    pub fn url(&self, reference: &MediaReference) -> Result<String, MediaError> {
        let asset = parse_asset_id(&reference.asset_ref, "image")?;
        let (w, h) = asset.dimensions.unwrap_or_default();
        let mut url = Url::parse(&format!(
            "{}/images/{}/{}/{}-{}x{}.{}",
            CDN_BASE, self.project_id, self.dataset, asset.id, w, h, asset.ext
        ))
        .map_err(|e| MediaError::Transform(e.to_string()))?;

        let Transform { width, height, quality } = reference.transform;
        if matches!(width, Some(0)) || matches!(height, Some(0)) {
            return Err(MediaError::Transform("zero dimension".to_string()));
        }
        if let Some(q) = quality {
            if q == 0 || q > 100 {
                return Err(MediaError::Transform(format!("quality {} out of range", q)));
            }
        }

        if width.is_some() || height.is_some() || quality.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(width) = width {
                pairs.append_pair("w", &width.to_string());
            }
            if let Some(height) = height {
                pairs.append_pair("h", &height.to_string());
            }
            if let Some(quality) = quality {
                pairs.append_pair("q", &quality.to_string());
            }
        }
        Ok(url.into())
    }

    /// URL of an uploaded file asset (`file-<id>-<ext>`), e.g. the press kit PDF
    pub fn file_url(&self, value: Option<&Value>) -> Result<String, MediaError> {
        let reference = MediaReference::from_value(value)?;
        let asset = parse_asset_id(&reference.asset_ref, "file")?;
        Ok(format!(
            "{}/files/{}/{}/{}.{}",
            CDN_BASE, self.project_id, self.dataset, asset.id, asset.ext
        ))
    }
}

/// Loads the bytes behind a media URL; success means the image is displayable
pub trait MediaLoader: Send + Sync {
    fn load(&self, url: String) -> BoxFuture<'static, Result<(), FetchError>>;
}

pub struct HttpMediaLoader {
    http: HttpClient,
}

impl HttpMediaLoader {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("media: build http client: {}", e))?;
        Ok(Self { http })
    }

    pub fn shared(self) -> Arc<dyn MediaLoader> {
        Arc::new(self)
    }
}

impl MediaLoader for HttpMediaLoader {
    fn load(&self, url: String) -> BoxFuture<'static, Result<(), FetchError>> {
        let http = self.http.clone();
        async move {
            let response = http.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    body: String::new(),
                });
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|val| val.to_str().ok())
                .map(|s| s.to_string());
            if let Some(content_type) = content_type {
                if !content_type.starts_with("image/") {
                    return Err(FetchError::Decode(format!("not an image: {}", content_type)));
                }
            }

            let bytes = response.bytes().await?;
            if bytes.is_empty() {
                return Err(FetchError::Decode("empty image body".to_string()));
            }
            tracing::trace!(url = %url, size = bytes.len(), "Media loaded");
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> ImageUrlBuilder {
        ImageUrlBuilder::new("85zzbmzs", "production")
    }

    #[test]
    fn resolves_nested_asset_reference() {
        let value = json!({
            "_type": "image",
            "alt": "On stage",
            "asset": { "_ref": "image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg" }
        });
        let reference = MediaReference::from_value(Some(&value)).unwrap().width(1200).quality(90);
        assert_eq!(reference.alt.as_deref(), Some("On stage"));
        assert_eq!(
            builder().url(&reference).unwrap(),
            concat!(
                "https://cdn.sanity.io/images/85zzbmzs/production/",
                "Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000.jpg?w=1200&q=90"
            )
        );
    }

    #[test]
    fn width_and_height_are_both_emitted() {
        let value = json!("image-abc123-600x400-png");
        let reference = MediaReference::from_value(Some(&value))
            .unwrap()
            .width(600)
            .height(Some(400));
        let url = builder().url(&reference).unwrap();
        assert!(url.ends_with("abc123-600x400.png?w=600&h=400"), "{}", url);
    }

    #[test]
    fn malformed_references_are_errors() {
        for value in [
            json!("not-an-asset"),
            json!("image-abc-600by400-jpg"),
            json!("image--600x400-jpg"),
            json!({ "asset": {} }),
            json!(42),
        ] {
            let result = MediaReference::from_value(Some(&value))
                .and_then(|reference| builder().url(&reference));
            assert!(result.is_err(), "{} should not resolve", value);
        }
        assert_eq!(MediaReference::from_value(None), Err(MediaError::Missing));
        assert_eq!(MediaReference::from_value(Some(&Value::Null)), Err(MediaError::Missing));
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let value = json!("image-abc-10x10-jpg");
        let reference = MediaReference::from_value(Some(&value)).unwrap().quality(0);
        assert!(matches!(builder().url(&reference), Err(MediaError::Transform(_))));
    }

    #[test]
    fn file_assets_resolve_to_file_urls() {
        let value = json!({ "asset": { "_ref": "file-9f8e7d6c-pdf" } });
        assert_eq!(
            builder().file_url(Some(&value)).unwrap(),
            "https://cdn.sanity.io/files/85zzbmzs/production/9f8e7d6c.pdf"
        );
        assert!(builder().file_url(Some(&json!("image-abc-10x10-jpg"))).is_err());
    }
}
