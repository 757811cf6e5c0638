use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tourist_model::{BoundingBox, ImageRef};
use tracing::{debug, warn};
use url::Url;

use crate::error::{AlbumError, Result};

pub const FLICKR_REST_ENDPOINT: &str = "https://api.flickr.com/services/rest/";
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_BBOX_HALF_SIZE: f64 = 1.0;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a photo search around a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every listed item in API order. `None` marks an item without a
    /// usable `url_m`.
    Photos(Vec<Option<ImageRef>>),
    /// The API answered successfully with zero photos.
    Empty,
}

impl SearchOutcome {
    pub fn len(&self) -> usize {
        match self {
            SearchOutcome::Photos(photos) => photos.len(),
            SearchOutcome::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remote photo source used to fill album slots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteImageSearch: Send + Sync {
    /// Photos taken inside the configured box around the point.
    async fn search(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<SearchOutcome>;

    /// Raw bytes of the referenced image.
    async fn download(&self, image: &ImageRef) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct FlickrConfig {
    pub api_base_url: Url,
    pub api_key: String,
    pub per_page: u32,
    pub bbox_half_width: f64,
    pub bbox_half_height: f64,
    pub timeout: Duration,
}

impl fmt::Debug for FlickrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlickrConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("per_page", &self.per_page)
            .field("bbox_half_width", &self.bbox_half_width)
            .field("bbox_half_height", &self.bbox_half_height)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FlickrConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_base_url = Url::parse(FLICKR_REST_ENDPOINT).map_err(|err| {
            AlbumError::InvalidInput(format!("flickr endpoint: {err}"))
        })?;
        Ok(Self {
            api_base_url,
            api_key: api_key.into(),
            per_page: DEFAULT_PER_PAGE,
            bbox_half_width: DEFAULT_BBOX_HALF_SIZE,
            bbox_half_height: DEFAULT_BBOX_HALF_SIZE,
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }
}

/// `flickr.photos.search` client.
#[derive(Clone)]
pub struct FlickrClient {
    http: reqwest::Client,
    config: FlickrConfig,
}

impl fmt::Debug for FlickrClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlickrClient")
            .field("config", &self.config)
            .finish()
    }
}

impl FlickrClient {
    pub fn new(config: FlickrConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("tourist/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                AlbumError::InvalidInput(format!("http client: {err}"))
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &FlickrConfig {
        &self.config
    }

    pub fn bounding_box(&self, latitude: f64, longitude: f64) -> BoundingBox {
        BoundingBox::around(
            latitude,
            longitude,
            self.config.bbox_half_width,
            self.config.bbox_half_height,
        )
    }

    fn search_query(&self, bbox: &BoundingBox) -> Vec<(&'static str, String)> {
        vec![
            ("method", "flickr.photos.search".to_string()),
            ("api_key", self.config.api_key.clone()),
            ("bbox", bbox.to_string()),
            ("safe_search", "1".to_string()),
            ("extras", "url_m".to_string()),
            ("per_page", self.config.per_page.to_string()),
            ("format", "json".to_string()),
            ("nojsoncallback", "1".to_string()),
        ]
    }
}

#[async_trait]
impl RemoteImageSearch for FlickrClient {
    async fn search(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<SearchOutcome> {
        let bbox = self.bounding_box(latitude, longitude);
        let response = self
            .http
            .get(self.config.api_base_url.clone())
            .query(&self.search_query(&bbox))
            .send()
            .await
            .map_err(|err| AlbumError::Remote(format!("photo search: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlbumError::Remote(format!(
                "photo search failed with status {status}"
            )));
        }

        let body = response.text().await.map_err(|err| {
            AlbumError::Remote(format!("photo search body: {err}"))
        })?;
        let outcome = parse_search_response(&body)?;
        debug!(%bbox, results = outcome.len(), "photo search completed");
        Ok(outcome)
    }

    async fn download(&self, image: &ImageRef) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(image.remote_url.clone())
            .send()
            .await
            .map_err(|err| {
                AlbumError::Remote(format!(
                    "download {}: {err}",
                    image.remote_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlbumError::Remote(format!(
                "download {} failed with status {status}",
                image.remote_url
            )));
        }

        let bytes = response.bytes().await.map_err(|err| {
            AlbumError::Remote(format!("download {}: {err}", image.remote_url))
        })?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    stat: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    photos: Option<PhotoPage>,
}

#[derive(Debug, Deserialize)]
struct PhotoPage {
    #[serde(default)]
    photo: Option<Vec<PhotoItem>>,
}

#[derive(Debug, Deserialize)]
struct PhotoItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url_m: Option<String>,
}

/// Decode a `flickr.photos.search` JSON body.
pub fn parse_search_response(body: &str) -> Result<SearchOutcome> {
    let envelope: SearchEnvelope = serde_json::from_str(body).map_err(|err| {
        AlbumError::Parse(format!("photo search response: {err}"))
    })?;

    match envelope.stat.as_deref() {
        Some("ok") => {}
        Some(_) => {
            return Err(AlbumError::Remote(
                envelope
                    .message
                    .unwrap_or_else(|| "photo search failed".to_string()),
            ));
        }
        None => {
            return Err(AlbumError::Parse(
                "photo search response has no stat".into(),
            ));
        }
    }

    let items = envelope
        .photos
        .and_then(|page| page.photo)
        .ok_or_else(|| {
            AlbumError::Parse("photo search response has no photo list".into())
        })?;

    if items.is_empty() {
        return Ok(SearchOutcome::Empty);
    }

    let photos = items
        .into_iter()
        .map(|item| {
            let url = item.url_m?;
            match ImageRef::parse(&url, item.title) {
                Ok(image) => Some(image),
                Err(err) => {
                    warn!(%url, error = %err, "photo has an unusable url");
                    None
                }
            }
        })
        .collect();
    Ok(SearchOutcome::Photos(photos))
}
