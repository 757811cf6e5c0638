pub mod sources;

use std::{path::PathBuf, time::Duration};

use url::Url;

pub const DEFAULT_DATABASE_PATH: &str = "data/tourist.db";
pub const DEFAULT_IMAGE_CACHE_DIR: &str = "data/images";
pub const DEFAULT_FLICKR_ENDPOINT: &str =
    "https://api.flickr.com/services/rest/";
pub const DEFAULT_PER_PAGE: u32 = 10;
pub const DEFAULT_BBOX_HALF_SIZE: f64 = 1.0;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SLOTS_PER_ALBUM: u32 = 10;
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub album: AlbumConfig,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        if let Some(parent) = self.database.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.cache.images_dir)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub images_dir: PathBuf,
}

#[derive(Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub api_base_url: Url,
    pub per_page: u32,
    pub bbox_half_width: f64,
    pub bbox_half_height: f64,
    pub http_timeout: Duration,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url.as_str())
            .field("per_page", &self.per_page)
            .field("bbox_half_width", &self.bbox_half_width)
            .field("bbox_half_height", &self.bbox_half_height)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AlbumConfig {
    pub slots_per_album: u32,
    pub download_concurrency: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
