use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    loader::error::ConfigLoadError,
    util::{parse_var, string_var},
};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub search: FileSearchConfig,
    #[serde(default)]
    pub album: FileAlbumConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileSearchConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox_half_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox_half_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileAlbumConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_per_album: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_concurrency: Option<usize>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub slots_per_album: Option<u32>,
    pub per_page: Option<u32>,
    pub bbox_half_width: Option<f64>,
    pub bbox_half_height: Option<f64>,
    pub download_concurrency: Option<usize>,
    pub http_timeout_secs: Option<u64>,
}

impl EnvConfig {
    pub fn gather() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            config_path: string_var(&lookup, "TOURIST_CONFIG")
                .map(PathBuf::from),
            database_path: string_var(&lookup, "TOURIST_DATABASE_PATH")
                .map(PathBuf::from),
            cache_dir: string_var(&lookup, "TOURIST_CACHE_DIR")
                .map(PathBuf::from),
            api_key: string_var(&lookup, "FLICKR_API_KEY"),
            api_base_url: string_var(&lookup, "FLICKR_API_BASE_URL"),
            slots_per_album: parse_var(&lookup, "TOURIST_SLOTS_PER_ALBUM")?,
            per_page: parse_var(&lookup, "TOURIST_PER_PAGE")?,
            bbox_half_width: parse_var(&lookup, "TOURIST_BBOX_HALF_WIDTH")?,
            bbox_half_height: parse_var(&lookup, "TOURIST_BBOX_HALF_HEIGHT")?,
            download_concurrency: parse_var(
                &lookup,
                "TOURIST_DOWNLOAD_CONCURRENCY",
            )?,
            http_timeout_secs: parse_var(&lookup, "TOURIST_HTTP_TIMEOUT_SECS")?,
        })
    }
}
