pub mod error;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;
use url::Url;

use crate::{
    models::{
        AlbumConfig, CacheConfig, Config, ConfigMetadata, DEFAULT_BBOX_HALF_SIZE,
        DEFAULT_DATABASE_PATH, DEFAULT_DOWNLOAD_CONCURRENCY,
        DEFAULT_FLICKR_ENDPOINT, DEFAULT_HTTP_TIMEOUT_SECS,
        DEFAULT_IMAGE_CACHE_DIR, DEFAULT_PER_PAGE, DEFAULT_SLOTS_PER_ALBUM,
        DatabaseConfig, SearchConfig,
        sources::{EnvConfig, FileConfig},
    },
    validation::{self, ConfigWarnings},
};

use error::ConfigLoadError;

const DEFAULT_CONFIG_LOCATIONS: &[&str] =
    &["tourist.toml", "config/tourist.toml"];

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Resolves configuration from, in decreasing priority: environment
/// variables (including a `.env` file), the TOML file, built-in defaults.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        self.load_with_env(EnvConfig::gather()?, env_file_loaded)
    }

    /// Same as [`ConfigLoader::load`] with an already gathered environment.
    pub fn load_with_env(
        &self,
        env: EnvConfig,
        env_file_loaded: bool,
    ) -> Result<ConfigLoad, ConfigLoadError> {
        let (file_config, config_path) = self.load_file_config(&env)?;
        compose_config(file_config, env, config_path, env_file_loaded)
    }

    fn load_file_config(
        &self,
        env: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let resolved = match (&self.options.config_path, &env.config_path) {
            (Some(explicit), _) => Some((explicit.clone(), true)),
            (None, Some(from_env)) => Some((from_env.clone(), true)),
            (None, None) => DEFAULT_CONFIG_LOCATIONS
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.exists())
                .map(|path| (path, false)),
        };

        let Some((path, explicit)) = resolved else {
            return Ok((None, None));
        };
        if !path.exists() {
            if explicit {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let file_config = read_file_config(&path)?;
        debug!(path = %path.display(), "configuration file loaded");
        Ok((Some(file_config), Some(path)))
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> Result<ConfigLoad, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();
    if file_config.is_none() {
        warnings.push_with_hint(
            "No tourist.toml detected; using environment variables and defaults",
            "Create tourist.toml or point TOURIST_CONFIG at a configuration file",
        );
    }

    let FileConfig {
        database: file_database,
        cache: file_cache,
        search: file_search,
        album: file_album,
    } = file_config.unwrap_or_default();

    let raw_base_url = env
        .api_base_url
        .or(file_search.api_base_url)
        .unwrap_or_else(|| DEFAULT_FLICKR_ENDPOINT.to_string());
    let api_base_url = Url::parse(&raw_base_url).map_err(|source| {
        ConfigLoadError::InvalidApiUrl {
            value: raw_base_url.clone(),
            source,
        }
    })?;

    let config = Config {
        database: DatabaseConfig {
            path: env
                .database_path
                .or(file_database.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),
        },
        cache: CacheConfig {
            images_dir: env
                .cache_dir
                .or(file_cache.images_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_CACHE_DIR)),
        },
        search: SearchConfig {
            api_key: env
                .api_key
                .or(file_search.api_key)
                .filter(|key| !key.trim().is_empty()),
            api_base_url,
            per_page: env
                .per_page
                .or(file_search.per_page)
                .unwrap_or(DEFAULT_PER_PAGE),
            bbox_half_width: env
                .bbox_half_width
                .or(file_search.bbox_half_width)
                .unwrap_or(DEFAULT_BBOX_HALF_SIZE),
            bbox_half_height: env
                .bbox_half_height
                .or(file_search.bbox_half_height)
                .unwrap_or(DEFAULT_BBOX_HALF_SIZE),
            http_timeout: Duration::from_secs(
                env.http_timeout_secs
                    .or(file_search.http_timeout_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        },
        album: AlbumConfig {
            slots_per_album: env
                .slots_per_album
                .or(file_album.slots_per_album)
                .unwrap_or(DEFAULT_SLOTS_PER_ALBUM),
            download_concurrency: env
                .download_concurrency
                .or(file_album.download_concurrency)
                .unwrap_or(DEFAULT_DOWNLOAD_CONCURRENCY),
        },
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };

    warnings.extend(validation::validate(&config)?);
    Ok(ConfigLoad { config, warnings })
}
