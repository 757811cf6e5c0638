use std::sync::Arc;

use anyhow::Context;
use tourist_config::{Config, ConfigLoad, ConfigLoader};
use tourist_core::{
    AlbumSyncEngine, AppUnitOfWork, FlickrClient, FlickrConfig, ImageCache,
    SqliteDatabase, TouristFacade,
};
use tracing::{info, warn};

use crate::Cli;

#[derive(Debug)]
pub struct App {
    pub facade: TouristFacade,
    db: SqliteDatabase,
}

impl App {
    pub async fn close(&self) {
        self.db.close().await;
    }
}

pub async fn connect(cli: &Cli) -> anyhow::Result<App> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in warnings.iter() {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    config
        .ensure_directories()
        .context("failed to create data directories")?;

    let db = SqliteDatabase::open(&config.database.path)
        .await
        .with_context(|| {
            format!("failed to open database {}", config.database.path.display())
        })?;

    let search = FlickrClient::new(flickr_config(&config))
        .context("failed to build the photo search client")?;
    let uow = AppUnitOfWork::from_sqlite(&db);
    let mut engine = AlbumSyncEngine::new(
        uow.markers.clone(),
        uow.photo_slots.clone(),
        Arc::new(search),
        ImageCache::new(&config.cache.images_dir),
    )
    .with_concurrency(config.album.download_concurrency);
    if let Some(seed) = cli.seed {
        engine = engine.with_seed(seed);
    }

    let facade = TouristFacade::with_engine(uow, engine)
        .with_slots_per_album(config.album.slots_per_album);

    info!(
        database = %config.database.path.display(),
        images = %config.cache.images_dir.display(),
        "tourist ready"
    );
    Ok(App { facade, db })
}

fn flickr_config(config: &Config) -> FlickrConfig {
    let search = &config.search;
    FlickrConfig {
        api_base_url: search.api_base_url.clone(),
        api_key: search.api_key.clone().unwrap_or_default(),
        per_page: search.per_page,
        bbox_half_width: search.bbox_half_width,
        bbox_half_height: search.bbox_half_height,
        timeout: search.http_timeout,
    }
}
