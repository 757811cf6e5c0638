use std::{fmt, path::Path, str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{
        SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use tracing::info;

use crate::{
    MIGRATOR,
    database::{
        ports::{MarkerRepository, PhotoSlotRepository, SettingsRepository},
        repositories::{
            SqliteMarkerRepository, SqlitePhotoSlotRepository,
            SqliteSettingsRepository,
        },
    },
    error::{AlbumError, Result},
};

const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// SQLite-backed store holding markers, photo slots and app settings.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
    markers: SqliteMarkerRepository,
    photo_slots: SqlitePhotoSlotRepository,
    settings: SqliteSettingsRepository,
}

impl fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl SqliteDatabase {
    /// Opens (creating if needed) the database file and runs migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect_with(options).await
    }

    /// Connects using a `sqlite:` URL, e.g. `sqlite://tourist.db?mode=rwc`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url).map_err(|err| {
            AlbumError::InvalidInput(format!(
                "invalid database url {url}: {err}"
            ))
        })?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let options = options
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Concurrent slot resolutions write through separate connections.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await.map_err(sqlx::Error::from)?;

        info!(
            max_connections = DEFAULT_MAX_CONNECTIONS,
            "Database pool initialized"
        );

        Ok(Self::from_pool(pool))
    }

    /// Wraps an already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            markers: SqliteMarkerRepository::new(pool.clone()),
            photo_slots: SqlitePhotoSlotRepository::new(pool.clone()),
            settings: SqliteSettingsRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn markers(&self) -> Arc<dyn MarkerRepository> {
        Arc::new(self.markers.clone())
    }

    pub fn photo_slots(&self) -> Arc<dyn PhotoSlotRepository> {
        Arc::new(self.photo_slots.clone())
    }

    pub fn settings(&self) -> Arc<dyn SettingsRepository> {
        Arc::new(self.settings.clone())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
