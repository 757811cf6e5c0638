#![allow(dead_code)]

use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{Notify, Semaphore};
use tourist_core::{
    AlbumError, AppUnitOfWork, ImageCache, RemoteImageSearch, Result,
    SearchOutcome, SqliteDatabase, TouristFacade, model::ImageRef,
};

/// In-process stand-in for the photo search API.
#[derive(Debug, Default)]
pub struct FakeSearch {
    photos: Vec<ImageRef>,
    fail_search: Option<String>,
    searches: AtomicUsize,
    downloads: AtomicUsize,
    download_started: Notify,
    download_gate: Option<Semaphore>,
}

impl FakeSearch {
    pub fn with_photos(names: &[&str]) -> Self {
        Self {
            photos: names
                .iter()
                .map(|name| {
                    ImageRef::parse(
                        &format!("https://live.staticflickr.com/65535/{name}"),
                        None,
                    )
                    .unwrap()
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_search: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Downloads block until [`FakeSearch::release_downloads`] is called.
    pub fn gated(mut self) -> Self {
        self.download_gate = Some(Semaphore::new(0));
        self
    }

    pub fn release_downloads(&self, n: usize) {
        if let Some(gate) = &self.download_gate {
            gate.add_permits(n);
        }
    }

    pub async fn wait_for_download(&self) {
        self.download_started.notified().await;
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteImageSearch for FakeSearch {
    async fn search(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<SearchOutcome> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_search {
            return Err(AlbumError::Remote(message.clone()));
        }
        if self.photos.is_empty() {
            return Ok(SearchOutcome::Empty);
        }
        Ok(SearchOutcome::Photos(
            self.photos.iter().cloned().map(Some).collect(),
        ))
    }

    async fn download(&self, image: &ImageRef) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.download_started.notify_one();
        if let Some(gate) = &self.download_gate {
            gate.acquire()
                .await
                .map_err(|err| AlbumError::Remote(err.to_string()))?
                .forget();
        }
        Ok(format!("jpeg:{}", image.basename).into_bytes())
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub db: SqliteDatabase,
    pub search: Arc<FakeSearch>,
    pub facade: TouristFacade,
}

impl TestApp {
    pub async fn new(search: FakeSearch, slots_per_album: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(&dir.path().join("tourist.db"))
            .await
            .unwrap();
        let search = Arc::new(search);
        let facade = TouristFacade::new(
            AppUnitOfWork::from_sqlite(&db),
            search.clone(),
            ImageCache::new(dir.path().join("images")),
        )
        .with_slots_per_album(slots_per_album);

        Self {
            dir,
            db,
            search,
            facade,
        }
    }

    pub fn cache(&self) -> &ImageCache {
        self.facade.engine().cache()
    }

    pub fn cached_files(&self) -> usize {
        count_files(self.cache().root())
    }
}

pub fn count_files(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
