use std::{
    any::type_name_of_val,
    collections::{BTreeMap, HashSet},
    fmt,
    sync::{Arc, Mutex},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::sync::{Semaphore, broadcast};
use tourist_model::{
    AlbumEvent, ChangeSet, MarkerId, PhotoSlot, SlotFailure, SlotId, SlotState,
};
use tracing::{debug, info, warn};

use crate::{
    database::ports::{MarkerRepository, PhotoSlotRepository},
    error::{AlbumError, Result},
    infra::{
        cache::ImageCache,
        providers::{RemoteImageSearch, SearchOutcome},
    },
};

pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 8;
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// How a single `resolve_slot` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The slot holds a cached image.
    Resolved(PhotoSlot),
    /// The slot stays pending; nothing was written.
    Failed(SlotFailure),
    /// The slot or its marker disappeared while the fetch was in flight.
    Discarded,
}

/// Keeps marker albums, their slot rows and the image cache in step.
#[derive(Clone)]
pub struct AlbumSyncEngine {
    markers: Arc<dyn MarkerRepository>,
    slots: Arc<dyn PhotoSlotRepository>,
    search: Arc<dyn RemoteImageSearch>,
    cache: ImageCache,
    rng: Arc<Mutex<StdRng>>,
    in_flight: Arc<Mutex<HashSet<SlotId>>>,
    permits: Arc<Semaphore>,
    events: broadcast::Sender<AlbumEvent>,
}

impl fmt::Debug for AlbumSyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self
            .in_flight
            .lock()
            .ok()
            .map(|guard| guard.len())
            .unwrap_or(0);

        f.debug_struct("AlbumSyncEngine")
            .field("marker_repository", &type_name_of_val(self.markers.as_ref()))
            .field("slot_repository", &type_name_of_val(self.slots.as_ref()))
            .field("image_search", &type_name_of_val(self.search.as_ref()))
            .field("image_cache_root", &self.cache.root())
            .field("in_flight_slots", &in_flight)
            .field("permits_available", &self.permits.available_permits())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

/// Removes a slot from the in-flight set on every exit path.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<SlotId>>>,
    slot_id: SlotId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.slot_id);
        }
    }
}

impl AlbumSyncEngine {
    pub fn new(
        markers: Arc<dyn MarkerRepository>,
        slots: Arc<dyn PhotoSlotRepository>,
        search: Arc<dyn RemoteImageSearch>,
        cache: ImageCache,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            markers,
            slots,
            search,
            cache,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            permits: Arc::new(Semaphore::new(DEFAULT_DOWNLOAD_CONCURRENCY)),
            events,
        }
    }

    /// Maximum number of concurrent search + download sequences.
    pub fn with_concurrency(mut self, download_concurrency: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(download_concurrency.max(1)));
        self
    }

    /// Deterministic photo picks, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlbumEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AlbumEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Return the marker's slots, creating `count` empty ones when it has none.
    pub async fn ensure_slots(
        &self,
        marker_id: MarkerId,
        count: u32,
    ) -> Result<Vec<PhotoSlot>> {
        let existing = self.slots.slots_for(marker_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        match self.slots.create_empty_slots(marker_id, count).await {
            Ok(created) => {
                debug!(marker_id = %marker_id, count, "album slots created");
                self.emit(AlbumEvent::Slots {
                    marker_id,
                    changes: ChangeSet::inserted(
                        created.iter().map(|slot| slot.id).collect(),
                    ),
                });
                Ok(created)
            }
            Err(AlbumError::Precondition(reason)) => {
                let winner = self.slots.slots_for(marker_id).await?;
                if winner.is_empty() {
                    return Err(AlbumError::Precondition(reason));
                }
                debug!(marker_id = %marker_id, "album slots created concurrently");
                Ok(winner)
            }
            Err(err) => Err(err),
        }
    }

    /// Fill one pending slot with a random photo taken near its marker.
    pub async fn resolve_slot(
        &self,
        marker_id: MarkerId,
        slot_id: SlotId,
    ) -> Result<ResolveOutcome> {
        let Some(slot) = self.slots.get(slot_id).await? else {
            return Ok(ResolveOutcome::Discarded);
        };
        if slot.marker_id != marker_id {
            return Err(AlbumError::InvalidInput(format!(
                "slot {slot_id} does not belong to marker {marker_id}"
            )));
        }
        if let Some(key) = slot.cache_key.as_deref()
            && self.cache.exists(key).await?
        {
            return Ok(ResolveOutcome::Resolved(slot));
        }

        let _guard = self.begin_resolve(slot_id)?;
        let _permit = self.permits.acquire().await.map_err(|_| {
            AlbumError::Precondition("album engine is shutting down".into())
        })?;

        let Some(marker) = self.markers.get(marker_id).await? else {
            return Ok(ResolveOutcome::Discarded);
        };

        let photos =
            match self.search.search(marker.latitude, marker.longitude).await {
                Ok(SearchOutcome::Photos(photos)) if !photos.is_empty() => {
                    photos
                }
                Ok(_) => {
                    return Ok(self.fail(marker_id, slot_id, SlotFailure::NoPhotos));
                }
                Err(err) => {
                    return Ok(self.fail(marker_id, slot_id, err.to_slot_failure()));
                }
            };

        let index = self.pick(photos.len());
        let Some(image) = &photos[index] else {
            let failure = SlotFailure::Parse(format!(
                "photo {index} of {} has no url_m",
                photos.len()
            ));
            return Ok(self.fail(marker_id, slot_id, failure));
        };
        let bytes = match self.search.download(image).await {
            Ok(bytes) => bytes,
            Err(err) => {
                return Ok(self.fail(marker_id, slot_id, err.to_slot_failure()));
            }
        };

        let key = ImageCache::cache_key_for(&image.remote_url);
        if let Err(err) = self.cache.save(&key, &bytes).await {
            return Ok(self.fail(marker_id, slot_id, err.to_slot_failure()));
        }

        match self.slots.set_cache_key(slot_id, &key).await {
            Ok(slot) => {
                debug!(
                    marker_id = %marker_id,
                    slot_id = %slot_id,
                    key = %key,
                    "slot resolved"
                );
                self.emit(AlbumEvent::Slots {
                    marker_id,
                    changes: ChangeSet::updated(vec![slot_id]),
                });
                Ok(ResolveOutcome::Resolved(slot))
            }
            Err(err) if err.is_not_found() => {
                debug!(slot_id = %slot_id, key = %key, "slot vanished during resolve");
                self.release_unreferenced(&key).await;
                Ok(ResolveOutcome::Discarded)
            }
            Err(err) => {
                self.release_unreferenced(&key).await;
                Err(err)
            }
        }
    }

    /// Delete the album's cached files and mark every slot pending again.
    pub async fn refresh_album(
        &self,
        marker_id: MarkerId,
    ) -> Result<Vec<PhotoSlot>> {
        let slots = self.slots.slots_for(marker_id).await?;
        let resolved: Vec<&PhotoSlot> =
            slots.iter().filter(|slot| slot.is_resolved()).collect();

        self.delete_owned_files(&resolved).await?;

        let mut cleared = Vec::with_capacity(resolved.len());
        for slot in &resolved {
            match self.slots.clear_cache_key(slot.id).await {
                Ok(_) => cleared.push(slot.id),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        info!(marker_id = %marker_id, cleared = cleared.len(), "album refreshed");
        if !cleared.is_empty() {
            self.emit(AlbumEvent::Slots {
                marker_id,
                changes: ChangeSet::updated(cleared),
            });
        }
        self.slots.slots_for(marker_id).await
    }

    /// Remove a marker with its slot rows and cached files.
    pub async fn delete_marker(&self, marker_id: MarkerId) -> Result<()> {
        if self.markers.get(marker_id).await?.is_none() {
            return Err(AlbumError::NotFound(format!("marker {marker_id}")));
        }

        let slots = self.slots.slots_for(marker_id).await?;
        let resolved: Vec<&PhotoSlot> =
            slots.iter().filter(|slot| slot.is_resolved()).collect();
        let files = self.delete_owned_files(&resolved).await?;

        let rows = self.slots.delete_all(marker_id).await?;
        self.markers.delete(marker_id).await?;

        info!(marker_id = %marker_id, slots = rows, files, "marker deleted");
        if !slots.is_empty() {
            self.emit(AlbumEvent::Slots {
                marker_id,
                changes: ChangeSet::deleted(
                    slots.iter().map(|slot| slot.id).collect(),
                ),
            });
        }
        self.emit(AlbumEvent::Markers(ChangeSet::deleted(vec![marker_id])));
        Ok(())
    }

    /// Discard the photo of a single slot so it can be refetched.
    pub async fn clear_slot(&self, slot_id: SlotId) -> Result<PhotoSlot> {
        let slot = self
            .slots
            .get(slot_id)
            .await?
            .ok_or_else(|| AlbumError::NotFound(format!("photo slot {slot_id}")))?;
        if slot.is_pending() {
            return Ok(slot);
        }

        self.delete_owned_files(&[&slot]).await?;
        let cleared = self.slots.clear_cache_key(slot_id).await?;

        debug!(marker_id = %slot.marker_id, slot_id = %slot_id, "slot cleared");
        self.emit(AlbumEvent::Slots {
            marker_id: slot.marker_id,
            changes: ChangeSet::updated(vec![slot_id]),
        });
        Ok(cleared)
    }

    /// Reset resolved slots whose cached file no longer exists.
    pub async fn reconcile_album(
        &self,
        marker_id: MarkerId,
    ) -> Result<Vec<PhotoSlot>> {
        let slots = self.slots.slots_for(marker_id).await?;
        let mut reset = Vec::new();
        for slot in &slots {
            let Some(key) = slot.cache_key.as_deref() else {
                continue;
            };
            if self.is_in_flight(slot.id) || self.cache.exists(key).await? {
                continue;
            }
            warn!(slot_id = %slot.id, key = %key, "cached image missing, slot reset");
            match self.slots.clear_cache_key(slot.id).await {
                Ok(_) => reset.push(slot.id),
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(err),
            }
        }

        if reset.is_empty() {
            return Ok(slots);
        }
        self.emit(AlbumEvent::Slots {
            marker_id,
            changes: ChangeSet::updated(reset),
        });
        self.slots.slots_for(marker_id).await
    }

    pub async fn slot_state(&self, slot_id: SlotId) -> Result<SlotState> {
        if self.is_in_flight(slot_id) {
            return Ok(SlotState::Resolving);
        }
        let slot = self
            .slots
            .get(slot_id)
            .await?
            .ok_or_else(|| AlbumError::NotFound(format!("photo slot {slot_id}")))?;

        match slot.cache_key.as_deref() {
            Some(key) if self.cache.exists(key).await? => Ok(SlotState::Resolved),
            _ => Ok(SlotState::Pending),
        }
    }

    fn begin_resolve(&self, slot_id: SlotId) -> Result<InFlightGuard> {
        let mut set = self.in_flight.lock().map_err(|_| {
            AlbumError::Precondition("in-flight slot set poisoned".into())
        })?;
        if !set.insert(slot_id) {
            return Err(AlbumError::Precondition(format!(
                "slot {slot_id} is already being resolved"
            )));
        }
        Ok(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            slot_id,
        })
    }

    fn is_in_flight(&self, slot_id: SlotId) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(&slot_id))
            .unwrap_or(false)
    }

    fn pick(&self, len: usize) -> usize {
        match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..len),
            Err(poisoned) => poisoned.into_inner().random_range(0..len),
        }
    }

    fn fail(
        &self,
        marker_id: MarkerId,
        slot_id: SlotId,
        failure: SlotFailure,
    ) -> ResolveOutcome {
        warn!(
            marker_id = %marker_id,
            slot_id = %slot_id,
            failure = %failure,
            "slot resolve failed"
        );
        self.emit(AlbumEvent::SlotFailed {
            marker_id,
            slot_id,
            failure: failure.clone(),
        });
        ResolveOutcome::Failed(failure)
    }

    /// Delete the files of `owners` that no slot outside `owners` references.
    /// Returns the number of files removed.
    async fn delete_owned_files(&self, owners: &[&PhotoSlot]) -> Result<usize> {
        let mut owned: BTreeMap<&str, u64> = BTreeMap::new();
        for key in owners.iter().filter_map(|slot| slot.cache_key.as_deref()) {
            *owned.entry(key).or_default() += 1;
        }

        let mut removed = 0;
        for (key, count) in owned {
            let total = self.slots.count_references(key).await?;
            if total > count {
                debug!(key = %key, shared_with = total - count, "cached image kept");
                continue;
            }
            self.cache.delete(key).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Best effort removal of a file written for a write that did not land.
    async fn release_unreferenced(&self, key: &str) {
        match self.slots.count_references(key).await {
            Ok(0) => {
                if let Err(err) = self.cache.delete(key).await {
                    warn!(key = %key, error = %err, "failed to remove orphaned image");
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(key = %key, error = %err, "could not check image references")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::SqliteDatabase, infra::providers::MockRemoteImageSearch,
    };
    use tempfile::TempDir;
    use tourist_model::{Coordinate, ImageRef, Marker};

    const SF: (f64, f64) = (37.7749, -122.4194);

    struct Harness {
        _dir: TempDir,
        db: SqliteDatabase,
        engine: AlbumSyncEngine,
        marker: Marker,
    }

    fn refs(names: &[&str]) -> Vec<Option<ImageRef>> {
        names
            .iter()
            .map(|name| {
                ImageRef::parse(
                    &format!("https://live.staticflickr.com/65535/{name}"),
                    Some(name.to_string()),
                )
                .ok()
            })
            .collect()
    }

    async fn harness(search: MockRemoteImageSearch) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(&dir.path().join("tourist.db"))
            .await
            .unwrap();
        let cache = ImageCache::new(dir.path().join("images"));
        let marker = db
            .markers()
            .create(Coordinate::new(SF.0, SF.1).unwrap())
            .await
            .unwrap();
        let engine = AlbumSyncEngine::new(
            db.markers(),
            db.photo_slots(),
            Arc::new(search),
            cache,
        )
        .with_seed(7);
        Harness {
            _dir: dir,
            db,
            engine,
            marker,
        }
    }

    fn serving(names: &'static [&'static str]) -> MockRemoteImageSearch {
        let mut search = MockRemoteImageSearch::new();
        search
            .expect_search()
            .returning(move |_, _| Ok(SearchOutcome::Photos(refs(names))));
        search
            .expect_download()
            .returning(|_| Ok(b"fakejpeg".to_vec()));
        search
    }

    #[tokio::test]
    async fn ensure_slots_is_idempotent() {
        let h = harness(MockRemoteImageSearch::new()).await;

        let first = h.engine.ensure_slots(h.marker.id, 10).await.unwrap();
        assert_eq!(first.len(), 10);
        let second = h.engine.ensure_slots(h.marker.id, 4).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn resolving_a_slot_caches_one_of_the_results() {
        let mut search = MockRemoteImageSearch::new();
        search
            .expect_search()
            .withf(|lat, lon| *lat == SF.0 && *lon == SF.1)
            .times(1)
            .returning(|_, _| {
                Ok(SearchOutcome::Photos(refs(&[
                    "1_a_m.jpg",
                    "2_b_m.jpg",
                    "3_c_m.jpg",
                ])))
            });
        search
            .expect_download()
            .times(1)
            .returning(|_| Ok(b"fakejpeg".to_vec()));
        let h = harness(search).await;

        let slots = h.engine.ensure_slots(h.marker.id, 10).await.unwrap();
        let outcome =
            h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();

        let ResolveOutcome::Resolved(slot) = outcome else {
            panic!("expected resolved, got {outcome:?}");
        };
        let key = slot.cache_key.unwrap();
        assert!(["1_a_m.jpg", "2_b_m.jpg", "3_c_m.jpg"].contains(&key.as_str()));
        assert_eq!(h.engine.cache().load(&key).await.unwrap(), b"fakejpeg");
        assert_eq!(
            h.engine.slot_state(slots[0].id).await.unwrap(),
            SlotState::Resolved
        );

        // Already resolved: no further network traffic (times(1) above).
        let again =
            h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();
        assert!(matches!(again, ResolveOutcome::Resolved(_)));
    }

    #[tokio::test]
    async fn pick_covers_every_index() {
        let h = harness(MockRemoteImageSearch::new()).await;
        let mut seen = [0usize; 3];
        for _ in 0..300 {
            let index = h.engine.pick(3);
            assert!(index < 3, "picked {index}");
            seen[index] += 1;
        }
        assert!(seen.iter().all(|count| *count > 0), "{seen:?}");
    }

    #[tokio::test]
    async fn chosen_item_without_url_fails_the_slot() {
        let mut search = MockRemoteImageSearch::new();
        search.expect_search().returning(|_, _| {
            let mut photos = refs(&["1_a_m.jpg"]);
            photos.extend([None, None]);
            Ok(SearchOutcome::Photos(photos))
        });
        search
            .expect_download()
            .returning(|_| Ok(b"fakejpeg".to_vec()));
        let h = harness(search).await;
        let slots = h.engine.ensure_slots(h.marker.id, 1).await.unwrap();

        let (mut resolved, mut failed) = (0, 0);
        for _ in 0..60 {
            match h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap() {
                ResolveOutcome::Resolved(slot) => {
                    assert_eq!(slot.cache_key.as_deref(), Some("1_a_m.jpg"));
                    resolved += 1;
                    h.engine.clear_slot(slot.id).await.unwrap();
                }
                ResolveOutcome::Failed(SlotFailure::Parse(_)) => {
                    let slot =
                        h.db.photo_slots().get(slots[0].id).await.unwrap().unwrap();
                    assert!(slot.is_pending());
                    failed += 1;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(resolved > 0, "never picked the usable photo");
        assert!(failed > 0, "items without url_m were never picked");
    }

    #[tokio::test]
    async fn empty_search_fails_without_writes() {
        let mut search = MockRemoteImageSearch::new();
        search
            .expect_search()
            .returning(|_, _| Ok(SearchOutcome::Empty));
        search.expect_download().never();
        let h = harness(search).await;
        let mut events = h.engine.subscribe();

        let slots = h.engine.ensure_slots(h.marker.id, 10).await.unwrap();
        let outcome =
            h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Failed(SlotFailure::NoPhotos));
        let slot = h.db.photo_slots().get(slots[0].id).await.unwrap().unwrap();
        assert!(slot.is_pending());
        assert!(!h.engine.cache().root().exists());

        assert!(matches!(events.recv().await.unwrap(), AlbumEvent::Slots { .. }));
        assert!(matches!(
            events.recv().await.unwrap(),
            AlbumEvent::SlotFailed {
                failure: SlotFailure::NoPhotos,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn remote_errors_become_failures() {
        let mut search = MockRemoteImageSearch::new();
        search
            .expect_search()
            .returning(|_, _| Err(AlbumError::Remote("status 503".into())));
        let h = harness(search).await;

        let slots = h.engine.ensure_slots(h.marker.id, 1).await.unwrap();
        let outcome =
            h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::Failed(SlotFailure::Remote("status 503".into()))
        );
        assert_eq!(
            h.engine.slot_state(slots[0].id).await.unwrap(),
            SlotState::Pending
        );
    }

    #[tokio::test]
    async fn concurrent_resolve_of_the_same_slot_is_rejected() {
        let h = harness(MockRemoteImageSearch::new()).await;
        let slots = h.engine.ensure_slots(h.marker.id, 1).await.unwrap();

        let guard = h.engine.begin_resolve(slots[0].id).unwrap();
        assert_eq!(
            h.engine.slot_state(slots[0].id).await.unwrap(),
            SlotState::Resolving
        );
        let err = h
            .engine
            .resolve_slot(h.marker.id, slots[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, AlbumError::Precondition(_)), "{err:?}");

        drop(guard);
        assert_eq!(
            h.engine.slot_state(slots[0].id).await.unwrap(),
            SlotState::Pending
        );
    }

    #[tokio::test]
    async fn refresh_clears_every_slot_and_file() {
        let h = harness(serving(&["1_a_m.jpg", "2_b_m.jpg"])).await;
        let slots = h.engine.ensure_slots(h.marker.id, 4).await.unwrap();
        let mut keys = HashSet::new();
        for slot in &slots {
            let outcome =
                h.engine.resolve_slot(h.marker.id, slot.id).await.unwrap();
            let ResolveOutcome::Resolved(slot) = outcome else {
                panic!("unexpected {outcome:?}");
            };
            keys.insert(slot.cache_key.unwrap());
        }

        let refreshed = h.engine.refresh_album(h.marker.id).await.unwrap();
        assert_eq!(refreshed.len(), 4);
        assert!(refreshed.iter().all(PhotoSlot::is_pending));
        for key in keys {
            assert!(!h.engine.cache().exists(&key).await.unwrap(), "{key}");
        }
    }

    #[tokio::test]
    async fn delete_marker_removes_rows_and_resolved_files() {
        let h = harness(serving(&["1_a_m.jpg"])).await;
        let slots = h.engine.ensure_slots(h.marker.id, 10).await.unwrap();
        h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();

        // A second resolved slot with its own file.
        h.engine.cache().save("9_z_m.jpg", b"other").await.unwrap();
        h.db.photo_slots()
            .set_cache_key(slots[1].id, "9_z_m.jpg")
            .await
            .unwrap();

        h.engine.delete_marker(h.marker.id).await.unwrap();

        assert!(h.db.markers().get(h.marker.id).await.unwrap().is_none());
        assert!(h.db.photo_slots().slots_for(h.marker.id).await.unwrap().is_empty());
        let remaining = std::fs::read_dir(h.engine.cache().root()).unwrap().count();
        assert_eq!(remaining, 0);

        let err = h.engine.delete_marker(h.marker.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn clearing_one_of_two_sharing_slots_keeps_the_file() {
        let h = harness(serving(&["1_a_m.jpg"])).await;
        let slots = h.engine.ensure_slots(h.marker.id, 2).await.unwrap();
        for slot in &slots {
            h.engine.resolve_slot(h.marker.id, slot.id).await.unwrap();
        }

        let cleared = h.engine.clear_slot(slots[0].id).await.unwrap();
        assert!(cleared.is_pending());
        assert!(h.engine.cache().exists("1_a_m.jpg").await.unwrap());

        h.engine.clear_slot(slots[1].id).await.unwrap();
        assert!(!h.engine.cache().exists("1_a_m.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn reconcile_resets_slots_with_missing_files() {
        let h = harness(serving(&["1_a_m.jpg", "2_b_m.jpg"])).await;
        let slots = h.engine.ensure_slots(h.marker.id, 3).await.unwrap();
        h.db.photo_slots()
            .set_cache_key(slots[0].id, "gone.jpg")
            .await
            .unwrap();
        h.engine.resolve_slot(h.marker.id, slots[1].id).await.unwrap();

        let reconciled = h.engine.reconcile_album(h.marker.id).await.unwrap();
        assert!(reconciled[0].is_pending());
        assert!(reconciled[1].is_resolved());
        assert!(reconciled[2].is_pending());
    }

    #[tokio::test]
    async fn reconcile_keeps_keys_when_the_cache_cannot_be_read() {
        let h = harness(MockRemoteImageSearch::new()).await;
        let slots = h.engine.ensure_slots(h.marker.id, 1).await.unwrap();
        h.db.photo_slots()
            .set_cache_key(slots[0].id, "1_a_m.jpg")
            .await
            .unwrap();
        std::fs::write(h.engine.cache().root(), b"not a directory").unwrap();

        let err = h.engine.reconcile_album(h.marker.id).await.unwrap_err();
        assert!(matches!(err, AlbumError::Storage(_)), "{err:?}");
        assert!(h.engine.slot_state(slots[0].id).await.is_err());

        let slot = h.db.photo_slots().get(slots[0].id).await.unwrap().unwrap();
        assert_eq!(slot.cache_key.as_deref(), Some("1_a_m.jpg"));
    }

    #[tokio::test]
    async fn resolve_of_a_deleted_slot_is_discarded() {
        let mut search = MockRemoteImageSearch::new();
        search.expect_search().never();
        let h = harness(search).await;
        let slots = h.engine.ensure_slots(h.marker.id, 2).await.unwrap();
        h.engine.delete_marker(h.marker.id).await.unwrap();

        let outcome =
            h.engine.resolve_slot(h.marker.id, slots[0].id).await.unwrap();
        assert_eq!(outcome, ResolveOutcome::Discarded);
    }
}
