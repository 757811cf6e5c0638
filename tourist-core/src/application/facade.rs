use std::{fmt, sync::Arc};

use dashmap::DashMap;
use tokio::{sync::broadcast, task::JoinHandle};
use tourist_model::{
    AlbumEvent, ChangeSet, Coordinate, Marker, MarkerId, PhotoSlot, SlotId,
    Viewport,
};
use tracing::{debug, info};

use crate::{
    application::unit_of_work::AppUnitOfWork,
    error::{AlbumError, Result},
    infra::{cache::ImageCache, providers::RemoteImageSearch},
    sync::{AlbumSession, AlbumSyncEngine, ResolveOutcome},
};

pub const VIEWPORT_SETTING_KEY: &str = "map.viewport";
pub const DEFAULT_SLOTS_PER_ALBUM: u32 = 10;

/// Entry points for the map/album front end.
///
/// Every call maps to one user gesture. Album sessions live in memory only:
/// a session starts when a marker's album is opened and tracks completion
/// until the album is reopened, refreshed or the marker is deleted.
#[derive(Clone)]
pub struct TouristFacade {
    uow: AppUnitOfWork,
    engine: AlbumSyncEngine,
    sessions: Arc<DashMap<MarkerId, AlbumSession>>,
    slots_per_album: u32,
}

impl fmt::Debug for TouristFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouristFacade")
            .field("uow", &self.uow)
            .field("engine", &self.engine)
            .field("open_sessions", &self.sessions.len())
            .field("slots_per_album", &self.slots_per_album)
            .finish()
    }
}

impl TouristFacade {
    pub fn new(
        uow: AppUnitOfWork,
        search: Arc<dyn RemoteImageSearch>,
        cache: ImageCache,
    ) -> Self {
        let engine = AlbumSyncEngine::new(
            uow.markers.clone(),
            uow.photo_slots.clone(),
            search,
            cache,
        );
        Self::with_engine(uow, engine)
    }

    pub fn with_engine(uow: AppUnitOfWork, engine: AlbumSyncEngine) -> Self {
        Self {
            uow,
            engine,
            sessions: Arc::new(DashMap::new()),
            slots_per_album: DEFAULT_SLOTS_PER_ALBUM,
        }
    }

    pub fn with_slots_per_album(mut self, slots_per_album: u32) -> Self {
        self.slots_per_album = slots_per_album;
        self
    }

    pub fn engine(&self) -> &AlbumSyncEngine {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlbumEvent> {
        self.engine.subscribe()
    }

    pub async fn on_marker_placed(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Marker> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        let marker = self.uow.markers.create(coordinate).await?;

        info!(
            marker_id = %marker.id,
            latitude = marker.latitude,
            longitude = marker.longitude,
            "marker placed"
        );
        self.engine
            .emit(AlbumEvent::Markers(ChangeSet::inserted(vec![marker.id])));
        Ok(marker)
    }

    pub async fn markers(&self) -> Result<Vec<Marker>> {
        self.uow.markers.list_all().await
    }

    pub async fn find_marker(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<Marker>> {
        self.uow.markers.find(latitude, longitude).await
    }

    pub async fn marker(&self, marker_id: MarkerId) -> Result<Option<Marker>> {
        self.uow.markers.get(marker_id).await
    }

    /// Prepare the album of a marker and start a new view session.
    pub async fn on_marker_opened(
        &self,
        marker_id: MarkerId,
    ) -> Result<Vec<PhotoSlot>> {
        if self.uow.markers.get(marker_id).await?.is_none() {
            return Err(AlbumError::NotFound(format!("marker {marker_id}")));
        }

        self.engine
            .ensure_slots(marker_id, self.slots_per_album)
            .await?;
        let slots = self.engine.reconcile_album(marker_id).await?;

        let mut session = AlbumSession::open(marker_id, &slots);
        let complete = session.take_completion();
        debug!(
            marker_id = %marker_id,
            resolved = session.resolved_count(),
            expected = session.expected(),
            "album session opened"
        );
        self.sessions.insert(marker_id, session);
        if complete {
            self.engine.emit(AlbumEvent::AlbumComplete { marker_id });
        }
        Ok(slots)
    }

    /// Fetch a photo for a pending slot in the background.
    pub fn on_slot_needs_image(
        &self,
        marker_id: MarkerId,
        slot_id: SlotId,
    ) -> JoinHandle<Result<ResolveOutcome>> {
        let facade = self.clone();
        tokio::spawn(async move {
            let outcome = facade.engine.resolve_slot(marker_id, slot_id).await?;
            if let ResolveOutcome::Resolved(slot) = &outcome {
                facade.record_resolved(marker_id, slot.id);
            }
            Ok(outcome)
        })
    }

    /// Clear and refetch every photo of an album whose session is complete.
    pub async fn on_refresh_requested(
        &self,
        marker_id: MarkerId,
    ) -> Result<Vec<PhotoSlot>> {
        let complete = self
            .sessions
            .get(&marker_id)
            .map(|session| session.is_complete())
            .unwrap_or(false);
        if !complete {
            return Err(AlbumError::Precondition(format!(
                "album of marker {marker_id} is still loading"
            )));
        }

        let slots = self.engine.refresh_album(marker_id).await?;
        if let Some(mut session) = self.sessions.get_mut(&marker_id) {
            session.reset();
        }
        Ok(slots)
    }

    pub async fn on_marker_deleted(&self, marker_id: MarkerId) -> Result<()> {
        self.engine.delete_marker(marker_id).await?;
        self.sessions.remove(&marker_id);
        Ok(())
    }

    /// Discard the photo the user tapped; the slot becomes pending again.
    pub async fn on_slot_selected(&self, slot_id: SlotId) -> Result<PhotoSlot> {
        let slot = self.engine.clear_slot(slot_id).await?;
        if let Some(mut session) = self.sessions.get_mut(&slot.marker_id) {
            session.record_cleared(slot_id);
        }
        Ok(slot)
    }

    pub async fn save_viewport(&self, viewport: &Viewport) -> Result<()> {
        let value = serde_json::to_value(viewport).map_err(|err| {
            AlbumError::InvalidInput(format!("viewport: {err}"))
        })?;
        self.uow.settings.put(VIEWPORT_SETTING_KEY, &value).await
    }

    pub async fn load_viewport(&self) -> Result<Option<Viewport>> {
        let Some(value) = self.uow.settings.get(VIEWPORT_SETTING_KEY).await?
        else {
            return Ok(None);
        };
        let stored: Viewport = serde_json::from_value(value).map_err(|err| {
            AlbumError::Parse(format!("stored viewport: {err}"))
        })?;

        let center =
            Coordinate::new(stored.center_latitude, stored.center_longitude)
                .map_err(|err| {
                    AlbumError::Parse(format!("stored viewport: {err}"))
                })?;
        Viewport::new(center, stored.latitude_delta, stored.longitude_delta)
            .map(Some)
            .map_err(|err| AlbumError::Parse(format!("stored viewport: {err}")))
    }

    fn record_resolved(&self, marker_id: MarkerId, slot_id: SlotId) {
        let complete = match self.sessions.get_mut(&marker_id) {
            Some(mut session) => {
                session.record_resolved(slot_id);
                session.take_completion()
            }
            None => false,
        };
        if complete {
            info!(marker_id = %marker_id, "album complete");
            self.engine.emit(AlbumEvent::AlbumComplete { marker_id });
        }
    }
}
