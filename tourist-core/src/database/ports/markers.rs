use async_trait::async_trait;
use tourist_model::{Coordinate, Marker, MarkerId};

use crate::error::Result;

/// Repository port for map markers.
#[async_trait]
pub trait MarkerRepository: Send + Sync {
    async fn create(&self, coordinate: Coordinate) -> Result<Marker>;

    /// All markers, oldest first.
    async fn list_all(&self) -> Result<Vec<Marker>>;

    /// Exact floating-point match against the stored coordinate; no epsilon.
    async fn find(&self, latitude: f64, longitude: f64)
    -> Result<Option<Marker>>;

    async fn get(&self, id: MarkerId) -> Result<Option<Marker>>;

    /// Removes the marker row. Slot rows cascade; cached files are the
    /// caller's responsibility.
    async fn delete(&self, id: MarkerId) -> Result<()>;
}
