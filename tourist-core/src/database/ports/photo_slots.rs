use async_trait::async_trait;
use tourist_model::{MarkerId, PhotoSlot, SlotId};

use crate::error::Result;

/// Repository port for the photo slots of a marker's album.
///
/// Every mutation is a single store transaction.
#[async_trait]
pub trait PhotoSlotRepository: Send + Sync {
    /// Slots in position order; empty when the album was never opened.
    async fn slots_for(&self, marker_id: MarkerId) -> Result<Vec<PhotoSlot>>;

    async fn get(&self, slot_id: SlotId) -> Result<Option<PhotoSlot>>;

    /// Creates `count` pending slots at positions `0..count`.
    ///
    /// Fails with `Precondition` if the marker already owns slots and with
    /// `NotFound` if the marker does not exist.
    async fn create_empty_slots(
        &self,
        marker_id: MarkerId,
        count: u32,
    ) -> Result<Vec<PhotoSlot>>;

    async fn set_cache_key(
        &self,
        slot_id: SlotId,
        cache_key: &str,
    ) -> Result<PhotoSlot>;

    /// Marks the slot pending again without deleting the row.
    async fn clear_cache_key(&self, slot_id: SlotId) -> Result<PhotoSlot>;

    /// Returns the number of rows removed.
    async fn delete_all(&self, marker_id: MarkerId) -> Result<u64>;

    /// Number of slots, across all markers, pointing at `cache_key`.
    async fn count_references(&self, cache_key: &str) -> Result<u64>;
}
