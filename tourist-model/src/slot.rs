use crate::{MarkerId, SlotId};

/// One of the fixed positions of a marker's photo album.
///
/// `cache_key == None` means the slot is waiting for a download; a key means
/// the image bytes were durably saved under that key before it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhotoSlot {
    pub id: SlotId,
    pub marker_id: MarkerId,
    /// 0-based index within the marker's slot batch.
    pub position: u32,
    pub cache_key: Option<String>,
}

impl PhotoSlot {
    pub fn is_pending(&self) -> bool {
        self.cache_key.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        self.cache_key.is_some()
    }
}

/// Externally observable lifecycle of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotState {
    Pending,
    Resolving,
    Resolved,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Pending => "pending",
            SlotState::Resolving => "resolving",
            SlotState::Resolved => "resolved",
        }
    }
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
