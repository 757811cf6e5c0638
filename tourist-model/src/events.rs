use crate::{MarkerId, SlotId};

/// Rows touched by one mutation batch, so subscribers can patch their view
/// instead of reloading it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChangeSet<T> {
    pub inserted: Vec<T>,
    pub deleted: Vec<T>,
    pub updated: Vec<T>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            deleted: Vec::new(),
            updated: Vec::new(),
        }
    }
}

impl<T> ChangeSet<T> {
    pub fn inserted(ids: Vec<T>) -> Self {
        Self {
            inserted: ids,
            ..Self::default()
        }
    }

    pub fn deleted(ids: Vec<T>) -> Self {
        Self {
            deleted: ids,
            ..Self::default()
        }
    }

    pub fn updated(ids: Vec<T>) -> Self {
        Self {
            updated: ids,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.updated.is_empty()
    }
}

/// Why a resolve attempt left its slot pending.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotFailure {
    /// The search box holds no photos. Not worth retrying until the marker
    /// moves.
    NoPhotos,
    Remote(String),
    Parse(String),
    Storage(String),
}

impl SlotFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SlotFailure::NoPhotos)
    }
}

impl std::fmt::Display for SlotFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotFailure::NoPhotos => f.write_str("no photos found"),
            SlotFailure::Remote(msg) => write!(f, "remote error: {msg}"),
            SlotFailure::Parse(msg) => write!(f, "parse error: {msg}"),
            SlotFailure::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

/// Notifications published by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlbumEvent {
    Markers(ChangeSet<MarkerId>),
    Slots {
        marker_id: MarkerId,
        changes: ChangeSet<SlotId>,
    },
    SlotFailed {
        marker_id: MarkerId,
        slot_id: SlotId,
        failure: SlotFailure,
    },
    /// Every slot of the album session has an image; a new collection may be
    /// requested.
    AlbumComplete { marker_id: MarkerId },
}

impl AlbumEvent {
    pub fn marker_id(&self) -> Option<MarkerId> {
        match self {
            AlbumEvent::Markers(_) => None,
            AlbumEvent::Slots { marker_id, .. }
            | AlbumEvent::SlotFailed { marker_id, .. }
            | AlbumEvent::AlbumComplete { marker_id } => Some(*marker_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_a_single_bucket() {
        let id = SlotId::new();
        let changes = ChangeSet::updated(vec![id]);
        assert!(changes.inserted.is_empty());
        assert!(changes.deleted.is_empty());
        assert_eq!(changes.updated, vec![id]);
        assert!(ChangeSet::<SlotId>::default().is_empty());
    }

    #[test]
    fn empty_search_is_not_retryable() {
        assert!(!SlotFailure::NoPhotos.is_retryable());
        assert!(SlotFailure::Remote("503".into()).is_retryable());
    }
}
