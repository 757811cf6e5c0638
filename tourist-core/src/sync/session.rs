use std::collections::HashSet;

use tourist_model::{MarkerId, PhotoSlot, SlotId};

/// Progress of one album-view session.
///
/// Counts distinct resolved slots and reports completion once per session;
/// nothing here is persisted.
#[derive(Debug, Clone)]
pub struct AlbumSession {
    marker_id: MarkerId,
    expected: usize,
    resolved: HashSet<SlotId>,
    signalled: bool,
}

impl AlbumSession {
    /// Start a session seeded with the slots that are already resolved.
    pub fn open(marker_id: MarkerId, slots: &[PhotoSlot]) -> Self {
        Self {
            marker_id,
            expected: slots.len(),
            resolved: slots
                .iter()
                .filter(|slot| slot.is_resolved())
                .map(|slot| slot.id)
                .collect(),
            signalled: false,
        }
    }

    pub fn marker_id(&self) -> MarkerId {
        self.marker_id
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_complete(&self) -> bool {
        self.expected > 0 && self.resolved.len() >= self.expected
    }

    pub fn record_resolved(&mut self, slot_id: SlotId) {
        self.resolved.insert(slot_id);
    }

    /// A cleared slot re-arms the completion signal.
    pub fn record_cleared(&mut self, slot_id: SlotId) {
        if self.resolved.remove(&slot_id) {
            self.signalled = false;
        }
    }

    /// True once each time the album becomes complete: after opening, after
    /// a refresh, or after a cleared slot is filled again.
    pub fn take_completion(&mut self) -> bool {
        if self.signalled || !self.is_complete() {
            return false;
        }
        self.signalled = true;
        true
    }

    /// Start counting again after the album was refreshed.
    pub fn reset(&mut self) {
        self.resolved.clear();
        self.signalled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(marker_id: MarkerId, resolved: usize, total: usize) -> Vec<PhotoSlot> {
        (0..total)
            .map(|i| PhotoSlot {
                id: SlotId::new(),
                marker_id,
                position: i as u32,
                cache_key: (i < resolved).then(|| format!("{i}.jpg")),
            })
            .collect()
    }

    #[test]
    fn completion_fires_once() {
        let marker_id = MarkerId::new();
        let slots = slots(marker_id, 1, 3);
        let mut session = AlbumSession::open(marker_id, &slots);
        assert_eq!(session.resolved_count(), 1);

        session.record_resolved(slots[1].id);
        assert!(!session.take_completion());

        session.record_resolved(slots[2].id);
        session.record_resolved(slots[2].id);
        assert!(session.take_completion());
        assert!(!session.take_completion());
        assert!(session.is_complete());
    }

    #[test]
    fn reset_rearms_the_signal() {
        let marker_id = MarkerId::new();
        let slots = slots(marker_id, 2, 2);
        let mut session = AlbumSession::open(marker_id, &slots);
        assert!(session.take_completion());

        session.reset();
        assert!(!session.is_complete());
        for slot in &slots {
            session.record_resolved(slot.id);
        }
        assert!(session.take_completion());
    }

    #[test]
    fn refilling_a_cleared_slot_signals_again() {
        let marker_id = MarkerId::new();
        let slots = slots(marker_id, 2, 2);
        let mut session = AlbumSession::open(marker_id, &slots);
        assert!(session.take_completion());

        session.record_cleared(slots[0].id);
        assert!(!session.is_complete());
        assert!(!session.take_completion());

        // Clearing a slot that was never counted changes nothing.
        session.record_cleared(SlotId::new());
        session.record_resolved(slots[0].id);
        assert!(session.take_completion());
        assert!(!session.take_completion());
    }

    #[test]
    fn empty_album_never_completes() {
        let mut session = AlbumSession::open(MarkerId::new(), &[]);
        assert!(!session.take_completion());
    }
}
