//! Selection ledger: which track ids count as selected over which frames.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use crate::dataset::{FrameId, TrackId};

/// Per-id selection state.
///
/// Created on the id's first selection and kept for the whole session; a
/// deselect only clears `persistent_since`, the history survives.
#[derive(Debug, Clone, Default)]
pub struct SelectionEntry {
    /// Frame at which the current persistent selection began, if any. While
    /// set, the id counts as selected for every frame at or after it.
    pub persistent_since: Option<FrameId>,
    /// Every frame at which the id was ever marked selected. Frames are
    /// only ever added, never removed.
    pub history: BTreeSet<FrameId>,
}

/// Span-based selection bookkeeping.
///
/// A selection is open-ended: once an id is selected it stays selected for
/// every later frame until deselected. Deselection closes the span by
/// back-filling the per-frame history, so scrubbing through frames needs no
/// eager per-frame writes, while objects that disappear and reappear still
/// compile against an enumerable frame set.
#[derive(Debug, Default)]
pub struct SelectionLedger {
    entries: HashMap<TrackId, SelectionEntry>,
    /// Ids in first-selection order; drives deterministic export order.
    order: Vec<TrackId>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` persistently selected starting at `frame`.
    ///
    /// No-op when the id is already persistently selected.
    pub fn select(&mut self, id: TrackId, frame: FrameId) {
        if !self.entries.contains_key(&id) {
            self.order.push(id);
        }
        let entry = self.entries.entry(id).or_default();
        if entry.persistent_since.is_some() {
            return;
        }
        entry.persistent_since = Some(frame);
        entry.history.insert(frame);
        debug!("select id {} at frame {}", id, frame);
    }

    /// Close the selection span for `id` at `frame`.
    ///
    /// The deselection frame itself is excluded: history is back-filled
    /// with every frame in `[start, frame - 1]` and the persistent mark is
    /// cleared. Silently does nothing when the id is not persistently
    /// selected; double events from the shell are harmless.
    pub fn deselect(&mut self, id: TrackId, frame: FrameId) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        let Some(start) = entry.persistent_since.take() else {
            return;
        };
        backfill(&mut entry.history, start, frame);
        debug!("deselect id {} at frame {} (span began at {})", id, frame, start);
    }

    /// True when `id` counts as selected at `frame`: either the open
    /// persistent span covers it, or the frame is in the id's history.
    pub fn is_selected_as_of(&self, id: TrackId, frame: FrameId) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        if let Some(since) = entry.persistent_since {
            if frame >= since {
                return true;
            }
        }
        entry.history.contains(&frame)
    }

    /// Deselect every persistently selected id as of `frame`. Histories
    /// survive.
    pub fn clear_all(&mut self, frame: FrameId) {
        for entry in self.entries.values_mut() {
            if let Some(start) = entry.persistent_since.take() {
                backfill(&mut entry.history, start, frame);
            }
        }
    }

    pub fn is_persistent(&self, id: TrackId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.persistent_since.is_some())
    }

    pub fn entry(&self, id: TrackId) -> Option<&SelectionEntry> {
        self.entries.get(&id)
    }

    /// Every id that was ever selected, in first-selection order.
    pub fn ids_in_selection_order(&self) -> &[TrackId] {
        &self.order
    }
}

/// The deselection frame is excluded from the span; an empty range (e.g.
/// deselect on the selection frame, or at frame 0) back-fills nothing.
fn backfill(history: &mut BTreeSet<FrameId>, start: FrameId, deselected_at: FrameId) {
    let Some(end) = deselected_at.checked_sub(1) else {
        return;
    };
    for frame in start..=end {
        history.insert(frame);
    }
}
