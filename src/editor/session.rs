//! The per-session engine object the driving shell talks to.

use std::collections::BTreeMap;

use crate::Result;
use crate::dataset::{AnnotationStore, FrameId, TrackAnnotation, TrackId};
use crate::editor::compiler::{self, LabelDocument};
use crate::editor::hit_test;
use crate::editor::merging::{MergeRecord, MergeTracker, TrackingGroup};
use crate::editor::selection::SelectionLedger;

/// Owns every ledger for one editing session.
///
/// The shell reports user intent (pointer clicks, frame navigation, merge
/// and stop requests) through the mutating methods and re-renders from the
/// query methods. The session never touches pixels or UI state, and it is
/// the only holder of selection/merge state: there are no ambient globals.
pub struct EditorSession {
    store: AnnotationStore,
    ledger: SelectionLedger,
    merger: MergeTracker,
    suppress_source_scores: bool,
}

impl EditorSession {
    /// Build a session over a loaded store. The synthetic id allocator is
    /// seeded from the store's maximum track id.
    pub fn new(store: AnnotationStore) -> Self {
        let merger = MergeTracker::new(store.max_track_id());
        Self {
            store,
            ledger: SelectionLedger::new(),
            merger,
            suppress_source_scores: false,
        }
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn ledger(&self) -> &SelectionLedger {
        &self.ledger
    }

    pub fn merger(&self) -> &MergeTracker {
        &self.merger
    }

    // --- selection ---

    pub fn select(&mut self, id: TrackId, frame: FrameId) {
        self.ledger.select(id, frame);
    }

    pub fn deselect(&mut self, id: TrackId, frame: FrameId) {
        self.ledger.deselect(id, frame);
    }

    pub fn is_selected_as_of(&self, id: TrackId, frame: FrameId) -> bool {
        self.ledger.is_selected_as_of(id, frame)
    }

    /// Deselect everything as of `frame`; histories survive.
    pub fn clear_all(&mut self, frame: FrameId) {
        self.ledger.clear_all(frame);
    }

    /// Ids drawn as selected in `frame`, restricted to objects that exist
    /// there, in first-selection order.
    pub fn selected_in(&self, frame: FrameId) -> Vec<TrackId> {
        self.ledger
            .ids_in_selection_order()
            .iter()
            .copied()
            .filter(|&id| self.ledger.is_selected_as_of(id, frame) && self.store.contains(frame, id))
            .collect()
    }

    // --- merging ---

    /// Fuse two objects of `frame`; fails with
    /// [`Error::MergeSourceMissing`](crate::Error::MergeSourceMissing) when
    /// either id does not resolve there.
    pub fn complete_merge(
        &mut self,
        first: TrackId,
        second: TrackId,
        frame: FrameId,
    ) -> Result<TrackId> {
        self.merger.complete_merge(&self.store, first, second, frame)
    }

    /// Must be called exactly once per distinct frame displayed while any
    /// tracking group is live; harmless (idempotent) otherwise.
    pub fn on_frame_visit(&mut self, frame: FrameId) {
        self.merger.on_frame_visit(&self.store, frame);
    }

    pub fn stop_group(&mut self, merged_id: TrackId) {
        self.merger.stop_group(merged_id);
    }

    pub fn stop_all(&mut self) {
        self.merger.stop_all();
    }

    pub fn is_tracking(&self) -> bool {
        self.merger.is_tracking()
    }

    pub fn is_tracking_source(&self, id: TrackId) -> bool {
        self.merger.is_tracking_source(id)
    }

    pub fn live_groups(&self) -> &[TrackingGroup] {
        self.merger.live_groups()
    }

    pub fn merged_records_in(&self, frame: FrameId) -> Vec<&MergeRecord> {
        self.merger.records_in(frame).collect()
    }

    pub fn remove_merged_record(&mut self, frame: FrameId, merged_id: TrackId) -> bool {
        self.merger.remove_record(frame, merged_id)
    }

    // --- hit-testing ---

    /// Resolve a pointer position (original-image pixels) against `frame`'s
    /// objects. Score-0 records only participate when `include_zero_score`
    /// is set; the shell forces that on while a merge is being assembled.
    pub fn hit_test(
        &self,
        point: (f32, f32),
        frame: FrameId,
        include_zero_score: bool,
    ) -> Option<&TrackAnnotation> {
        hit_test::resolve(point, self.store.visible_in(frame, include_zero_score))
    }

    // --- output ---

    /// Whether merge-source lines get their score zeroed on export.
    pub fn set_suppress_source_scores(&mut self, on: bool) {
        self.suppress_source_scores = on;
    }

    pub fn suppress_source_scores(&self) -> bool {
        self.suppress_source_scores
    }

    pub fn compile_labels(&self, as_of_frame: FrameId) -> BTreeMap<FrameId, Vec<TrackId>> {
        compiler::compile_labels(&self.ledger, &self.store, as_of_frame)
    }

    pub fn label_document(
        &self,
        video_name: &str,
        sentence: &str,
        as_of_frame: FrameId,
    ) -> LabelDocument {
        LabelDocument::new(self.compile_labels(as_of_frame), video_name, sentence)
    }

    pub fn compile_merged_stream(&self, original: &str) -> String {
        compiler::compile_merged_stream(&self.merger, original, self.suppress_source_scores)
    }
}
