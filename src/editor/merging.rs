//! Merge/tracking engine: synthetic merged boxes kept alive across frames.

use std::collections::HashSet;

use log::debug;

use crate::dataset::{AnnotationStore, FrameId, Rect, TrackId};
use crate::{Error, Result};

/// One synthetic merged box emitted for one frame.
///
/// At most one record exists per `(frame, id)` pair; frames where a source
/// went missing simply have no record (no interpolation).
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    pub frame: FrameId,
    pub id: TrackId,
    pub bbox: Rect,
    pub score: i32,
    pub category: i32,
    pub truncation: i32,
    pub occlusion: i32,
    /// Source pair the box was fused from.
    pub merged_from: (TrackId, TrackId),
}

impl MergeRecord {
    /// Serialize in the annotation file's fixed field order.
    pub fn to_mot_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.frame,
            self.id,
            self.bbox.x as i64,
            self.bbox.y as i64,
            self.bbox.width as i64,
            self.bbox.height as i64,
            self.score,
            self.category,
            self.truncation,
            self.occlusion
        )
    }
}

/// A live pairing of two source ids yielding one merged box per visited
/// frame until stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingGroup {
    pub source_ids: (TrackId, TrackId),
    pub merged_id: TrackId,
    pub start_frame: FrameId,
}

/// Bookkeeping for curator-created merged boxes.
///
/// Any number of groups may be live at once, each identified by its merged
/// id and stoppable on its own. Records outlive their group's stop; only an
/// explicit [`remove_record`](Self::remove_record) prunes them.
#[derive(Debug)]
pub struct MergeTracker {
    groups: Vec<TrackingGroup>,
    records: Vec<MergeRecord>,
    emitted: HashSet<(FrameId, TrackId)>,
    merged_source_ids: HashSet<TrackId>,
    next_id: TrackId,
}

impl MergeTracker {
    /// `max_track_id` is the largest ground-truth id in the annotation
    /// store; synthetic ids are allocated strictly above it.
    pub fn new(max_track_id: TrackId) -> Self {
        Self {
            groups: Vec::new(),
            records: Vec::new(),
            emitted: HashSet::new(),
            merged_source_ids: HashSet::new(),
            next_id: max_track_id,
        }
    }

    fn alloc_id(&mut self) -> TrackId {
        self.next_id += 1;
        self.next_id
    }

    /// Fuse two objects of `frame` into a new synthetic identity and start
    /// tracking the pair.
    ///
    /// Both ids must resolve in `frame`; otherwise no group is formed and
    /// the caller is told which source was missing. The merged box is the
    /// union of the two source boxes, carries score 1 and the first
    /// source's category, and is recorded for `frame` immediately.
    ///
    /// A source id may already belong to another live group. Each group
    /// recomputes independently from the store on every visit, so an
    /// overlapping source cannot corrupt either group's records.
    pub fn complete_merge(
        &mut self,
        store: &AnnotationStore,
        first: TrackId,
        second: TrackId,
        frame: FrameId,
    ) -> Result<TrackId> {
        let first_ann = store
            .find(frame, first)
            .ok_or(Error::MergeSourceMissing { id: first, frame })?;
        let second_ann = store
            .find(frame, second)
            .ok_or(Error::MergeSourceMissing { id: second, frame })?;

        let bbox = first_ann.bbox.union(&second_ann.bbox);
        let category = first_ann.category;
        let merged_id = self.alloc_id();

        self.push_record(MergeRecord {
            frame,
            id: merged_id,
            bbox,
            score: 1,
            category,
            truncation: 0,
            occlusion: 0,
            merged_from: (first, second),
        });
        self.groups.push(TrackingGroup {
            source_ids: (first, second),
            merged_id,
            start_frame: frame,
        });
        self.merged_source_ids.insert(first);
        self.merged_source_ids.insert(second);

        debug!(
            "merged {} + {} into {} at frame {}",
            first, second, merged_id, frame
        );
        Ok(merged_id)
    }

    /// Recompute every live group for `frame`.
    ///
    /// Must be called once per distinct frame displayed while any group is
    /// live. Frames at or before a group's start are left alone and
    /// re-visits are idempotent. A source missing from `frame` produces a
    /// gap rather than an error; the group resumes emitting once both
    /// sources resolve again.
    pub fn on_frame_visit(&mut self, store: &AnnotationStore, frame: FrameId) {
        for i in 0..self.groups.len() {
            let group = self.groups[i];
            if frame <= group.start_frame || self.emitted.contains(&(frame, group.merged_id)) {
                continue;
            }
            let (first, second) = group.source_ids;
            let (Some(a), Some(b)) = (store.find(frame, first), store.find(frame, second)) else {
                continue;
            };
            self.push_record(MergeRecord {
                frame,
                id: group.merged_id,
                bbox: a.bbox.union(&b.bbox),
                score: 1,
                category: a.category,
                truncation: 0,
                occlusion: 0,
                merged_from: (first, second),
            });
        }
    }

    fn push_record(&mut self, record: MergeRecord) {
        self.emitted.insert((record.frame, record.id));
        self.records.push(record);
    }

    /// Stop the group identified by `merged_id`; its emitted records are
    /// kept. No-op when no live group matches.
    pub fn stop_group(&mut self, merged_id: TrackId) {
        let before = self.groups.len();
        self.groups.retain(|g| g.merged_id != merged_id);
        if self.groups.len() != before {
            debug!("stopped tracking group {}", merged_id);
        }
    }

    /// Stop every live group.
    pub fn stop_all(&mut self) {
        if !self.groups.is_empty() {
            debug!("stopped all {} tracking groups", self.groups.len());
        }
        self.groups.clear();
    }

    /// Remove the record for `(frame, merged_id)`, if present. A live group
    /// with that merged id is stopped as well; otherwise the next visit to
    /// `frame` would just re-emit the record.
    pub fn remove_record(&mut self, frame: FrameId, merged_id: TrackId) -> bool {
        let Some(pos) = self
            .records
            .iter()
            .position(|r| r.frame == frame && r.id == merged_id)
        else {
            return false;
        };
        self.records.remove(pos);
        self.emitted.remove(&(frame, merged_id));
        self.stop_group(merged_id);
        true
    }

    /// True while at least one group is live.
    pub fn is_tracking(&self) -> bool {
        !self.groups.is_empty()
    }

    pub fn live_groups(&self) -> &[TrackingGroup] {
        &self.groups
    }

    pub fn is_tracking_source(&self, id: TrackId) -> bool {
        self.groups
            .iter()
            .any(|g| g.source_ids.0 == id || g.source_ids.1 == id)
    }

    /// All emitted records, in emission order.
    pub fn records(&self) -> &[MergeRecord] {
        &self.records
    }

    pub fn records_in(&self, frame: FrameId) -> impl Iterator<Item = &MergeRecord> {
        self.records.iter().filter(move |r| r.frame == frame)
    }

    /// Ids ever used as a merge source; exports may suppress their scores.
    pub fn merged_source_ids(&self) -> &HashSet<TrackId> {
        &self.merged_source_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AnnotationStore;

    fn store(lines: &str) -> AnnotationStore {
        AnnotationStore::from_reader(lines.as_bytes()).unwrap()
    }

    fn four_ids_three_frames() -> AnnotationStore {
        store(
            "\
1,1,0,0,10,10,1,2,0,0
1,2,20,20,5,5,1,2,0,0
1,3,50,50,10,10,1,3,0,0
1,4,70,70,10,10,1,3,0,0
2,1,1,1,10,10,1,2,0,0
2,2,21,21,5,5,1,2,0,0
2,3,51,51,10,10,1,3,0,0
2,4,71,71,10,10,1,3,0,0
3,1,2,2,10,10,1,2,0,0
3,2,22,22,5,5,1,2,0,0
3,3,52,52,10,10,1,3,0,0
3,4,72,72,10,10,1,3,0,0
",
        )
    }

    #[test]
    fn test_merge_union_box() {
        let store = store("1,1,0,0,10,10,1,2,0,0\n1,2,20,20,5,5,1,7,0,0\n");
        let mut tracker = MergeTracker::new(store.max_track_id());

        let merged_id = tracker.complete_merge(&store, 1, 2, 1).unwrap();
        let record = &tracker.records()[0];
        assert_eq!(record.bbox, Rect::new(0.0, 0.0, 25.0, 25.0));
        assert_eq!(record.frame, 1);
        assert_eq!(record.id, merged_id);
        assert_eq!(record.score, 1);
        // Category follows the first source.
        assert_eq!(record.category, 2);
        assert_eq!(record.merged_from, (1, 2));
    }

    #[test]
    fn test_synthetic_ids_start_above_max() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        let a = tracker.complete_merge(&store, 1, 2, 1).unwrap();
        let b = tracker.complete_merge(&store, 3, 4, 1).unwrap();
        assert_eq!(a, 5);
        assert_eq!(b, 6);
    }

    #[test]
    fn test_merge_rejected_when_source_missing() {
        let store = store("1,1,0,0,10,10,1,2,0,0\n");
        let mut tracker = MergeTracker::new(store.max_track_id());
        let err = tracker.complete_merge(&store, 1, 99, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::MergeSourceMissing { id: 99, frame: 1 }
        ));
        assert!(!tracker.is_tracking());
        assert!(tracker.records().is_empty());
    }

    #[test]
    fn test_frame_visit_emits_and_is_idempotent() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        let merged_id = tracker.complete_merge(&store, 1, 2, 1).unwrap();

        tracker.on_frame_visit(&store, 2);
        tracker.on_frame_visit(&store, 3);
        // Navigating back and forth adds nothing.
        tracker.on_frame_visit(&store, 2);
        tracker.on_frame_visit(&store, 1);

        let frames: Vec<FrameId> = tracker.records().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![1, 2, 3]);
        assert!(tracker.records().iter().all(|r| r.id == merged_id));
        assert_eq!(
            tracker.records_in(2).next().unwrap().bbox,
            Rect::new(1.0, 1.0, 25.0, 25.0)
        );
    }

    #[test]
    fn test_no_emission_before_start_frame() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        tracker.complete_merge(&store, 1, 2, 2).unwrap();
        tracker.on_frame_visit(&store, 1);
        assert_eq!(tracker.records().len(), 1);
        assert_eq!(tracker.records()[0].frame, 2);
    }

    #[test]
    fn test_independent_group_lifecycle() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        let g1 = tracker.complete_merge(&store, 1, 2, 1).unwrap();
        let g2 = tracker.complete_merge(&store, 3, 4, 1).unwrap();

        tracker.stop_group(g1);
        assert!(tracker.is_tracking());
        assert!(!tracker.is_tracking_source(1));
        assert!(tracker.is_tracking_source(3));

        tracker.on_frame_visit(&store, 2);
        let ids: Vec<TrackId> = tracker.records_in(2).map(|r| r.id).collect();
        assert_eq!(ids, vec![g2]);

        tracker.stop_group(g2);
        assert!(!tracker.is_tracking());
        // Records emitted before the stop survive.
        assert_eq!(tracker.records().len(), 3);
    }

    #[test]
    fn test_gap_self_heal() {
        // Source 2 is missing in frame 2 and returns in frame 3.
        let store = store(
            "\
1,1,0,0,10,10,1,0,0,0
1,2,20,20,5,5,1,0,0,0
2,1,1,1,10,10,1,0,0,0
3,1,2,2,10,10,1,0,0,0
3,2,22,22,5,5,1,0,0,0
",
        );
        let mut tracker = MergeTracker::new(store.max_track_id());
        tracker.complete_merge(&store, 1, 2, 1).unwrap();

        tracker.on_frame_visit(&store, 2);
        tracker.on_frame_visit(&store, 3);

        let frames: Vec<FrameId> = tracker.records().iter().map(|r| r.frame).collect();
        assert_eq!(frames, vec![1, 3]);
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_stop_group_is_noop_when_absent() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        tracker.stop_group(999);
        tracker.complete_merge(&store, 1, 2, 1).unwrap();
        tracker.stop_group(999);
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_stop_all() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        tracker.complete_merge(&store, 1, 2, 1).unwrap();
        tracker.complete_merge(&store, 3, 4, 1).unwrap();
        tracker.stop_all();
        assert!(!tracker.is_tracking());
        tracker.on_frame_visit(&store, 2);
        assert_eq!(tracker.records().len(), 2);
    }

    #[test]
    fn test_remove_record_stops_live_group() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        let merged_id = tracker.complete_merge(&store, 1, 2, 1).unwrap();
        tracker.on_frame_visit(&store, 2);

        assert!(tracker.remove_record(2, merged_id));
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.records().len(), 1);
        // Re-visiting does not resurrect the pruned record.
        tracker.on_frame_visit(&store, 2);
        assert_eq!(tracker.records().len(), 1);

        assert!(!tracker.remove_record(2, merged_id));
    }

    #[test]
    fn test_merged_source_marker_set() {
        let store = four_ids_three_frames();
        let mut tracker = MergeTracker::new(store.max_track_id());
        tracker.complete_merge(&store, 1, 2, 1).unwrap();
        let g = tracker.complete_merge(&store, 3, 4, 1).unwrap();
        tracker.stop_group(g);

        // Markers persist even after the group stops.
        for id in [1, 2, 3, 4] {
            assert!(tracker.merged_source_ids().contains(&id));
        }
    }
}
