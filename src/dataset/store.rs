//! Immutable per-session annotation storage.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::Result;
use crate::dataset::annotation::{FrameId, TrackAnnotation, TrackId};

/// Frame-indexed, read-only store of track annotations for one sequence.
///
/// Loaded once per editing session; the engine only ever reads from it.
/// Malformed lines are skipped individually and loading continues.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    frames: HashMap<FrameId, Vec<TrackAnnotation>>,
    max_track_id: TrackId,
    len: usize,
}

impl AnnotationStore {
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut frames: HashMap<FrameId, Vec<TrackAnnotation>> = HashMap::new();
        let mut max_track_id = 0;
        let mut len = 0;

        for line in reader.lines() {
            let line = line?;
            let Some(ann) = TrackAnnotation::parse_mot_line(&line) else {
                continue;
            };
            max_track_id = max_track_id.max(ann.id);
            len += 1;
            frames.entry(ann.frame).or_default().push(ann);
        }

        info!(
            "loaded {} annotations across {} frames, max track id {}",
            len,
            frames.len(),
            max_track_id
        );

        Ok(Self {
            frames,
            max_track_id,
            len,
        })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// All annotations recorded for `frame`; empty when the frame is absent.
    pub fn objects_in(&self, frame: FrameId) -> &[TrackAnnotation] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, frame: FrameId, id: TrackId) -> Option<&TrackAnnotation> {
        self.objects_in(frame).iter().find(|a| a.id == id)
    }

    pub fn contains(&self, frame: FrameId, id: TrackId) -> bool {
        self.find(frame, id).is_some()
    }

    /// Annotations to display for `frame`. Score-0 records are dropped
    /// unless `show_zero_score` is set; tracking logic must use
    /// [`objects_in`](Self::objects_in) instead.
    pub fn visible_in(&self, frame: FrameId, show_zero_score: bool) -> Vec<&TrackAnnotation> {
        self.objects_in(frame)
            .iter()
            .filter(|a| show_zero_score || a.score != 0)
            .collect()
    }

    /// Largest ground-truth track id observed at load time. Seeds the
    /// synthetic id allocator so merged boxes never collide with real ids.
    pub fn max_track_id(&self) -> TrackId {
        self.max_track_id
    }

    /// Total number of annotation records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn frame_ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.frames.keys().copied()
    }
}
