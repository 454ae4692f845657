//! Output compilation: exportable label sets and the merged annotation
//! stream.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::{AnnotationStore, FrameId, TrackId};
use crate::editor::merging::MergeTracker;
use crate::editor::selection::SelectionLedger;

/// Reconcile the selection ledger against annotation existence.
///
/// History frames and still-open persistent spans (expanded through
/// `as_of_frame` inclusive) contribute an `(id, frame)` pair only when the
/// store actually has that id in that frame; an object occluded out of a
/// frame never appears in that frame's export even if it is selected on
/// either side of the gap. Frames with no qualifying ids are omitted, and
/// each frame's id list keeps first-inclusion order.
pub fn compile_labels(
    ledger: &SelectionLedger,
    store: &AnnotationStore,
    as_of_frame: FrameId,
) -> BTreeMap<FrameId, Vec<TrackId>> {
    let mut labels: BTreeMap<FrameId, Vec<TrackId>> = BTreeMap::new();

    let mut push = |frame: FrameId, id: TrackId| {
        if store.contains(frame, id) {
            let ids = labels.entry(frame).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    };

    for &id in ledger.ids_in_selection_order() {
        let Some(entry) = ledger.entry(id) else {
            continue;
        };
        for &frame in &entry.history {
            push(frame, id);
        }
        if let Some(since) = entry.persistent_since {
            for frame in since..=as_of_frame {
                push(frame, id);
            }
        }
    }
    labels
}

/// Exportable label document.
///
/// The `ignore` map is reserved and passed through unmodified by the
/// engine; frame keys are stringified for the document format.
#[derive(Debug, Clone, Serialize)]
pub struct LabelDocument {
    pub label: BTreeMap<String, Vec<TrackId>>,
    pub ignore: serde_json::Map<String, serde_json::Value>,
    pub video_name: String,
    pub sentence: String,
}

impl LabelDocument {
    pub fn new(
        labels: BTreeMap<FrameId, Vec<TrackId>>,
        video_name: &str,
        sentence: &str,
    ) -> Self {
        let label = labels
            .into_iter()
            .map(|(frame, ids)| (frame.to_string(), ids))
            .collect();
        Self {
            label,
            ignore: serde_json::Map::new(),
            video_name: video_name.to_string(),
            sentence: sentence.to_string(),
        }
    }
}

/// Produce the merged annotation stream: every original line in order
/// (score-patched when `suppress_source_scores` is set), followed by one
/// line per merge record in emission order.
pub fn compile_merged_stream(
    merger: &MergeTracker,
    original: &str,
    suppress_source_scores: bool,
) -> String {
    let mut out = String::new();
    for line in original.lines() {
        out.push_str(&patch_source_line(merger, line, suppress_source_scores));
        out.push('\n');
    }
    for record in merger.records() {
        out.push_str(&record.to_mot_line());
        out.push('\n');
    }
    out
}

/// Rewrite the score field to 0 on lines whose id was used as a merge
/// source. Lines that do not parse pass through untouched.
fn patch_source_line(merger: &MergeTracker, line: &str, suppress: bool) -> String {
    if !suppress {
        return line.to_string();
    }
    let mut parts: Vec<&str> = line.trim().split(',').collect();
    if parts.len() < 7 {
        return line.to_string();
    }
    let Ok(id) = parts[1].trim().parse::<TrackId>() else {
        return line.to_string();
    };
    if !merger.merged_source_ids().contains(&id) {
        return line.to_string();
    }
    parts[6] = "0";
    parts.join(",")
}
