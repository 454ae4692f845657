//! Track annotation records and the MOT annotation line codec.

use crate::dataset::rect::Rect;

/// Semantic timeline position of a frame, parsed from its filename. Not
/// necessarily the frame's index into the sequence.
pub type FrameId = u32;

/// Stable integer identity of a tracked object across frames.
pub type TrackId = u64;

/// One object in one frame, as loaded from a MOT annotation file.
///
/// Read-only to the engine. `score == 0` marks a low-confidence record,
/// filtered from normal display but never from tracking logic.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAnnotation {
    pub frame: FrameId,
    pub id: TrackId,
    /// Bounding box in original-image pixel coordinates.
    pub bbox: Rect,
    pub score: i32,
    pub category: i32,
    pub truncation: i32,
    pub occlusion: i32,
}

impl TrackAnnotation {
    /// Parse one comma-separated annotation line:
    /// `frame,id,left,top,width,height,score[,category[,truncation[,occlusion]]]`
    ///
    /// Returns `None` for lines with fewer than 7 fields or a non-numeric
    /// field; no partial record is ever materialized. Missing trailing
    /// fields default to 0.
    pub fn parse_mot_line(line: &str) -> Option<TrackAnnotation> {
        let parts: Vec<&str> = line.trim().split(',').collect();
        if parts.len() < 7 {
            return None;
        }

        let frame: FrameId = parts[0].trim().parse().ok()?;
        let id: TrackId = parts[1].trim().parse().ok()?;
        let left = int_field(parts[2])? as f32;
        let top = int_field(parts[3])? as f32;
        let width = int_field(parts[4])? as f32;
        let height = int_field(parts[5])? as f32;
        let score = int_field(parts[6])? as i32;

        let category = opt_field(&parts, 7)?;
        let truncation = opt_field(&parts, 8)?;
        let occlusion = opt_field(&parts, 9)?;

        Some(TrackAnnotation {
            frame,
            id,
            bbox: Rect::new(left, top, width, height),
            score,
            category,
            truncation,
            occlusion,
        })
    }

    /// Serialize in the annotation file's fixed field order:
    /// `frame,id,x,y,w,h,score,category,truncation,occlusion`.
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

fn int_field(s: &str) -> Option<i64> {
    s.trim().parse().ok()
}

/// Optional trailing field: absent defaults to 0, present-but-non-numeric
/// invalidates the whole line.
fn opt_field(parts: &[&str], idx: usize) -> Option<i32> {
    match parts.get(idx) {
        Some(s) => s.trim().parse().ok(),
        None => Some(0),
    }
}
