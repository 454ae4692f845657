//! Data side of the editor: annotation records, the per-session store and
//! the frame image sequence.

mod annotation;
mod frames;
mod rect;
mod store;

pub use annotation::{FrameId, TrackAnnotation, TrackId};
pub use frames::{FrameEntry, FrameSequence, frame_id_from_name};
pub use rect::Rect;
pub use store::AnnotationStore;
