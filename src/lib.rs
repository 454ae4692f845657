//! # motedit - MOT annotation curation engine
//!
//! State engine for an interactive multi-object-tracking annotation editor.
//! A human curator steps through a frame sequence and produces two derived
//! artifacts from the ground-truth annotations:
//!
//! - a temporal subset of track ids that count as "referred to" across a
//!   span of frames (the selection ledger), and
//! - synthetic merged bounding boxes that fuse two tracked objects into one
//!   identity and stay alive automatically as later frames are visited
//!   (the merge tracker).
//!
//! The crate is the engine only. Rendering, windowing, image decoding and
//! input wiring are external collaborators that report user intent to an
//! [`EditorSession`] and re-render from its query methods; the engine never
//! touches pixels or UI state.
//!
//! ## Example
//!
//! ```rust,ignore
//! use motedit_rs::{AnnotationStore, EditorSession};
//!
//! let store = AnnotationStore::from_path("annotations/video_01.txt")?;
//! let mut session = EditorSession::new(store);
//!
//! // Curator clicks object 7 at frame 3, then deselects it at frame 9.
//! session.select(7, 3);
//! session.deselect(7, 9);
//!
//! // Object 7 is exported for frames 3..=8 wherever it actually exists.
//! let labels = session.compile_labels(9);
//! ```

pub mod dataset;
pub mod editor;

pub use dataset::{AnnotationStore, FrameId, FrameSequence, Rect, TrackAnnotation, TrackId};
pub use editor::{
    EditorSession, LabelDocument, MergeRecord, MergeTracker, Playback, SelectionLedger,
    TrackingGroup, Viewport,
};

pub use crate::error::{Error, Result};

mod error {
    use std::path::PathBuf;

    use thiserror::Error;

    use crate::dataset::{FrameId, TrackId};

    /// Errors surfaced by the curation engine.
    #[derive(Error, Debug)]
    pub enum Error {
        /// A merge was requested with a source object that does not resolve
        /// in the requested frame. This is the engine's only user-facing
        /// failure; the shell reports it as "cannot merge".
        #[error("cannot merge: object {id} does not exist in frame {frame}")]
        MergeSourceMissing { id: TrackId, frame: FrameId },

        #[error("no frame images found in {}", .0.display())]
        EmptySequence(PathBuf),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
    }

    /// Result type for engine operations.
    pub type Result<T> = std::result::Result<T, Error>;
}
