//! The curation engine: selection bookkeeping, merge tracking, hit-testing,
//! output compilation and the session object tying them together.

mod compiler;
mod merging;
mod playback;
mod selection;
mod session;

pub use compiler::{LabelDocument, compile_labels, compile_merged_stream};
pub use hit_test::{Viewport, resolve};
pub use merging::{MergeRecord, MergeTracker, TrackingGroup};
pub use playback::Playback;
pub use selection::{SelectionEntry, SelectionLedger};
pub use session::EditorSession;
