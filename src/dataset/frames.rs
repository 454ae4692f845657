//! Frame image sequences and filename-derived frame ids.

use std::fs;
use std::path::{Path, PathBuf};

use log::warn;

use crate::dataset::annotation::FrameId;
use crate::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Extract the semantic frame id from a filename like `img000123.jpg`.
///
/// Takes the first run of ASCII digits in the file stem; `None` when the
/// stem carries no digits.
pub fn frame_id_from_name(path: &Path) -> Option<FrameId> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// One frame of the sequence: its image path and semantic frame id.
#[derive(Debug, Clone)]
pub struct FrameEntry {
    pub path: PathBuf,
    pub frame_id: FrameId,
}

/// Ordered list of frame images, indexable by position.
///
/// Positions are what the shell navigates over; the semantic [`FrameId`]
/// carried by each entry is what every engine operation compares on.
#[derive(Debug, Default)]
pub struct FrameSequence {
    entries: Vec<FrameEntry>,
}

impl FrameSequence {
    /// Build a sequence from pre-collected paths, keeping the given order.
    /// Filenames with no digits get frame id 0.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        let entries = paths
            .into_iter()
            .map(|path| {
                let frame_id = frame_id_from_name(&path).unwrap_or_else(|| {
                    warn!("no frame number in filename {:?}, defaulting to 0", path);
                    0
                });
                FrameEntry { path, frame_id }
            })
            .collect();
        Self { entries }
    }

    /// Scan a directory for image files, sorted by filename.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(Error::EmptySequence(dir.to_path_buf()));
        }
        Ok(Self::from_paths(paths))
    }

    pub fn get(&self, idx: usize) -> Option<&FrameEntry> {
        self.entries.get(idx)
    }

    pub fn frame_id(&self, idx: usize) -> Option<FrameId> {
        self.entries.get(idx).map(|e| e.frame_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameEntry> {
        self.entries.iter()
    }

    /// Position of the frame whose id is closest to `target`; the earliest
    /// position wins on ties. Backs jump-to-frame when the exact frame
    /// number is not part of the sequence.
    pub fn nearest(&self, target: FrameId) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let diff = entry.frame_id.abs_diff(target);
            if best.is_none_or(|(_, d)| diff < d) {
                best = Some((idx, diff));
            }
        }
        best.map(|(idx, _)| idx)
    }
}
