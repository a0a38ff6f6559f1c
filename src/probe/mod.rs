//! Video source probing and frame classification module

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod libav;

pub use libav::LibavSource;

/// Frame type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    /// I-frame (keyframe)
    I,
    /// P-frame (predicted)
    P,
    /// B-frame (bidirectional)
    B,
    /// Unknown frame type
    Unknown,
}

impl FrameType {
    /// Single-letter label, as shown in screenshot overlays
    pub fn label(&self) -> &'static str {
        match self {
            FrameType::I => "I",
            FrameType::P => "P",
            FrameType::B => "B",
            FrameType::Unknown => "?",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<ffmpeg_next::picture::Type> for FrameType {
    fn from(kind: ffmpeg_next::picture::Type) -> Self {
        use ffmpeg_next::picture::Type;

        match kind {
            Type::I | Type::SI => FrameType::I,
            Type::P | Type::SP | Type::S => FrameType::P,
            Type::B | Type::BI => FrameType::B,
            Type::None => FrameType::Unknown,
        }
    }
}

/// A decoded video that can classify any of its frames by index
///
/// Lookups must be random access: the sampler probes frames out of order and
/// scans forward one frame at a time, so a lookup may not cost a sequential
/// decode up to `index`.
pub trait FrameSource {
    /// Display name of the source, used in overlays and file names
    fn name(&self) -> &str;

    /// Total number of frames in the source
    fn total_frames(&self) -> u64;

    /// Picture type of the frame at `index`, `Unknown` when out of range
    fn frame_type(&self, index: u64) -> FrameType;
}

impl<T: FrameSource + ?Sized> FrameSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn total_frames(&self) -> u64 {
        (**self).total_frames()
    }

    fn frame_type(&self, index: u64) -> FrameType {
        (**self).frame_type(index)
    }
}

/// In-memory frame classification table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTypeTable {
    name: String,
    types: Vec<FrameType>,
}

impl FrameTypeTable {
    /// Create a table from per-frame picture types in presentation order
    pub fn new(name: impl Into<String>, types: Vec<FrameType>) -> Self {
        Self {
            name: name.into(),
            types,
        }
    }

    /// Create a table where every frame has the same type
    pub fn uniform(name: impl Into<String>, frame_type: FrameType, frames: usize) -> Self {
        Self::new(name, vec![frame_type; frames])
    }

    /// Parse a compact pattern such as `"IBBPBBP"`; unrecognised letters become `Unknown`
    pub fn from_pattern(name: impl Into<String>, pattern: &str) -> Self {
        let types = pattern
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'I' => FrameType::I,
                'P' => FrameType::P,
                'B' => FrameType::B,
                _ => FrameType::Unknown,
            })
            .collect();
        Self::new(name, types)
    }

    /// Overwrite the type of a single frame
    pub fn set(&mut self, index: usize, frame_type: FrameType) {
        if let Some(slot) = self.types.get_mut(index) {
            *slot = frame_type;
        }
    }

    /// Number of frames of the given type
    pub fn count(&self, frame_type: FrameType) -> usize {
        self.types.iter().filter(|t| **t == frame_type).count()
    }
}

impl FrameSource for FrameTypeTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn total_frames(&self) -> u64 {
        self.types.len() as u64
    }

    fn frame_type(&self, index: u64) -> FrameType {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.types.get(i))
            .copied()
            .unwrap_or(FrameType::Unknown)
    }
}
