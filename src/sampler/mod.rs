//! Comparable frame selection across aligned video sources
//!
//! Frames are spread evenly over a trimmed playback range. Each slot scans
//! forward from its nominal position until every source agrees that the
//! frame is a B-frame, so screenshots stay temporally synchronized and avoid
//! keyframe artifacts.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{CompError, CompResult};
use crate::probe::{FrameSource, FrameType};

/// Parameters for a frame selection run
pub struct SampleRequest<'a> {
    /// Aligned sources; the first one bounds the usable range
    pub sources: Vec<&'a dyn FrameSource>,
    /// Frames to skip at the head (intros)
    pub start_offset: u64,
    /// Frames to exclude at the tail (credits)
    pub tail_margin: u64,
    /// Desired number of frames
    pub target_count: usize,
}

impl<'a> SampleRequest<'a> {
    /// Create a new sample request
    pub fn new(
        sources: Vec<&'a dyn FrameSource>,
        start_offset: u64,
        tail_margin: u64,
        target_count: usize,
    ) -> Self {
        Self {
            sources,
            start_offset,
            tail_margin,
            target_count,
        }
    }

    /// Validate the request and compute the search plan
    pub fn plan(&self) -> CompResult<SamplePlan> {
        let first = self.sources.first().ok_or_else(|| invalid("no sources given"))?;

        if self.target_count == 0 {
            return Err(invalid("target count must be at least 1"));
        }

        let total = first.total_frames();
        let end = total.checked_sub(self.tail_margin).ok_or_else(|| {
            invalid(format!(
                "tail margin ({}) exceeds the {} frames of '{}'",
                self.tail_margin,
                total,
                first.name()
            ))
        })?;
        let start = self.start_offset;

        if start >= end {
            return Err(invalid(format!(
                "start frame ({}) must be before end frame ({})",
                start, end
            )));
        }

        let step = (end - start) / self.target_count as u64;
        if step == 0 {
            return Err(invalid(format!(
                "range [{}, {}) is too short for {} distinct frames",
                start, end, self.target_count
            )));
        }

        Ok(SamplePlan {
            start,
            end,
            step,
            target_count: self.target_count,
        })
    }
}

/// Validated search range and spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplePlan {
    /// First usable frame
    pub start: u64,
    /// One past the last usable frame
    pub end: u64,
    /// Distance between nominal slot positions
    pub step: u64,
    /// Number of slots
    pub target_count: usize,
}

impl SamplePlan {
    /// Nominal starting frame of slot `slot`
    pub fn slot_start(&self, slot: usize) -> u64 {
        self.start + slot as u64 * self.step
    }
}

/// Selected frame indices in slot order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrameSelection {
    frames: Vec<u64>,
}

impl FrameSelection {
    /// Frame indices
    pub fn frames(&self) -> &[u64] {
        &self.frames
    }

    /// Number of selected frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no slot found a qualifying frame
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// True when a forward scan overran into the next slot's start
    pub fn has_duplicates(&self) -> bool {
        self.frames.windows(2).any(|w| w[0] == w[1])
    }

    /// Consume the selection, returning the raw indices
    pub fn into_frames(self) -> Vec<u64> {
        self.frames
    }
}

impl IntoIterator for FrameSelection {
    type Item = u64;
    type IntoIter = std::vec::IntoIter<u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

/// True iff every source classifies `frame` as a B-frame
pub fn is_joint_b_frame(sources: &[&dyn FrameSource], frame: u64) -> bool {
    sources.iter().all(|s| s.frame_type(frame) == FrameType::B)
}

/// Select evenly spread frames that are B-frames in every source
///
/// Fails only on malformed requests. A slot whose forward scan reaches the end
/// of the range without a qualifying frame is dropped, so the selection can be
/// shorter than requested. Overrunning scans may produce the same frame for
/// adjacent slots; those duplicates are kept.
pub fn select(request: &SampleRequest<'_>) -> CompResult<FrameSelection> {
    let plan = request.plan()?;
    info!(
        "Selecting {} frames in [{}, {}) with step {} across {} sources",
        plan.target_count,
        plan.start,
        plan.end,
        plan.step,
        request.sources.len()
    );

    let mut frames = Vec::with_capacity(plan.target_count);

    for slot in 0..plan.target_count {
        let mut candidate = plan.slot_start(slot);
        while candidate < plan.end && !is_joint_b_frame(&request.sources, candidate) {
            candidate += 1;
        }

        if candidate < plan.end {
            debug!("Slot {}: frame {}", slot, candidate);
            frames.push(candidate);
        } else {
            debug!("Slot {}: no joint B-frame before {}", slot, plan.end);
        }
    }

    if frames.len() < plan.target_count {
        warn!(
            "Found {} of {} requested frames",
            frames.len(),
            plan.target_count
        );
    }

    Ok(FrameSelection { frames })
}

fn invalid(message: impl Into<String>) -> CompError {
    CompError::InvalidSampleRequest {
        message: message.into(),
    }
}
