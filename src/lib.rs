//! ScreenComp Library
//!
//! Picks evenly spread frames that are B-frames in every compared source,
//! renders normalized screenshots of them, and publishes the screenshots to an
//! image host with a local backup so interrupted runs can simply be repeated.

pub mod cli;
pub mod config;
pub mod error;
pub mod normalize;
pub mod probe;
pub mod publish;
pub mod render;
pub mod sampler;
pub mod utils;

// Re-export commonly used types
pub use config::{PublishConfig, SampleConfig, SourceSpec};
pub use error::{CompError, CompResult};
pub use probe::{FrameSource, FrameType, FrameTypeTable};
pub use publish::{Manifest, PublishReport, Publisher};
pub use sampler::{select, FrameSelection, SampleRequest};

/// Initialize ScreenComp library
pub fn init() -> CompResult<()> {
    ffmpeg_next::init().map_err(|e| CompError::FFmpegInitError {
        message: e.to_string(),
    })?;

    Ok(())
}
