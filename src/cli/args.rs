//! Command-line argument definitions

use clap::Args;

use crate::config::{
    SourceSpec, API_KEY_ENV, DEFAULT_FRAME_COUNT, DEFAULT_SCREENSHOT_DIR, DEFAULT_START_OFFSET,
    DEFAULT_TAIL_MARGIN, DEFAULT_TIMEOUT_SECS,
};

/// Arguments for the sample command
#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Input video: PATH[;name=NAME][;crop=N][;tonemap][;noinfo] (repeat per source)
    #[arg(short, long = "source", required = true)]
    pub sources: Vec<SourceSpec>,

    /// Frames to skip at the start (intros)
    #[arg(long, default_value_t = DEFAULT_START_OFFSET)]
    pub start: u64,

    /// Frames to leave out at the end (credits)
    #[arg(long, default_value_t = DEFAULT_TAIL_MARGIN)]
    pub tail: u64,

    /// Number of screenshots to pick
    #[arg(short, long, default_value_t = DEFAULT_FRAME_COUNT)]
    pub count: usize,

    /// Render screenshots into this directory
    #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_SCREENSHOT_DIR)]
    pub output: Option<String>,

    /// ffmpeg executable used for rendering
    #[arg(long, default_value = "ffmpeg")]
    pub ffmpeg: String,

    /// Print the selection as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the publish command
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Directory holding the screenshots to upload
    #[arg(short, long, default_value = DEFAULT_SCREENSHOT_DIR)]
    pub dir: String,

    /// Existing directory that receives uploaded screenshots
    #[arg(short, long)]
    pub backup: Option<String>,

    /// Image host API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Source names for the comparison header (repeat in source order)
    #[arg(long = "source-name")]
    pub source_names: Vec<String>,

    /// Print the report as JSON instead of progress lines
    #[arg(long)]
    pub json: bool,
}
