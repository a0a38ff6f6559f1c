//! Error handling module for ScreenComp

use thiserror::Error;

/// Main error type for ScreenComp operations
///
/// Every variant here is fatal for the run it occurs in. Failures that only
/// affect a single upload are reported through
/// [`UploadError`](crate::publish::uploader::UploadError) instead and never
/// escalate to this type.
#[derive(Error, Debug)]
pub enum CompError {
    /// Sample request failed validation
    #[error("Invalid sample request: {message}")]
    InvalidSampleRequest { message: String },

    /// Source specification could not be parsed
    #[error("Invalid source specification '{spec}': {message}")]
    InvalidSourceSpec { spec: String, message: String },

    /// Input video not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Required credential absent from the environment
    #[error("Missing credential: set {var} in the environment")]
    MissingCredential { var: String },

    /// Directory to publish from does not exist
    #[error("Source directory not found: {path}")]
    SourceDirMissing { path: String },

    /// Backup directory must exist before a publish run
    #[error("Backup directory not found: {path}")]
    BackupDirMissing { path: String },

    /// FFmpeg initialization error
    #[error("Failed to initialize FFmpeg: {message}")]
    FFmpegInitError { message: String },

    /// Frame classification probe error
    #[error("Failed to probe video source: {message}")]
    ProbeError { message: String },

    /// Screenshot rendering error
    #[error("Failed to render screenshot: {message}")]
    RenderError { message: String },

    /// HTTP client construction error
    #[error("Failed to build upload client: {message}")]
    ClientError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    FFmpegError(#[from] ffmpeg_next::Error),
}

/// Result type alias for ScreenComp operations
pub type CompResult<T> = std::result::Result<T, CompError>;
