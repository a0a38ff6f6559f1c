//! Run configuration
//!
//! Configuration is assembled once from command-line flags and the process
//! environment, validated, and then handed to the drivers by reference.
//! Nothing here is mutated after validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{CompError, CompResult};
use crate::normalize::NormalizeOptions;

/// Environment variable holding the image host API key
pub const API_KEY_ENV: &str = "PTPIMG_API";

/// Default frames skipped at the head (intros)
pub const DEFAULT_START_OFFSET: u64 = 4000;
/// Default frames excluded at the tail (credits)
pub const DEFAULT_TAIL_MARGIN: u64 = 4000;
/// Default number of comparison frames
pub const DEFAULT_FRAME_COUNT: usize = 15;
/// Default screenshot working directory
pub const DEFAULT_SCREENSHOT_DIR: &str = "Screenshots";
/// Default per-request upload timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One input video and how to normalize it
///
/// Parsed from `PATH[;name=NAME][;crop=N][;tonemap][;noinfo]`. The name
/// defaults to the file stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub path: String,
    pub name: String,
    pub normalize: NormalizeOptions,
}

impl SourceSpec {
    /// Create a source with default normalization
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            normalize: NormalizeOptions::new(),
        }
    }

    /// Replace the normalization options
    pub fn with_normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }
}

impl FromStr for SourceSpec {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parts = spec.split(';').map(str::trim);
        let path = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "missing file path".to_string())?;

        let mut name = None;
        let mut normalize = NormalizeOptions::new();

        for option in parts.filter(|p| !p.is_empty()) {
            match option.split_once('=') {
                Some(("name", value)) if !value.trim().is_empty() => {
                    name = Some(value.trim().to_string());
                }
                Some(("crop", value)) => {
                    let rows = value
                        .trim()
                        .parse::<u32>()
                        .map_err(|_| format!("invalid crop value '{}'", value))?;
                    normalize.crop = Some(rows);
                }
                None if option == "tonemap" => normalize.tonemap = true,
                None if option == "noinfo" => normalize.info = false,
                _ => return Err(format!("unknown option '{}'", option)),
            }
        }

        let name = match name {
            Some(name) => name,
            None => Path::new(path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string())
                .ok_or_else(|| format!("cannot derive a name from '{}'", path))?,
        };

        Ok(Self {
            path: path.to_string(),
            name,
            normalize,
        })
    }
}

/// Validated configuration for a sampling and rendering run
#[derive(Debug, Clone, Serialize)]
pub struct SampleConfig {
    pub sources: Vec<SourceSpec>,
    pub start_offset: u64,
    pub tail_margin: u64,
    pub frame_count: usize,
    /// Render screenshots here when set
    pub output_dir: Option<PathBuf>,
    /// ffmpeg executable used for rendering
    pub ffmpeg_path: String,
}

impl SampleConfig {
    /// Build and validate a sample configuration
    pub fn new(
        sources: Vec<SourceSpec>,
        start_offset: u64,
        tail_margin: u64,
        frame_count: usize,
    ) -> CompResult<Self> {
        let config = Self {
            sources,
            start_offset,
            tail_margin,
            frame_count,
            output_dir: None,
            ffmpeg_path: "ffmpeg".to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Render screenshots into `dir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Use a specific ffmpeg executable
    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Checks that do not need the sources opened
    pub fn validate(&self) -> CompResult<()> {
        if self.sources.is_empty() {
            return Err(CompError::InvalidSampleRequest {
                message: "at least one source is required".to_string(),
            });
        }
        if self.frame_count == 0 {
            return Err(CompError::InvalidSampleRequest {
                message: "frame count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Image host endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub upload_url: String,
    pub referer: String,
    /// Host used to build public links
    pub public_host: String,
}

impl Endpoint {
    /// The ptpimg.me image host
    pub fn ptpimg() -> Self {
        Self {
            upload_url: "https://ptpimg.me/upload.php".to_string(),
            referer: "https://ptpimg.me/index.php".to_string(),
            public_host: "ptpimg.me".to_string(),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::ptpimg()
    }
}

/// Secret string that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Raw key for the request body
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Validated configuration for a publish run
#[derive(Debug, Clone)]
pub struct PublishConfig {
    pub source_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub api_key: ApiKey,
    pub endpoint: Endpoint,
    /// Extension of files to publish, without the dot
    pub extension: String,
    pub timeout: Duration,
    /// Source names for the manifest header, if known
    pub source_names: Vec<String>,
}

impl PublishConfig {
    /// Build and validate a publish configuration
    ///
    /// Fails before any work starts if the key is missing or blank, or if
    /// either directory does not exist. The backup directory is never created.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        api_key: Option<String>,
    ) -> CompResult<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CompError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            })?;

        let source_dir = source_dir.into();
        if !source_dir.is_dir() {
            return Err(CompError::SourceDirMissing {
                path: source_dir.display().to_string(),
            });
        }

        let backup_dir = backup_dir.into();
        if !backup_dir.is_dir() {
            return Err(CompError::BackupDirMissing {
                path: backup_dir.display().to_string(),
            });
        }

        Ok(Self {
            source_dir,
            backup_dir,
            api_key: ApiKey(api_key),
            endpoint: Endpoint::default(),
            extension: "png".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            source_names: Vec::new(),
        })
    }

    /// Read the API key from the process environment
    pub fn from_env(
        source_dir: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> CompResult<Self> {
        Self::new(source_dir, backup_dir, std::env::var(API_KEY_ENV).ok())
    }

    /// Use a different endpoint
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Name the sources in the manifest header
    pub fn with_source_names(mut self, names: Vec<String>) -> Self {
        self.source_names = names;
        self
    }
}
