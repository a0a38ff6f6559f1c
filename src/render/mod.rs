//! Screenshot rendering through the ffmpeg executable

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::config::SourceSpec;
use crate::error::{CompError, CompResult};
use crate::probe::FrameType;

/// Renders one normalized frame of one source to an image file
pub trait Renderer {
    /// Write the screenshot into `output_dir` and return its path
    fn render(
        &self,
        source_index: usize,
        source: &SourceSpec,
        frame: u64,
        frame_type: FrameType,
        output_dir: &Path,
    ) -> CompResult<PathBuf>;
}

/// File name for a screenshot
///
/// Frame first, then source position, so a sorted listing groups every source
/// of one frame together in source order.
pub fn screenshot_name(frame: u64, source_index: usize, source_name: &str) -> String {
    format!("{:07}_{:02}_{}.png", frame, source_index, slug(source_name))
}

/// Reduce a display name to characters safe in file names
pub fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            slug.push(c);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "source".to_string()
    } else {
        slug.to_string()
    }
}

/// Renderer that shells out to `ffmpeg`
pub struct FfmpegRenderer {
    ffmpeg_path: String,
}

impl FfmpegRenderer {
    /// Create a renderer using the given ffmpeg executable
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Video filter graph: frame selection followed by normalization
    pub fn filter_graph(source: &SourceSpec, frame: u64, frame_type: FrameType) -> String {
        let mut filters = vec![format!("select=eq(n\\,{})", frame)];
        filters.extend(source.normalize.filter_chain(&source.name, frame, frame_type));
        filters.join(",")
    }

    /// Full argument list for one screenshot
    pub fn build_args(
        source: &SourceSpec,
        frame: u64,
        frame_type: FrameType,
        output_path: &Path,
    ) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            source.path.clone(),
            "-vf".to_string(),
            Self::filter_graph(source, frame, frame_type),
            "-fps_mode".to_string(),
            "passthrough".to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-y".to_string(),
            output_path.to_string_lossy().to_string(),
        ]
    }
}

impl Default for FfmpegRenderer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Renderer for FfmpegRenderer {
    fn render(
        &self,
        source_index: usize,
        source: &SourceSpec,
        frame: u64,
        frame_type: FrameType,
        output_dir: &Path,
    ) -> CompResult<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let output_path = output_dir.join(screenshot_name(frame, source_index, &source.name));
        let args = Self::build_args(source, frame, frame_type, &output_path);
        debug!("Running {} {:?}", self.ffmpeg_path, args);

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .output()
            .map_err(|e| CompError::RenderError {
                message: format!("Failed to run {}: {}", self.ffmpeg_path, e),
            })?;

        if !output.status.success() {
            return Err(CompError::RenderError {
                message: format!(
                    "ffmpeg failed for frame {} of '{}': {}",
                    frame,
                    source.name,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        if !output_path.exists() {
            return Err(CompError::RenderError {
                message: format!(
                    "ffmpeg produced no image for frame {} of '{}'",
                    frame, source.name
                ),
            });
        }

        info!("Rendered {}", output_path.display());
        Ok(output_path)
    }
}
