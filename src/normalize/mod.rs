//! Per-source normalization: tonemapping, cropping and overlay annotation
//!
//! Normalization is expressed as an ffmpeg filter chain. The order is fixed:
//! tonemap (with color retagging), then crop, then overlay.

use serde::{Deserialize, Serialize};

use crate::probe::FrameType;

/// Overlay text style: yellow sans-serif with a thin black border, top left
const OVERLAY_STYLE: &str =
    "expansion=none:font=Sans:fontsize=35:fontcolor=yellow:borderw=2:bordercolor=black:x=10:y=10:line_spacing=6";

/// HDR to SDR conversion; the result is retagged separately
const TONEMAP_FILTERS: &[&str] = &[
    "zscale=t=linear:npl=100",
    "format=gbrpf32le",
    "zscale=p=bt709",
    "tonemap=tonemap=hable:desat=0",
    "zscale=t=bt709:m=bt709:r=tv",
    "format=yuv420p",
];

/// Standard-range tagging triplet applied after tonemapping
const BT709_RETAG: &str = "setparams=color_primaries=bt709:color_trc=bt709:colorspace=bt709";

/// Normalization options for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Convert HDR to SDR and retag as BT.709
    pub tonemap: bool,
    /// Rows to remove from both top and bottom
    pub crop: Option<u32>,
    /// Draw the frame info overlay
    pub info: bool,
}

impl NormalizeOptions {
    /// Options with only the overlay enabled
    pub fn new() -> Self {
        Self {
            tonemap: false,
            crop: None,
            info: true,
        }
    }

    /// Enable tonemapping
    pub fn with_tonemap(mut self) -> Self {
        self.tonemap = true;
        self
    }

    /// Crop `rows` from top and bottom
    pub fn with_crop(mut self, rows: u32) -> Self {
        self.crop = Some(rows);
        self
    }

    /// Disable the overlay
    pub fn without_info(mut self) -> Self {
        self.info = false;
        self
    }

    /// Crop actually applied, or `None` when cropping is off
    ///
    /// Odd amounts are rounded down by one unless the clip was tonemapped in
    /// the same chain.
    pub fn effective_crop(&self) -> Option<u32> {
        let crop = self.crop.filter(|c| *c > 0)?;
        let crop = if !self.tonemap && crop % 2 == 1 {
            crop - 1
        } else {
            crop
        };
        (crop > 0).then_some(crop)
    }

    /// Ordered ffmpeg filters for a frame of this source
    pub fn filter_chain(&self, title: &str, frame: u64, frame_type: FrameType) -> Vec<String> {
        let mut filters = Vec::new();

        if self.tonemap {
            filters.extend(TONEMAP_FILTERS.iter().map(|f| f.to_string()));
            filters.push(BT709_RETAG.to_string());
        }

        if let Some(crop) = self.effective_crop() {
            filters.push(format!("crop=iw:ih-{}:0:{}", crop * 2, crop));
        }

        if self.info {
            filters.push(overlay_filter(title, frame, frame_type));
        }

        filters
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the `drawtext` overlay for one frame
pub fn overlay_filter(title: &str, frame: u64, frame_type: FrameType) -> String {
    let text = format!(
        "Frame Number: {}\nPicture Type: {}\nClip: {}",
        frame, frame_type, title
    );
    format!("drawtext=text={}:{}", escape_drawtext(&text), OVERLAY_STYLE)
}

/// Escape text for use as an unquoted `drawtext` value inside a filter graph
///
/// Two levels apply: the filter option level (`\\`, `'`, `:`) and then the
/// filter graph level (`\\`, `'`, `[`, `]`, `,`, `;`).
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\\\\\"),
            '\'' => escaped.push_str("\\\\\\'"),
            ':' => escaped.push_str("\\\\:"),
            ',' | ';' | '[' | ']' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
