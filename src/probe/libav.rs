//! FFmpeg-backed frame classification

use ffmpeg_next as ffmpeg;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{CompError, CompResult};
use crate::probe::{FrameSource, FrameType, FrameTypeTable};

/// Video source whose picture types were read with libav
///
/// The whole primary video stream is decoded once on open and the picture
/// type of every frame is recorded in presentation order. Lookups afterwards
/// are table reads.
#[derive(Debug, Clone)]
pub struct LibavSource {
    path: String,
    table: FrameTypeTable,
}

impl LibavSource {
    /// Open a video file and classify all of its frames
    pub fn open(path: &str, name: &str) -> CompResult<Self> {
        info!("Classifying frames of '{}' ({})", name, path);

        if !Path::new(path).exists() {
            return Err(CompError::InputFileNotFound { path: path.to_string() });
        }

        ffmpeg::init().map_err(|e| CompError::FFmpegInitError {
            message: e.to_string(),
        })?;

        let mut ictx = ffmpeg::format::input(&path)
            .map_err(|e| CompError::ProbeError {
                message: format!("Failed to open input file {}: {}", path, e),
            })?;

        let stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| CompError::ProbeError {
                message: format!("No video stream found in {}", path),
            })?;
        let stream_index = stream.index();

        let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = context.decoder().video()?;

        let mut types = FrameTypeLog::default();
        let mut frame = ffmpeg::frame::Video::empty();

        for (packet_stream, packet) in ictx.packets() {
            if packet_stream.index() != stream_index {
                continue;
            }
            if let Err(e) = decoder.send_packet(&packet) {
                warn!(
                    "Undecodable packet in {} near frame {}: {}; recording it as unknown",
                    path,
                    types.len(),
                    e
                );
                types.push_skipped();
                continue;
            }
            drain_frames(&mut decoder, &mut frame, &mut types);
        }

        decoder.send_eof()?;
        drain_frames(&mut decoder, &mut frame, &mut types);

        if types.decoded == 0 {
            return Err(CompError::ProbeError {
                message: format!("No frames decoded from {}", path),
            });
        }
        if types.skipped > 0 {
            warn!(
                "{} frame(s) of '{}' could not be decoded; frame alignment with other sources may be off near them",
                types.skipped, name
            );
        }

        let table = types.into_table(name);
        info!(
            "Classified {} frames of '{}' ({} B-frames)",
            table.total_frames(),
            name,
            table.count(FrameType::B)
        );

        Ok(Self {
            path: path.to_string(),
            table,
        })
    }

    /// Path the source was opened from
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Picture types in decode output order
///
/// A packet the decoder rejects still stands for one frame, so it is recorded
/// as `Unknown` to keep later indices aligned with the other sources.
#[derive(Debug, Default)]
struct FrameTypeLog {
    types: Vec<FrameType>,
    decoded: usize,
    skipped: usize,
}

impl FrameTypeLog {
    fn push_decoded(&mut self, kind: FrameType) {
        self.types.push(kind);
        self.decoded += 1;
        if self.types.len() % 10_000 == 0 {
            debug!("Decoded {} frames so far...", self.types.len());
        }
    }

    fn push_skipped(&mut self) {
        self.types.push(FrameType::Unknown);
        self.skipped += 1;
    }

    fn len(&self) -> usize {
        self.types.len()
    }

    fn into_table(self, name: &str) -> FrameTypeTable {
        FrameTypeTable::new(name, self.types)
    }
}

fn drain_frames(
    decoder: &mut ffmpeg::decoder::Video,
    frame: &mut ffmpeg::frame::Video,
    types: &mut FrameTypeLog,
) {
    while decoder.receive_frame(frame).is_ok() {
        types.push_decoded(FrameType::from(frame.kind()));
    }
}

impl FrameSource for LibavSource {
    fn name(&self) -> &str {
        self.table.name()
    }

    fn total_frames(&self) -> u64 {
        self.table.total_frames()
    }

    fn frame_type(&self, index: u64) -> FrameType {
        self.table.frame_type(index)
    }
}
