//! Probe and render against clips generated with the ffmpeg executable

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::Command as BinCommand;
use tempfile::TempDir;
use screencomp_cli::normalize::NormalizeOptions;
use screencomp_cli::probe::LibavSource;
use screencomp_cli::render::{FfmpegRenderer, Renderer};
use screencomp_cli::sampler::{select, SampleRequest};
use screencomp_cli::{FrameSource, FrameType, SourceSpec};

const CLIP_FRAMES: u64 = 50;

/// Encode a two second H.264 clip with B-frames
fn create_test_video(dir: &Path) -> PathBuf {
    let path = dir.join("clip.mp4");
    let output = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=2:size=320x240:rate=25",
            "-c:v",
            "libx264",
            "-bf",
            "3",
            "-g",
            "25",
            "-pix_fmt",
            "yuv420p",
            "-y",
        ])
        .arg(&path)
        .output()
        .expect("Failed to run ffmpeg");

    assert!(
        output.status.success(),
        "ffmpeg failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    path
}

fn first_b_frame(source: &LibavSource) -> u64 {
    (0..source.total_frames())
        .find(|&i| source.frame_type(i) == FrameType::B)
        .expect("clip should contain B-frames")
}

#[test]
fn test_libav_source_classifies_generated_clip() {
    let dir = TempDir::new().unwrap();
    let clip = create_test_video(dir.path());

    let source = LibavSource::open(clip.to_str().unwrap(), "clip").unwrap();
    assert_eq!(source.total_frames(), CLIP_FRAMES);
    assert_eq!(source.frame_type(0), FrameType::I);

    let b_frames = (0..CLIP_FRAMES)
        .filter(|&i| source.frame_type(i) == FrameType::B)
        .count();
    assert!(b_frames > 0);
    assert_eq!(source.frame_type(CLIP_FRAMES), FrameType::Unknown);
}

#[test]
fn test_selection_on_generated_clip_uses_b_frames() {
    let dir = TempDir::new().unwrap();
    let clip = create_test_video(dir.path());
    let source = LibavSource::open(clip.to_str().unwrap(), "clip").unwrap();

    let request = SampleRequest::new(vec![&source as &dyn FrameSource], 0, 5, 4);
    let selection = select(&request).unwrap();

    assert!(!selection.is_empty());
    for &frame in selection.frames() {
        assert!(frame < CLIP_FRAMES - 5);
        assert_eq!(source.frame_type(frame), FrameType::B);
    }
}

#[test]
fn test_render_writes_png_for_selected_frame() {
    let dir = TempDir::new().unwrap();
    let clip = create_test_video(dir.path());
    let source = LibavSource::open(clip.to_str().unwrap(), "clip").unwrap();
    let frame = first_b_frame(&source);

    let spec = SourceSpec::new(clip.to_str().unwrap(), "Clip")
        .with_normalize(NormalizeOptions::new().without_info().with_crop(10));
    let out_dir = dir.path().join("shots");
    let path = FfmpegRenderer::default()
        .render(0, &spec, frame, FrameType::B, &out_dir)
        .unwrap();

    assert_eq!(path.parent(), Some(out_dir.as_path()));
    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
}

#[test]
fn test_sample_command_renders_screenshots() {
    let dir = TempDir::new().unwrap();
    let clip = create_test_video(dir.path());
    let out_dir = dir.path().join("Screenshots");

    BinCommand::cargo_bin("screencomp")
        .unwrap()
        .env_remove("RUST_LOG")
        .args(["sample", "--start", "0", "--tail", "5", "--count", "3", "--json", "--source"])
        .arg(format!("{};noinfo", clip.display()))
        .arg("--output")
        .arg(&out_dir)
        .assert()
        .success();

    let shots: Vec<_> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(!shots.is_empty());
    assert!(shots.iter().all(|name| name.ends_with("_00_clip.png")));
}
