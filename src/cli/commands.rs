//! Command implementations

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::args::{PublishArgs, SampleArgs};
use crate::config::{PublishConfig, SampleConfig};
use crate::probe::{FrameSource, LibavSource};
use crate::publish::{PtpImgUploader, PublishReport, Publisher};
use crate::render::{FfmpegRenderer, Renderer};
use crate::sampler::{self, FrameSelection, SamplePlan, SampleRequest};

/// Selection output for `--json`
#[derive(Serialize)]
struct SampleOutput<'a> {
    plan: SamplePlan,
    frames: &'a FrameSelection,
    screenshots: &'a [PathBuf],
}

/// Execute the sample command
pub fn sample(args: SampleArgs) -> Result<()> {
    info!("Starting sample operation");

    let mut config = SampleConfig::new(args.sources, args.start, args.tail, args.count)?
        .with_ffmpeg_path(args.ffmpeg);
    if let Some(dir) = args.output {
        config = config.with_output_dir(dir);
    }

    let screenshots = run_sample(&config, args.json)?;
    info!("Sample operation completed: {} screenshot(s)", screenshots.len());
    Ok(())
}

/// Probe, select and optionally render, printing the result
pub fn run_sample(config: &SampleConfig, json: bool) -> Result<Vec<PathBuf>> {
    crate::init().context("Failed to initialize FFmpeg")?;

    let mut sources = Vec::with_capacity(config.sources.len());
    for spec in &config.sources {
        let source = LibavSource::open(&spec.path, &spec.name)
            .with_context(|| format!("Failed to open source '{}'", spec.name))?;
        sources.push(source);
    }

    let reference = sources[0].total_frames();
    for source in &sources[1..] {
        if source.total_frames() != reference {
            warn!(
                "'{}' has {} frames but '{}' has {}; sources may not be aligned",
                source.name(),
                source.total_frames(),
                sources[0].name(),
                reference
            );
        }
    }

    let request = SampleRequest::new(
        sources.iter().map(|s| s as &dyn FrameSource).collect(),
        config.start_offset,
        config.tail_margin,
        config.frame_count,
    );
    let plan = request.plan()?;
    let selection = sampler::select(&request)?;

    if selection.has_duplicates() {
        warn!("Adjacent slots selected the same frame; duplicates are kept");
    }

    let screenshots = match &config.output_dir {
        Some(dir) => render_all(config, &sources, &selection, dir)?,
        None => Vec::new(),
    };

    if json {
        let output = SampleOutput {
            plan,
            frames: &selection,
            screenshots: &screenshots,
        };
        let json = serde_json::to_string_pretty(&output)
            .context("Failed to serialize selection to JSON")?;
        println!("{}", json);
    } else {
        display_selection(&plan, &selection);
        for path in &screenshots {
            println!("Saved {}", path.display());
        }
    }

    Ok(screenshots)
}

fn render_all(
    config: &SampleConfig,
    sources: &[LibavSource],
    selection: &FrameSelection,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let renderer = FfmpegRenderer::new(config.ffmpeg_path.clone());
    let mut paths = Vec::new();

    for &frame in selection.frames() {
        for (index, (spec, source)) in config.sources.iter().zip(sources).enumerate() {
            let path = renderer
                .render(index, spec, frame, source.frame_type(frame), output_dir)
                .with_context(|| format!("Failed to render frame {} of '{}'", frame, spec.name))?;
            paths.push(path);
        }
    }

    Ok(paths)
}

/// Execute the publish command
pub fn publish(args: PublishArgs) -> Result<()> {
    info!("Starting publish operation");

    let backup = args
        .backup
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(&args.dir).join("Backup"));

    let config = PublishConfig::new(&args.dir, backup, args.api_key)?
        .with_timeout(Duration::from_secs(args.timeout_secs))
        .with_source_names(args.source_names);

    let report = run_publish(&config, args.json)?;
    info!(
        "Publish operation completed: {} uploaded, {} failed",
        report.backed_up(),
        report.failed()
    );
    Ok(())
}

/// Upload everything in the configured directory, printing progress and the manifest
pub fn run_publish(config: &PublishConfig, json: bool) -> Result<PublishReport> {
    let uploader = PtpImgUploader::new(
        config.endpoint.clone(),
        config.api_key.clone(),
        config.timeout,
    )?;
    let publisher = Publisher::new(config, uploader);

    let report = publisher
        .publish_with(|unit| {
            if !json {
                println!("{}", unit.progress_line());
            }
        })
        .with_context(|| format!("Failed to publish from {}", config.source_dir.display()))?;

    if json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize publish report to JSON")?;
        println!("{}", json);
    } else {
        println!();
        print!("{}", report.manifest);
    }

    Ok(report)
}

/// Display the selection in human-readable format
fn display_selection(plan: &SamplePlan, selection: &FrameSelection) {
    println!("Frame Selection");
    println!("===============");
    println!("Range: [{}, {}) step {}", plan.start, plan.end, plan.step);
    println!("Found: {} of {}", selection.len(), plan.target_count);
    let frames: Vec<String> = selection.frames().iter().map(u64::to_string).collect();
    println!("Frames: {}", frames.join(", "));
}
