//! Screenshot publishing: upload, back up, and collect links
//!
//! Every image is an independent unit of work. A unit is only moved to the
//! backup directory after its upload succeeded, so re-running a batch picks
//! up exactly the files that did not make it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PublishConfig;
use crate::error::CompResult;

pub mod manifest;
pub mod uploader;

pub use manifest::Manifest;
pub use uploader::{parse_upload_response, PtpImgUploader, RemoteImage, UploadError, Uploader};

/// One pending image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadUnit {
    pub path: PathBuf,
    /// File name, used for the upload and the backup copy
    pub logical_name: String,
}

/// Step at which a unit failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureStage {
    /// The file could not be read
    Read,
    /// The upload itself failed; nothing happened remotely
    Upload,
    /// Uploaded, but the move to the backup directory failed
    Backup,
}

/// Terminal state of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UnitState {
    /// Uploaded and moved to the backup directory
    BackedUp { link: String, backup_path: PathBuf },
    /// Left in the source directory for a later run
    Failed {
        stage: FailureStage,
        error: String,
        /// Set when the upload went through before the failure
        link: Option<String>,
    },
}

/// Outcome of a single unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: UploadUnit,
    pub state: UnitState,
}

impl UnitReport {
    /// True when the unit reached the backup directory
    pub fn is_backed_up(&self) -> bool {
        matches!(self.state, UnitState::BackedUp { .. })
    }

    /// Human-readable progress line
    pub fn progress_line(&self) -> String {
        match &self.state {
            UnitState::BackedUp { .. } => {
                format!("Uploaded {} successfully.", self.unit.logical_name)
            }
            UnitState::Failed {
                stage: FailureStage::Upload,
                error,
                ..
            } => format!("Failed to upload {}: {}", self.unit.logical_name, error),
            UnitState::Failed { error, .. } => {
                format!("Error processing {}: {}", self.unit.logical_name, error)
            }
        }
    }
}

/// Result of a publish run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub units: Vec<UnitReport>,
    pub manifest: Manifest,
}

impl PublishReport {
    /// Units that were uploaded and backed up
    pub fn backed_up(&self) -> usize {
        self.units.iter().filter(|u| u.is_backed_up()).count()
    }

    /// Units left for a later run
    pub fn failed(&self) -> usize {
        self.units.len() - self.backed_up()
    }
}

/// List publishable files in `dir`, sorted by file name
///
/// Only regular files whose extension matches `extension` (ignoring case)
/// are returned.
pub fn collect_units(dir: &Path, extension: &str) -> CompResult<Vec<UploadUnit>> {
    let mut units = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let logical_name = entry.file_name().to_string_lossy().to_string();
        units.push(UploadUnit { path, logical_name });
    }

    units.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
    Ok(units)
}

/// Move a file into the backup directory
///
/// A plain rename is tried first. Only a cross-device rename falls back to
/// copy and remove. On any failure the file is left in exactly one place: the
/// source stays and nothing is left behind at `to`.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!("Rename across devices, copying {} instead", from.display());
            copy_then_remove(from, to, |path| fs::remove_file(path))
        }
        Err(e) => Err(e),
    }
}

/// Copy `from` to `to`, then remove `from` with `remove`
///
/// If either step fails the copy at `to` is deleted before the error is
/// returned.
pub fn copy_then_remove<R>(from: &Path, to: &Path, remove: R) -> io::Result<()>
where
    R: FnOnce(&Path) -> io::Result<()>,
{
    let result = fs::copy(from, to).and_then(|_| remove(from));
    if let Err(e) = &result {
        if to.is_file() {
            if let Err(cleanup) = fs::remove_file(to) {
                warn!(
                    "Could not remove partial copy {} after '{}': {}",
                    to.display(),
                    e,
                    cleanup
                );
            }
        }
    }
    result
}

#[cfg(unix)]
fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(windows)]
fn is_cross_device(err: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    err.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_err: &io::Error) -> bool {
    false
}

/// Drains a screenshot directory into an image host
pub struct Publisher<U: Uploader> {
    uploader: U,
    source_dir: PathBuf,
    backup_dir: PathBuf,
    extension: String,
    public_host: String,
    source_names: Vec<String>,
}

impl<U: Uploader> Publisher<U> {
    /// Create a publisher from a validated configuration
    pub fn new(config: &PublishConfig, uploader: U) -> Self {
        Self {
            uploader,
            source_dir: config.source_dir.clone(),
            backup_dir: config.backup_dir.clone(),
            extension: config.extension.clone(),
            public_host: config.endpoint.public_host.clone(),
            source_names: config.source_names.clone(),
        }
    }

    /// Publish every pending image
    pub fn publish(&self) -> CompResult<PublishReport> {
        self.publish_with(|_| {})
    }

    /// Publish every pending image, reporting each unit as it finishes
    ///
    /// Only listing the source directory can fail the run; per-unit failures
    /// are recorded in the report and the batch continues.
    pub fn publish_with<F>(&self, mut on_unit: F) -> CompResult<PublishReport>
    where
        F: FnMut(&UnitReport),
    {
        let units = collect_units(&self.source_dir, &self.extension)?;
        info!(
            "Publishing {} file(s) from {}",
            units.len(),
            self.source_dir.display()
        );

        let mut report = PublishReport {
            units: Vec::with_capacity(units.len()),
            manifest: Manifest::with_sources(self.source_names.clone()),
        };

        for unit in units {
            let state = self.process(&unit, &mut report.manifest);
            let unit_report = UnitReport { unit, state };
            on_unit(&unit_report);
            report.units.push(unit_report);
        }

        info!(
            "Publish finished: {} backed up, {} failed",
            report.backed_up(),
            report.failed()
        );
        Ok(report)
    }

    fn process(&self, unit: &UploadUnit, manifest: &mut Manifest) -> UnitState {
        let bytes = match fs::read(&unit.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", unit.logical_name, e);
                return UnitState::Failed {
                    stage: FailureStage::Read,
                    error: e.to_string(),
                    link: None,
                };
            }
        };

        let image = match self.uploader.upload(&unit.logical_name, bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to upload {}: {}", unit.logical_name, e);
                return UnitState::Failed {
                    stage: FailureStage::Upload,
                    error: e.to_string(),
                    link: None,
                };
            }
        };

        let link = image.link(&self.public_host);
        manifest.push(link.clone());

        // The remote copy already exists at this point. If the move fails the
        // file stays only in the source directory and a rerun uploads it again.
        let backup_path = self.backup_dir.join(&unit.logical_name);
        match move_file(&unit.path, &backup_path) {
            Ok(()) => {
                info!("Uploaded {} -> {}", unit.logical_name, link);
                UnitState::BackedUp { link, backup_path }
            }
            Err(e) => {
                warn!(
                    "Uploaded {} but could not move it to {}: {}",
                    unit.logical_name,
                    backup_path.display(),
                    e
                );
                UnitState::Failed {
                    stage: FailureStage::Backup,
                    error: format!("backup move failed: {}", e),
                    link: Some(link),
                }
            }
        }
    }
}
