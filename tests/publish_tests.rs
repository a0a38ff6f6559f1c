//! Integration tests for the publish pipeline

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use screencomp_cli::publish::{
    FailureStage, Publisher, RemoteImage, UnitState, UploadError, Uploader,
};
use screencomp_cli::PublishConfig;

/// Uploader that fails for selected file names and records every call
struct FakeUploader {
    failing: HashSet<String>,
    calls: RefCell<Vec<String>>,
}

impl FakeUploader {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Uploader for FakeUploader {
    fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<RemoteImage, UploadError> {
        self.calls.borrow_mut().push(file_name.to_string());
        assert!(!bytes.is_empty(), "upload should carry file contents");

        if self.failing.contains(file_name) {
            return Err(UploadError::HttpStatus {
                status: 500,
                body: "server error".to_string(),
            });
        }

        let stem = file_name.trim_end_matches(".png");
        Ok(RemoteImage {
            code: format!("code{}", stem),
            ext: "png".to_string(),
        })
    }
}

struct Workspace {
    _root: TempDir,
    source: std::path::PathBuf,
    backup: std::path::PathBuf,
}

fn workspace(files: &[&str]) -> Workspace {
    let root = TempDir::new().unwrap();
    let source = root.path().join("Screenshots");
    let backup = source.join("Backup");
    fs::create_dir_all(&backup).unwrap();
    for name in files {
        fs::write(source.join(name), format!("image bytes of {}", name)).unwrap();
    }
    Workspace {
        _root: root,
        source,
        backup,
    }
}

fn config(ws: &Workspace) -> PublishConfig {
    PublishConfig::new(&ws.source, &ws.backup, Some("test-key".to_string())).unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_partial_failure_backs_up_only_successes() {
    let ws = workspace(&["1.png", "2.png", "3.png"]);
    let uploader = FakeUploader::new(&["2.png"]);
    let publisher = Publisher::new(&config(&ws), &uploader);

    let report = publisher.publish().unwrap();

    assert_eq!(listing(&ws.backup), vec!["1.png", "3.png"]);
    assert_eq!(listing(&ws.source), vec!["2.png"]);
    assert_eq!(
        report.manifest.links(),
        &["https://ptpimg.me/code1.png", "https://ptpimg.me/code3.png"]
    );
    assert_eq!(report.backed_up(), 2);
    assert_eq!(report.failed(), 1);

    match &report.units[1].state {
        UnitState::Failed { stage, link, .. } => {
            assert_eq!(*stage, FailureStage::Upload);
            assert!(link.is_none());
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[test]
fn test_rerun_uploads_only_remaining_file() {
    let ws = workspace(&["1.png", "2.png", "3.png"]);

    let first = FakeUploader::new(&["2.png"]);
    Publisher::new(&config(&ws), &first).publish().unwrap();
    assert_eq!(first.calls(), vec!["1.png", "2.png", "3.png"]);

    let second = FakeUploader::new(&[]);
    let report = Publisher::new(&config(&ws), &second).publish().unwrap();

    assert_eq!(second.calls(), vec!["2.png"]);
    assert_eq!(report.manifest.links(), &["https://ptpimg.me/code2.png"]);
    assert!(listing(&ws.source).is_empty());
    assert_eq!(listing(&ws.backup), vec!["1.png", "2.png", "3.png"]);
}

#[test]
fn test_files_processed_in_sorted_order() {
    let ws = workspace(&["b.png", "c.png", "a.png"]);
    let uploader = FakeUploader::new(&[]);
    let report = Publisher::new(&config(&ws), &uploader).publish().unwrap();

    assert_eq!(uploader.calls(), vec!["a.png", "b.png", "c.png"]);
    assert_eq!(
        report.manifest.render(),
        "[comparison=set,these,manually]\n\
         https://ptpimg.me/codea.png\n\
         https://ptpimg.me/codeb.png\n\
         https://ptpimg.me/codec.png\n\
         [/comparison]\n"
    );
}

#[test]
fn test_non_images_are_ignored() {
    let ws = workspace(&["1.png", "notes.txt", "2.PNG"]);
    let uploader = FakeUploader::new(&[]);
    Publisher::new(&config(&ws), &uploader).publish().unwrap();

    assert_eq!(uploader.calls(), vec!["1.png", "2.PNG"]);
    assert_eq!(listing(&ws.source), vec!["notes.txt"]);
}

#[test]
fn test_backup_move_failure_keeps_file_and_link() {
    let ws = workspace(&["1.png", "2.png"]);
    // A non-empty directory where the backup copy should go makes the move fail.
    let blocker = ws.backup.join("2.png");
    fs::create_dir_all(&blocker).unwrap();
    fs::write(blocker.join("keep"), b"x").unwrap();

    let uploader = FakeUploader::new(&[]);
    let report = Publisher::new(&config(&ws), &uploader).publish().unwrap();

    assert_eq!(listing(&ws.source), vec!["2.png"]);
    assert_eq!(listing(&ws.backup), vec!["1.png"]);
    assert_eq!(report.manifest.len(), 2);

    match &report.units[1].state {
        UnitState::Failed { stage, link, .. } => {
            assert_eq!(*stage, FailureStage::Backup);
            assert_eq!(link.as_deref(), Some("https://ptpimg.me/code2.png"));
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[test]
fn test_progress_callback_sees_every_unit() {
    let ws = workspace(&["1.png", "2.png"]);
    let uploader = FakeUploader::new(&["1.png"]);
    let mut lines = Vec::new();

    Publisher::new(&config(&ws), &uploader)
        .publish_with(|unit| lines.push(unit.progress_line()))
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Failed to upload 1.png: HTTP 500"));
    assert_eq!(lines[1], "Uploaded 2.png successfully.");
}

#[test]
fn test_named_sources_in_manifest_header() {
    let ws = workspace(&["1.png"]);
    let config = config(&ws).with_source_names(vec!["Remux".to_string(), "Encode".to_string()]);
    let uploader = FakeUploader::new(&[]);
    let report = Publisher::new(&config, &uploader).publish().unwrap();

    assert!(report.manifest.render().starts_with("[comparison=Remux, Encode]\n"));
}

#[test]
fn test_empty_directory_gives_empty_manifest() {
    let ws = workspace(&[]);
    let uploader = FakeUploader::new(&[]);
    let report = Publisher::new(&config(&ws), &uploader).publish().unwrap();

    assert!(report.units.is_empty());
    assert!(report.manifest.is_empty());
}
