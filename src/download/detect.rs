//! Existing-download detection.
//!
//! Decides, per video, which pipeline stages can be skipped: a present video
//! file skips the download, a present translated subtitle skips translation.

use super::VideoInfo;
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "avi", "mov", "flv", "m4v"];

/// What already exists on disk for one video.
#[derive(Debug, Clone, Default)]
pub struct ExistingDownload {
    pub folder: PathBuf,
    pub folder_exists: bool,
    pub video_files: Vec<String>,
    /// Subtitle files keyed by the file name, e.g. `Talk.en.vtt`.
    pub subtitle_files: Vec<String>,
}

impl ExistingDownload {
    pub fn has_video(&self) -> bool {
        !self.video_files.is_empty()
    }

    /// Path of the subtitle with the given language suffix, if present.
    pub fn subtitle_path(&self, code: &str) -> Option<PathBuf> {
        let suffix = format!(".{code}.vtt");
        self.subtitle_files
            .iter()
            .find(|f| f.ends_with(&suffix))
            .map(|f| self.folder.join(f))
    }
}

/// Scan the output root for a folder matching this video's identity.
pub fn check_existing(output_dir: &Path, info: &VideoInfo) -> ExistingDownload {
    let folder = output_dir.join(info.folder_name());
    let mut existing = ExistingDownload {
        folder: folder.clone(),
        ..Default::default()
    };

    let Ok(entries) = std::fs::read_dir(&folder) else {
        return existing;
    };
    existing.folder_exists = true;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        match path.extension().map(|e| e.to_string_lossy().to_lowercase()) {
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => {
                existing.video_files.push(name);
            }
            Some(ext) if ext == "vtt" => {
                existing.subtitle_files.push(name);
            }
            _ => {}
        }
    }

    existing.video_files.sort();
    existing.subtitle_files.sort();
    existing
}
