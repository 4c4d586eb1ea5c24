pub mod detect;
pub mod ytdlp;

use crate::error::{Result, VidsubError};
use std::path::{Path, PathBuf};

/// Metadata the acquisition tool reports for a video before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
}

impl VideoInfo {
    /// Folder name for this video under the output root.
    pub fn folder_name(&self) -> String {
        format!("{}_{}", sanitize_filename(&self.title), self.id)
    }
}

const VALID_URL_PREFIXES: &[&str] = &[
    "https://www.youtube.com/",
    "https://youtube.com/",
    "https://youtu.be/",
];

/// Check that the given string looks like a downloadable video URL.
pub fn validate_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(VidsubError::Download("Please enter a video URL".to_string()));
    }
    if !VALID_URL_PREFIXES.iter().any(|p| url.starts_with(p)) {
        return Err(VidsubError::Download(format!(
            "Not a valid YouTube URL: {url}"
        )));
    }
    Ok(())
}

/// Replace characters that are invalid in filenames on common platforms.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Create (if needed) and return the per-video folder for a download.
pub fn create_video_folder(output_dir: &Path, info: &VideoInfo) -> Result<PathBuf> {
    let folder = output_dir.join(info.folder_name());
    std::fs::create_dir_all(&folder)?;
    Ok(folder)
}
