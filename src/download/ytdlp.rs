//! Thin wrapper around the yt-dlp tool: metadata lookup and download of a
//! video plus its best-effort WebVTT subtitles into a per-video folder.

use crate::download::VideoInfo;
use crate::error::{Result, VidsubError};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Languages requested from the subtitle writer, in preference order.
const SUBTITLE_LANGUAGES: &str = "en,en-US";

/// Check that yt-dlp is installed and accessible.
pub fn check_ytdlp() -> Result<()> {
    let output = Command::new("yt-dlp").arg("--version").output().map_err(|e| {
        VidsubError::Download(format!(
            "yt-dlp not found. Please install yt-dlp and ensure it's in your PATH. Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(VidsubError::Download("yt-dlp check failed".to_string()));
    }

    debug!("yt-dlp is available");
    Ok(())
}

#[derive(Deserialize)]
struct DumpedInfo {
    id: Option<String>,
    title: Option<String>,
}

/// Extract video id and title without downloading anything.
pub fn fetch_video_info(url: &str) -> Result<VideoInfo> {
    let output = Command::new("yt-dlp")
        .args(["--dump-json", "--skip-download", "--no-warnings"])
        .arg(url)
        .output()
        .map_err(|e| VidsubError::Download(format!("Failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidsubError::Download(format!(
            "yt-dlp metadata fetch failed: {}",
            stderr.trim()
        )));
    }

    let dumped: DumpedInfo = serde_json::from_slice(&output.stdout)?;
    Ok(VideoInfo {
        id: dumped.id.unwrap_or_else(|| "unknown".to_string()),
        title: dumped.title.unwrap_or_else(|| "Unknown".to_string()),
    })
}

/// Download the video and its subtitles into `video_folder`.
///
/// Writes the best available format plus manual and auto-generated WebVTT
/// subtitles for the requested languages. The subtitle file lands as
/// `<title>.<lang>.vtt` per the yt-dlp output template.
pub fn download(url: &str, video_folder: &Path) -> Result<()> {
    info!("Downloading {url} into {}", video_folder.display());

    let template = video_folder.join("%(title)s.%(ext)s");
    let output = Command::new("yt-dlp")
        .args(["--format", "best"])
        .args(["--output", &template.to_string_lossy()])
        .arg("--write-subs")
        .arg("--write-auto-subs")
        .args(["--sub-langs", SUBTITLE_LANGUAGES])
        .args(["--sub-format", "vtt"])
        .arg(url)
        .output()
        .map_err(|e| VidsubError::Download(format!("Failed to run yt-dlp: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VidsubError::Download(format!(
            "yt-dlp download failed: {}",
            stderr.trim()
        )));
    }

    info!("Download complete: {}", video_folder.display());
    Ok(())
}
