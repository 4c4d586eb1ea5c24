//! End-to-end run: fetch metadata, download the video with subtitles unless
//! it already exists, then translate the subtitle track.

use crate::config::Config;
use crate::download::{self, detect, ytdlp};
use crate::error::{Result, VidsubError};
use crate::subtitle::language_code_for;
use crate::translate::claude::ClaudeTranslator;
use crate::translate::client::TranslationClient;
use crate::translate::orchestrator::{SkipReason, TranslationOrchestrator, TranslationOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Result of one full pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    pub video_folder: PathBuf,
    pub video_downloaded: bool,
    pub translation: Vec<TranslationOutcome>,
    pub total_time: Duration,
}

fn spinner(show: bool, message: &str) -> Option<ProgressBar> {
    show.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    })
}

/// Download a video (if not already present) and translate its subtitles
/// (if enabled and not already translated).
pub async fn run_url(url: &str, config: &Config, show_progress: bool) -> Result<PipelineReport> {
    let start = Instant::now();

    download::validate_url(url)?;
    ytdlp::check_ytdlp()?;

    // Stage 1: metadata
    let pb = spinner(show_progress, "Fetching video info...");
    let video_info = ytdlp::fetch_video_info(url)?;
    if let Some(pb) = pb {
        pb.finish_with_message(format!("Found: {}", video_info.title));
    }
    info!("Video: {} ({})", video_info.title, video_info.id);

    // Stage 2: download, skipped when the video file already exists
    let existing = detect::check_existing(&config.output_dir, &video_info);
    let video_folder = existing.folder.clone();
    let video_downloaded = if existing.has_video() {
        info!(
            "Video already downloaded: {:?} in {}",
            existing.video_files,
            video_folder.display()
        );
        false
    } else {
        let folder = download::create_video_folder(&config.output_dir, &video_info)?;
        let pb = spinner(show_progress, "Downloading video and subtitles...");
        ytdlp::download(url, &folder)?;
        if let Some(pb) = pb {
            pb.finish_with_message("Download complete");
        }
        true
    };

    // Stage 3: translation. A target-language subtitle found during detection
    // short-circuits before the provider client is even built, so re-running on
    // an already-translated video needs no API key.
    let target_code = language_code_for(&config.translation.target_language);
    let translation = if !config.translation.enabled {
        info!("Translation disabled, skipping");
        Vec::new()
    } else if let Some(path) = existing.subtitle_path(target_code) {
        info!(
            "Target-language subtitles already present: {}",
            path.display()
        );
        vec![TranslationOutcome::Skipped(SkipReason::AlreadyTranslated(
            path,
        ))]
    } else {
        let mut orchestrator = build_orchestrator(config, show_progress)?;
        orchestrator.translate_folder(&video_folder).await?
    };

    Ok(PipelineReport {
        video_folder,
        video_downloaded,
        translation,
        total_time: start.elapsed(),
    })
}

/// Translate an existing subtitle file or video folder without downloading.
pub async fn run_translate_only(
    path: &Path,
    config: &Config,
    show_progress: bool,
) -> Result<Vec<TranslationOutcome>> {
    let mut orchestrator = build_orchestrator(config, show_progress)?;

    if path.is_dir() {
        orchestrator.translate_folder(path).await
    } else if path.extension().is_some_and(|e| e == "vtt") {
        Ok(vec![orchestrator.translate_file(path).await?])
    } else {
        Err(VidsubError::FileNotFound(format!(
            "{} is neither a .vtt file nor a folder",
            path.display()
        )))
    }
}

/// Wire the provider, rate-limited client, and orchestrator together from
/// the config. Fails fast when translation is enabled without credentials.
pub fn build_orchestrator(config: &Config, show_progress: bool) -> Result<TranslationOrchestrator> {
    let api_key = config.anthropic_api_key.as_ref().ok_or_else(|| {
        VidsubError::Config(
            "Anthropic API key not set. Set ANTHROPIC_API_KEY environment variable.".to_string(),
        )
    })?;

    let translator = ClaudeTranslator::new(api_key.clone())
        .with_model(config.translation.model.clone())
        .with_max_tokens(config.translation.max_tokens);

    let client = TranslationClient::new(
        Box::new(translator),
        Duration::from_millis(config.translation.rate_limit_delay_ms),
        config.translation.max_retries,
    );

    Ok(TranslationOrchestrator::new(client, &config.translation).with_progress(show_progress))
}

/// Print a human-readable summary of the run.
pub fn print_summary(report: &PipelineReport) {
    println!();
    println!("Folder:     {}", report.video_folder.display());
    println!(
        "Video:      {}",
        if report.video_downloaded {
            "downloaded"
        } else {
            "already present"
        }
    );
    print_translation_summary(&report.translation);
    println!("Total time: {:.1}s", report.total_time.as_secs_f64());
}

pub fn print_translation_summary(outcomes: &[TranslationOutcome]) {
    for outcome in outcomes {
        match outcome {
            TranslationOutcome::Completed(r) => {
                let status = if r.is_partial() {
                    format!("partial, batches {:?} fell back", r.failed_batches)
                } else {
                    "complete".to_string()
                };
                match &r.output_path {
                    Some(path) => println!(
                        "Subtitles:  {}/{} cues translated ({status}) -> {}",
                        r.translated_cues,
                        r.total_cues,
                        path.display()
                    ),
                    None => println!(
                        "Subtitles:  0/{} cues translated, no output written",
                        r.total_cues
                    ),
                }
            }
            TranslationOutcome::Skipped(SkipReason::NoSource) => {
                println!("Subtitles:  no source subtitles to translate");
            }
            TranslationOutcome::Skipped(SkipReason::EmptyDocument) => {
                println!("Subtitles:  source contained no cues");
            }
            TranslationOutcome::Skipped(SkipReason::AlreadyTranslated(path)) => {
                println!("Subtitles:  already translated -> {}", path.display());
            }
            TranslationOutcome::Skipped(SkipReason::NativeAvailable(path)) => {
                println!("Subtitles:  native subtitles available -> {}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_orchestrator_requires_api_key() {
        let config = Config::default();
        assert!(build_orchestrator(&config, false).is_err());
    }

    #[test]
    fn test_build_orchestrator_with_key() {
        let mut config = Config::default();
        config.anthropic_api_key = Some("sk-ant-test".to_string());
        let orchestrator = build_orchestrator(&config, false).unwrap();
        assert_eq!(orchestrator.target_code(), "vi");
    }

    #[tokio::test]
    async fn test_translate_only_rejects_non_vtt_file() {
        let mut config = Config::default();
        config.anthropic_api_key = Some("sk-ant-test".to_string());
        let result = run_translate_only(Path::new("/tmp/video.mp4"), &config, false).await;
        assert!(matches!(result, Err(VidsubError::FileNotFound(_))));
    }
}
