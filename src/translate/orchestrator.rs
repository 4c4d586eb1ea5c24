//! Drives the end-to-end subtitle translation flow: locate source file →
//! parse → plan batches → translate → reassemble → write.
//!
//! The run is non-destructive and tolerant of partial failure: a batch that
//! exhausts its retries falls back to original text instead of aborting the
//! document, and the output file is only ever written in one piece.

use crate::config::TranslationConfig;
use crate::error::Result;
use crate::subtitle::clean::clean_translations;
use crate::subtitle::vtt::{self, TextSelection};
use crate::subtitle::{language_code_for, SubtitleDocument};
use crate::translate::batch::{plan_batches, CueBatch};
use crate::translate::client::{BatchOutcome, TranslationClient};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Why a run produced no output file. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No source subtitle file to translate.
    NoSource,
    /// The source parsed to zero cues.
    EmptyDocument,
    /// A translated sibling already exists on disk.
    AlreadyTranslated(PathBuf),
    /// The provider already ships native subtitles in the target language.
    NativeAvailable(PathBuf),
}

#[derive(Debug)]
pub enum TranslationOutcome {
    Skipped(SkipReason),
    Completed(TranslationReport),
}

/// What a completed run did, cue by cue. Callers always see translated vs
/// fallback counts so partial degradation is never invisible.
#[derive(Debug, Clone)]
pub struct TranslationReport {
    /// None when every batch fell back: an output identical in text to the
    /// source is not worth writing.
    pub output_path: Option<PathBuf>,
    pub total_cues: usize,
    pub translated_cues: usize,
    pub fallback_cues: usize,
    /// Indices of batches whose cues fell back to original text.
    pub failed_batches: Vec<usize>,
    pub parse_warnings: usize,
}

impl TranslationReport {
    pub fn is_partial(&self) -> bool {
        self.fallback_cues > 0 || !self.failed_batches.is_empty()
    }
}

pub struct TranslationOrchestrator {
    client: TranslationClient,
    target_language: String,
    batch_size: usize,
    show_progress: bool,
}

impl TranslationOrchestrator {
    pub fn new(client: TranslationClient, config: &TranslationConfig) -> Self {
        Self {
            client,
            target_language: config.target_language.clone(),
            batch_size: config.batch_size,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn target_code(&self) -> &'static str {
        language_code_for(&self.target_language)
    }

    /// Translate a single WebVTT file, writing `<base>.<target-code>.vtt`
    /// alongside it. The source file is never modified.
    pub async fn translate_file(&mut self, source: &Path) -> Result<TranslationOutcome> {
        if !source.exists() {
            info!("No source subtitles at {}", source.display());
            return Ok(TranslationOutcome::Skipped(SkipReason::NoSource));
        }

        // A file already carrying the target suffix would translate onto
        // itself; never write over the input.
        if has_language_suffix(source, self.target_code()) {
            info!(
                "{} is already in the target language, leaving it untouched",
                source.display()
            );
            return Ok(TranslationOutcome::Skipped(SkipReason::NativeAvailable(
                source.to_path_buf(),
            )));
        }

        let raw = fs::read_to_string(source)?;
        let mut document = vtt::parse(&raw);
        for warning in &document.warnings {
            debug!("{}: {warning}", source.display());
        }

        if document.is_empty() {
            info!("{} parsed to zero cues, nothing to translate", source.display());
            return Ok(TranslationOutcome::Skipped(SkipReason::EmptyDocument));
        }

        info!(
            "Translating {} cues from {} to {}",
            document.len(),
            source.display(),
            self.target_language
        );

        let failed_batches = self.translate_document(&mut document).await?;

        // Model preambles and leftover markup have no place in the output.
        clean_translations(&mut document);

        // Counted after cleaning: a translation emptied by cleanup is a
        // fallback like any other.
        let payload_cues = document
            .cues
            .iter()
            .filter(|c| !c.text.trim().is_empty())
            .count();
        let translated_cues = document
            .cues
            .iter()
            .filter(|c| c.translated_text.is_some())
            .count();

        let output_path = if translated_cues > 0 {
            let path = self.output_path_for(source);
            let output_text = vtt::serialize(&document, TextSelection::PreferTranslated);
            // Built fully in memory first; one write, so a failure leaves no
            // partial file behind.
            fs::write(&path, output_text)?;
            Some(path)
        } else {
            warn!(
                "No cues could be translated for {}, not writing an output file",
                source.display()
            );
            None
        };

        let report = TranslationReport {
            output_path,
            total_cues: document.len(),
            translated_cues,
            fallback_cues: payload_cues - translated_cues,
            failed_batches,
            parse_warnings: document.warnings.len(),
        };

        if report.is_partial() {
            warn!(
                "Completed (partial): {}/{} cues translated, batches {:?} fell back",
                report.translated_cues, report.total_cues, report.failed_batches
            );
        } else if let Some(path) = &report.output_path {
            info!(
                "Completed: {}/{} cues translated -> {}",
                report.translated_cues,
                report.total_cues,
                path.display()
            );
        }

        Ok(TranslationOutcome::Completed(report))
    }

    /// Translate every source-language subtitle file in a video folder.
    ///
    /// Native target-language subtitles win over machine translation, and
    /// files that already have a translated sibling are not re-translated.
    pub async fn translate_folder(&mut self, folder: &Path) -> Result<Vec<TranslationOutcome>> {
        let code = self.target_code();
        let vtt_files = list_vtt_files(folder)?;

        if vtt_files.is_empty() {
            info!("No subtitle files found in {}", folder.display());
            return Ok(vec![TranslationOutcome::Skipped(SkipReason::NoSource)]);
        }

        if let Some(native) = vtt_files.iter().find(|f| has_language_suffix(f, code)) {
            info!("Using native {code} subtitles: {}", native.display());
            return Ok(vec![TranslationOutcome::Skipped(
                SkipReason::NativeAvailable(native.clone()),
            )]);
        }

        let mut outcomes = Vec::new();
        for source in vtt_files {
            // Skip anything that is itself a translation output.
            if TRANSLATED_CODES.iter().any(|c| has_language_suffix(&source, c)) {
                continue;
            }

            let expected = self.output_path_for(&source);
            if expected.exists() {
                info!("Using existing translated subtitles: {}", expected.display());
                outcomes.push(TranslationOutcome::Skipped(SkipReason::AlreadyTranslated(
                    expected,
                )));
                continue;
            }

            outcomes.push(self.translate_file(&source).await?);
        }

        // Every file was a translation output for some other language.
        if outcomes.is_empty() {
            info!(
                "No translatable source subtitles in {}",
                folder.display()
            );
            outcomes.push(TranslationOutcome::Skipped(SkipReason::NoSource));
        }

        Ok(outcomes)
    }

    /// Output filename: strip a trailing source-language suffix (e.g. `.en`)
    /// from the stem, then append the target code.
    fn output_path_for(&self, source: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let base = strip_language_suffix(&stem);
        source.with_file_name(format!("{base}.{}.vtt", self.target_code()))
    }

    /// Translate all batches in order, writing results into the document.
    /// Returns the indices of batches that fell back to original text.
    async fn translate_document(&mut self, document: &mut SubtitleDocument) -> Result<Vec<usize>> {
        let batches = plan_batches(&document.cues, self.batch_size);
        let mut failed_batches = Vec::new();

        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new(batches.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] batch {pos}/{len}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        for batch in &batches {
            let positions = batch.payload_positions();
            if positions.is_empty() {
                // All-blank batch: pass through unchanged, no provider call.
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                continue;
            }

            let payload: Vec<&str> = positions.iter().map(|&i| batch.texts[i].as_str()).collect();
            let outcome = self
                .client
                .translate_batch(&payload, &self.target_language)
                .await?;

            match outcome {
                BatchOutcome::Translated(translations) => {
                    apply_batch(document, batch, &positions, translations);
                }
                BatchOutcome::Failed { attempts, reason } => {
                    warn!(
                        "Batch {} failed after {attempts} attempt(s) ({reason}); keeping original text",
                        batch.index
                    );
                    failed_batches.push(batch.index);
                }
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(failed_batches)
    }
}

/// Scatter one batch's translations back into the document by cue index.
/// An empty translation for non-empty source text counts as a per-entry
/// failure: that cue keeps its original text.
fn apply_batch(
    document: &mut SubtitleDocument,
    batch: &CueBatch,
    positions: &[usize],
    translations: Vec<String>,
) {
    for (&pos, translation) in positions.iter().zip(translations) {
        let cue_index = batch.cue_indices[pos];
        if translation.trim().is_empty() {
            debug!("Empty translation for cue {cue_index}, keeping original");
            continue;
        }
        document.cues[cue_index].translated_text = Some(translation);
    }
}

/// Language suffixes that mark a file as already translated.
const TRANSLATED_CODES: &[&str] = &["vi", "es", "fr", "de", "zh", "ja", "ko", "trans"];

fn list_vtt_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "vtt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Whether the file stem ends with `.{code}` (e.g. `talk.vi` for "vi").
fn has_language_suffix(path: &Path, code: &str) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().ends_with(&format!(".{code}")))
        .unwrap_or(false)
}

/// Strip a short trailing language tag (`name.en` -> `name`), leaving stems
/// without one untouched.
fn strip_language_suffix(stem: &str) -> &str {
    match stem.rsplit_once('.') {
        Some((base, tag))
            if !base.is_empty()
                && (2..=5).contains(&tag.len())
                && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            base
        }
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_language_suffix() {
        assert_eq!(strip_language_suffix("My Talk.en"), "My Talk");
        assert_eq!(strip_language_suffix("My Talk.en-US"), "My Talk");
        assert_eq!(strip_language_suffix("My Talk"), "My Talk");
        assert_eq!(strip_language_suffix("archive.backup"), "archive.backup");
    }

    #[test]
    fn test_has_language_suffix() {
        assert!(has_language_suffix(Path::new("/x/talk.vi.vtt"), "vi"));
        assert!(!has_language_suffix(Path::new("/x/talk.en.vtt"), "vi"));
        assert!(!has_language_suffix(Path::new("/x/talk.vtt"), "vi"));
    }

    #[test]
    fn test_report_partial_flag() {
        let mut report = TranslationReport {
            output_path: Some(PathBuf::from("out.vi.vtt")),
            total_cues: 10,
            translated_cues: 10,
            fallback_cues: 0,
            failed_batches: vec![],
            parse_warnings: 0,
        };
        assert!(!report.is_partial());

        report.fallback_cues = 2;
        report.translated_cues = 8;
        assert!(report.is_partial());
    }
}
