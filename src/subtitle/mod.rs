pub mod clean;
pub mod vtt;

use std::time::Duration;

/// One timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// 0-based position in the source file, used to scatter translated text
    /// back after batching.
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    /// Cue settings after the second timestamp, preserved verbatim.
    pub settings: Option<String>,
    pub text: String,
    /// Populated during reassembly; None means the cue keeps its source text.
    pub translated_text: Option<String>,
}

impl Cue {
    pub fn new(index: usize, start: Duration, end: Duration, text: String) -> Self {
        Self {
            index,
            start,
            end,
            settings: None,
            text,
            translated_text: None,
        }
    }

    /// Text to emit in the translated output, falling back to the original.
    pub fn output_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.text)
    }
}

/// A parsed WebVTT file: cues in file order plus any warnings raised while
/// skipping malformed blocks.
#[derive(Debug, Clone, Default)]
pub struct SubtitleDocument {
    pub cues: Vec<Cue>,
    pub warnings: Vec<String>,
}

impl SubtitleDocument {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }
}

/// Short code used in output filenames for a human-readable language name.
/// Unknown languages get a generic "trans" marker rather than failing.
pub fn language_code_for(language: &str) -> &'static str {
    match language.to_lowercase().as_str() {
        "english" => "en",
        "vietnamese" => "vi",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "chinese" => "zh",
        "japanese" => "ja",
        "korean" => "ko",
        _ => "trans",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_prefers_translation() {
        let mut cue = Cue::new(0, Duration::ZERO, Duration::from_secs(2), "Hello".to_string());
        assert_eq!(cue.output_text(), "Hello");

        cue.translated_text = Some("Xin chào".to_string());
        assert_eq!(cue.output_text(), "Xin chào");
    }

    #[test]
    fn test_language_code_for() {
        assert_eq!(language_code_for("Vietnamese"), "vi");
        assert_eq!(language_code_for("SPANISH"), "es");
        assert_eq!(language_code_for("Klingon"), "trans");
    }
}
