//! Cleanup of machine-translated subtitle text.
//!
//! Translation models occasionally echo inline tags from auto captions
//! (`<00:03:09.360>`, `<c>`) or prepend "here's the translation" preambles.
//! Both are stripped from translated text before serialization. Source text
//! is never touched: fallback cues must keep their original content verbatim.

use super::SubtitleDocument;
use regex::Regex;
use std::sync::OnceLock;

/// Lowercased phrases that mark a line as a translation preamble rather than
/// subtitle content.
const ARTIFACT_PHRASES: &[&str] = &[
    "sau đây",
    "bản dịch",
    "phụ đề",
    "vietnamese translation",
    "here's the vietnamese",
    "here are the vietnamese",
    "here's the translation",
];

fn inline_timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\d{2}:\d{2}:\d{2}\.\d{3}>").expect("valid tag regex"))
}

fn markup_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Remove inline timing and markup tags from a single line of cue text.
pub fn clean_markup(text: &str) -> String {
    let text = inline_timestamp_regex().replace_all(text, "");
    let text = markup_tag_regex().replace_all(&text, "");
    whitespace_regex().replace_all(&text, " ").trim().to_string()
}

fn is_artifact_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    ARTIFACT_PHRASES.iter().any(|p| lower.contains(p))
}

/// Strip markup tags and preamble lines from every translated cue in place.
/// A translation that becomes empty after cleaning is dropped so the cue
/// falls back to its original text.
pub fn clean_translations(document: &mut SubtitleDocument) {
    for cue in &mut document.cues {
        if let Some(translated) = cue.translated_text.take() {
            let cleaned = clean_lines(&translated);
            if !cleaned.is_empty() {
                cue.translated_text = Some(cleaned);
            }
        }
    }
}

fn clean_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !is_artifact_line(line))
        .map(clean_markup)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
