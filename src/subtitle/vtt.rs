//! WebVTT parsing and serialization.
//!
//! Pure data transform: no I/O here. Parsing tolerates malformed blocks by
//! skipping them with a warning, since real subtitle files often carry NOTE
//! blocks and other non-cue metadata.

use super::{Cue, SubtitleDocument};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::warn;

/// Which text variant the serializer emits for each cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSelection {
    Original,
    PreferTranslated,
}

fn timestamp_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{2,}:\d{2}:\d{2}\.\d{3})\s+-->\s+(\d{2,}:\d{2}:\d{2}\.\d{3})(.*)$")
            .expect("valid timestamp regex")
    })
}

/// Parse raw WebVTT text into an ordered sequence of timed cues.
///
/// Blocks without an arrow line or with unparsable timestamps are skipped and
/// recorded in `SubtitleDocument::warnings`; parsing never aborts on a bad
/// block. Cues receive sequential 0-based indices in file order.
pub fn parse(input: &str) -> SubtitleDocument {
    let normalized = input.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut document = SubtitleDocument::default();

    let mut blocks = split_blocks(&normalized);

    // The first block must be the format identifier; warn but keep going if
    // the file omits it, the cue blocks may still be usable.
    if let Some(first) = blocks.first() {
        if first.starts_with("WEBVTT") {
            blocks.remove(0);
        } else {
            document
                .warnings
                .push("missing WEBVTT header line".to_string());
        }
    }

    for (block_no, block) in blocks.iter().enumerate() {
        match parse_block(block) {
            Some(cue) => {
                let mut cue = cue;
                cue.index = document.cues.len();
                document.cues.push(cue);
            }
            None => {
                // NOTE/STYLE blocks and bare identifiers land here too.
                let summary: String = block.lines().next().unwrap_or("").chars().take(60).collect();
                let message = format!("skipping malformed block {block_no}: {summary:?}");
                warn!("{message}");
                document.warnings.push(message);
            }
        }
    }

    document
}

fn split_blocks(input: &str) -> Vec<&str> {
    input
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect()
}

fn parse_block(block: &str) -> Option<Cue> {
    let lines: Vec<&str> = block.lines().collect();
    let arrow_pos = lines.iter().position(|l| l.contains("-->"))?;

    let captures = timestamp_line_regex().captures(lines[arrow_pos].trim())?;
    let start = parse_timestamp(&captures[1])?;
    let end = parse_timestamp(&captures[2])?;

    let settings = {
        let rest = captures[3].trim();
        (!rest.is_empty()).then(|| rest.to_string())
    };

    // Everything after the timestamp line is display text; lines before it are
    // cue identifiers (often bare numbers) and are dropped. Empty text is
    // kept: the cue still occupies its slot in the timeline.
    let text = lines[arrow_pos + 1..].join("\n");

    let mut cue = Cue::new(0, start, end, text);
    cue.settings = settings;
    Some(cue)
}

/// Parse an `HH:MM:SS.mmm` timestamp with millisecond precision.
pub fn parse_timestamp(raw: &str) -> Option<Duration> {
    let (rest, millis) = raw.split_once('.')?;
    let mut parts = rest.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: u64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    Some(Duration::from_millis(
        ((hours * 3600 + minutes * 60 + seconds) * 1000) + millis,
    ))
}

/// Format a timestamp as `HH:MM:SS.mmm`, the exact inverse of
/// [`parse_timestamp`] so timing round-trips byte-equal.
pub fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Serialize a document back to WebVTT text.
///
/// Guarantees: cue count and timing equal the input document, blank line
/// between cues, trailing newline present.
pub fn serialize(document: &SubtitleDocument, selection: TextSelection) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in &document.cues {
        output.push_str(&format_timestamp(cue.start));
        output.push_str(" --> ");
        output.push_str(&format_timestamp(cue.end));
        if let Some(settings) = &cue.settings {
            output.push(' ');
            output.push_str(settings);
        }
        output.push('\n');
        output.push_str(match selection {
            TextSelection::Original => &cue.text,
            TextSelection::PreferTranslated => cue.output_text(),
        });
        output.push_str("\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nHello\n\n00:00:02.000 --> 00:00:04.000\nWorld\n\n00:00:04.000 --> 00:00:06.000\nBye\n";

    #[test]
    fn test_parse_basic_file() {
        let doc = parse(SAMPLE);
        assert_eq!(doc.len(), 3);
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.cues[0].text, "Hello");
        assert_eq!(doc.cues[1].start, Duration::from_secs(2));
        assert_eq!(doc.cues[2].index, 2);
    }

    #[test]
    fn test_parse_crlf_and_bom() {
        let input = "\u{feff}WEBVTT\r\n\r\n00:00:01.500 --> 00:00:04.000\r\nHello there\r\n";
        let doc = parse(input);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cues[0].start, Duration::from_millis(1500));
        assert_eq!(doc.cues[0].text, "Hello there");
    }

    #[test]
    fn test_parse_multiline_text_and_identifier() {
        let input = "WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.000\nfirst line\nsecond line\n";
        let doc = parse(input);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cues[0].text, "first line\nsecond line");
    }

    #[test]
    fn test_parse_preserves_cue_settings() {
        let input = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000 align:start position:0%\nHi\n";
        let doc = parse(input);
        assert_eq!(
            doc.cues[0].settings.as_deref(),
            Some("align:start position:0%")
        );

        let out = serialize(&doc, TextSelection::Original);
        assert!(out.contains("00:00:00.000 --> 00:00:02.000 align:start position:0%"));
    }

    #[test]
    fn test_parse_skips_malformed_blocks() {
        let input = "WEBVTT\n\nNOTE some metadata\n\n00:00:00.000 --> 00:00:02.000\nok\n\nbad-->timestamps here\nnope\n";
        let doc = parse(input);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cues[0].text, "ok");
        assert_eq!(doc.warnings.len(), 2);
    }

    #[test]
    fn test_parse_missing_header_warns_but_continues() {
        let input = "00:00:00.000 --> 00:00:02.000\nstill parsed\n";
        let doc = parse(input);
        assert_eq!(doc.len(), 1);
        assert!(doc.warnings.iter().any(|w| w.contains("WEBVTT")));
    }

    #[test]
    fn test_parse_keeps_empty_text_cue() {
        let input = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\n";
        let doc = parse(input);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.cues[0].text, "");
    }

    #[test]
    fn test_parse_empty_input() {
        let doc = parse("WEBVTT\n");
        assert!(doc.is_empty());
        assert!(doc.warnings.is_empty());
    }

    #[test]
    fn test_timestamp_round_trip() {
        for raw in ["00:00:00.000", "00:59:59.999", "01:02:03.450", "12:00:00.001"] {
            let parsed = parse_timestamp(raw).unwrap();
            assert_eq!(format_timestamp(parsed), raw);
        }
    }

    #[test]
    fn test_timestamp_rejects_garbage() {
        assert!(parse_timestamp("00:99:00.000").is_none());
        assert!(parse_timestamp("00:00:00").is_none());
        assert!(parse_timestamp("abc").is_none());
    }

    #[test]
    fn test_serialize_round_trip_preserves_timing() {
        let doc = parse(SAMPLE);
        let out = serialize(&doc, TextSelection::Original);
        let reparsed = parse(&out);

        assert_eq!(reparsed.len(), doc.len());
        for (a, b) in doc.cues.iter().zip(reparsed.cues.iter()) {
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.text, b.text);
        }
        assert!(out.ends_with('\n'));
    }

    #[test]
    fn test_serialize_prefers_translated_text() {
        let mut doc = parse(SAMPLE);
        doc.cues[0].translated_text = Some("Xin chào".to_string());

        let out = serialize(&doc, TextSelection::PreferTranslated);
        assert!(out.contains("Xin chào"));
        assert!(out.contains("World")); // untranslated cue falls back

        let original = serialize(&doc, TextSelection::Original);
        assert!(original.contains("Hello"));
        assert!(!original.contains("Xin chào"));
    }
}
