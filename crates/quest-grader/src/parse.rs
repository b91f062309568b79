//! Grading response parsing into a validated [`GradedReport`].
//!
//! The model returns raw text (ideally JSON). This module extracts and
//! validates it. Generative models frequently wrap the JSON in markdown
//! fences or leave trailing commas, so parsing runs through several
//! recovery strategies before giving up. A response that survives none of
//! them is an error; the session layer degrades it to a forced rank C.

use quest_types::{GradedReport, Rank};
use tracing::warn;

use crate::error::GraderError;

/// Intermediate struct for deserializing the model's raw JSON response.
///
/// The rank arrives as a string so we can accept case variations before
/// validating it against the typed [`Rank`] enum.
#[derive(Debug, serde::Deserialize)]
struct RawReport {
    #[serde(default = "default_transcript")]
    transcript: String,
    rank: String,
    #[serde(default)]
    comment: String,
}

fn default_transcript() -> String {
    "(the report could not be heard)".to_owned()
}

/// Parse a grading response string into a validated [`GradedReport`].
///
/// Attempts multiple recovery strategies if the raw text is not clean JSON:
/// 1. Direct `serde_json` deserialization
/// 2. Extract JSON from markdown code blocks
/// 3. Strip trailing commas and retry
/// 4. Code-block extraction and comma stripping combined
pub fn parse_graded_report(raw: &str) -> Result<GradedReport, GraderError> {
    let trimmed = raw.trim();

    // Strategy 1: direct parse
    if let Ok(parsed) = serde_json::from_str::<RawReport>(trimmed) {
        return convert_raw_report(parsed);
    }

    // Strategy 2: extract from markdown code block
    if let Some(json_str) = extract_json_from_codeblock(trimmed)
        && let Ok(parsed) = serde_json::from_str::<RawReport>(json_str)
    {
        return convert_raw_report(parsed);
    }

    // Strategy 3: strip trailing commas and retry
    let cleaned = strip_trailing_commas(trimmed);
    if let Ok(parsed) = serde_json::from_str::<RawReport>(&cleaned) {
        return convert_raw_report(parsed);
    }

    // Strategy 4: extract from code block then strip commas
    if let Some(json_str) = extract_json_from_codeblock(trimmed) {
        let cleaned_inner = strip_trailing_commas(json_str);
        if let Ok(parsed) = serde_json::from_str::<RawReport>(&cleaned_inner) {
            return convert_raw_report(parsed);
        }
    }

    warn!(raw_response = trimmed, "all parse strategies failed for grading response");
    Err(GraderError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

/// Convert a deserialized raw report into the typed form.
fn convert_raw_report(raw: RawReport) -> Result<GradedReport, GraderError> {
    let rank = parse_rank(&raw.rank)?;
    Ok(GradedReport {
        transcript: raw.transcript,
        rank,
        comment: raw.comment,
    })
}

/// Parse a rank string into the typed enum.
fn parse_rank(s: &str) -> Result<Rank, GraderError> {
    // Serde handles the canonical uppercase spellings
    let quoted = format!("\"{s}\"");
    if let Ok(rank) = serde_json::from_str::<Rank>(&quoted) {
        return Ok(rank);
    }

    // Fallback: case-insensitive matching for sloppy model output
    match s.to_uppercase().as_str() {
        "S" => Ok(Rank::S),
        "A" => Ok(Rank::A),
        "B" => Ok(Rank::B),
        "C" => Ok(Rank::C),
        "RETRY" => Ok(Rank::Retry),
        other => Err(GraderError::Parse(format!("unknown rank: {other}"))),
    }
}

/// Extract JSON from a markdown code block.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    // Look for ```json ... ``` or ``` ... ```
    let start = text
        .find("```json")
        .map(|i| {
            let after_tag = i.checked_add(7).unwrap_or(i);
            text.get(after_tag..)
                .and_then(|s| s.find('\n'))
                .and_then(|nl| after_tag.checked_add(nl))
                .and_then(|pos| pos.checked_add(1))
                .unwrap_or(after_tag)
        })
        .or_else(|| {
            text.find("```").map(|i| {
                let after_tag = i.checked_add(3).unwrap_or(i);
                text.get(after_tag..)
                    .and_then(|s| s.find('\n'))
                    .and_then(|nl| after_tag.checked_add(nl))
                    .and_then(|pos| pos.checked_add(1))
                    .unwrap_or(after_tag)
            })
        });

    let start = start?;
    let remaining = text.get(start..)?;
    let end = remaining.find("```")?;
    remaining.get(..end).map(str::trim)
}

/// Strip trailing commas before closing braces and brackets (common model error).
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut i = 0;
    while i < len {
        let c = chars.get(i).copied().unwrap_or(' ');
        if c == ',' {
            // Look ahead past whitespace for } or ]
            let mut j = i.checked_add(1).unwrap_or(i);
            while j < len && chars.get(j).copied().unwrap_or(' ').is_whitespace() {
                j = j.checked_add(1).unwrap_or(j);
            }
            let next = chars.get(j).copied().unwrap_or(' ');
            if next == '}' || next == ']' {
                // Skip this comma
                i = i.checked_add(1).unwrap_or(i);
                continue;
            }
        }
        result.push(c);
        i = i.checked_add(1).unwrap_or(len);
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_clean_json() {
        let raw = r#"{"transcript": "I cleaned my room", "rank": "A", "comment": "Well done, young hero."}"#;
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::A);
        assert_eq!(report.transcript, "I cleaned my room");
        assert_eq!(report.comment, "Well done, young hero.");
    }

    #[test]
    fn parse_retry_rank() {
        let raw = r#"{"transcript": "(the report could not be heard)", "rank": "RETRY", "comment": "Speak up!"}"#;
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::Retry);
    }

    #[test]
    fn parse_lowercase_rank() {
        let raw = r#"{"transcript": "done", "rank": "s", "comment": "Splendid!"}"#;
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::S);
    }

    #[test]
    fn parse_from_codeblock() {
        let raw = "Here is my appraisal:\n\n```json\n{\"transcript\": \"finished\", \"rank\": \"B\", \"comment\": \"Good.\"}\n```\n";
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::B);
    }

    #[test]
    fn parse_trailing_comma() {
        let raw = r#"{"transcript": "done", "rank": "C", "comment": "Keep at it.",}"#;
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::C);
    }

    #[test]
    fn parse_codeblock_with_trailing_comma() {
        let raw = "```json\n{\"transcript\": \"done\", \"rank\": \"A\", \"comment\": \"Nice.\",}\n```";
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.rank, Rank::A);
    }

    #[test]
    fn missing_transcript_gets_placeholder() {
        let raw = r#"{"rank": "C", "comment": "Hmm."}"#;
        let report = parse_graded_report(raw).unwrap();
        assert_eq!(report.transcript, "(the report could not be heard)");
    }

    #[test]
    fn unknown_rank_is_an_error() {
        let raw = r#"{"transcript": "done", "rank": "SS", "comment": "!!"}"#;
        assert!(parse_graded_report(raw).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        let raw = "The young hero did admirably, I would say rank A.";
        assert!(parse_graded_report(raw).is_err());
    }

    #[test]
    fn empty_is_an_error() {
        assert!(parse_graded_report("").is_err());
    }

    #[test]
    fn strip_trailing_commas_object_and_array() {
        assert_eq!(
            strip_trailing_commas(r#"{"a": 1, "b": 2,}"#),
            r#"{"a": 1, "b": 2}"#
        );
        assert_eq!(strip_trailing_commas("[1, 2, 3,]"), "[1, 2, 3]");
    }

    #[test]
    fn extract_json_from_plain_codeblock() {
        let text = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json_from_codeblock(text), Some("{\"key\": \"value\"}"));
    }
}
