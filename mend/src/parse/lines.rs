use crate::suggestion::{Category, Suggestion};
use regex::Regex;
use std::sync::OnceLock;
use tracing::trace;

const DELIMITER: char = '|';

/// Confidence of every suggestion from an unscored line response.
pub const LINE_CONFIDENCE: f32 = 0.9;

/// Confidence of a scored line whose score is missing or unreadable.
pub const SCORED_DEFAULT_CONFIDENCE: f32 = 0.85;

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('\u{201c}', '\u{201d}'), ('`', '`')];

pub(super) fn parse_lines(raw: &str, scored: bool, default_category: Category) -> Vec<Suggestion> {
    raw.lines()
        .filter_map(|line| parse_line(line, scored, default_category))
        .collect()
}

/// Fields: `original | suggestion | category? | reason? | confidence?`.
pub(super) fn parse_line(line: &str, scored: bool, default_category: Category) -> Option<Suggestion> {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("NONE") {
        return None;
    }

    let fields: Vec<&str> = line.split(DELIMITER).map(|f| unquote(f.trim())).collect();
    if fields.len() < 2 {
        trace!("Skipping line without delimited fields: {line:?}");
        return None;
    }

    let original = fields[0];
    let replacement = fields[1];
    if original.trim().is_empty() || replacement.trim().is_empty() {
        trace!("Skipping line with a blank span: {line:?}");
        return None;
    }

    let category = Category::classify(fields.get(2).copied().unwrap_or_default(), default_category);
    let reason = fields.get(3).copied().unwrap_or_default();

    let (confidence, explanation) = if scored {
        scored_confidence(fields.get(4).copied(), reason)
    } else {
        (LINE_CONFIDENCE, reason.to_string())
    };

    Some(
        Suggestion::new(original, replacement, category)
            .with_explanation(explanation)
            .with_confidence(confidence),
    )
}

/// Strip one pair of surrounding quotes, if present.
fn unquote(field: &str) -> &str {
    QUOTE_PAIRS
        .iter()
        .find_map(|&(open, close)| field.strip_prefix(open)?.strip_suffix(close))
        .unwrap_or(field)
}

fn scored_confidence(field: Option<&str>, reason: &str) -> (f32, String) {
    if let Some(raw) = field {
        let confidence = raw
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|c| c.is_finite())
            .map_or(SCORED_DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0));
        return (confidence, reason.to_string());
    }

    if reason.contains("confidence") {
        if let Some(found) = confidence_in_reason(reason) {
            return found;
        }
    }

    (SCORED_DEFAULT_CONFIDENCE, reason.to_string())
}

fn trailing_confidence() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?i)[\s,;:(\[-]*\bconfidence\b\s*[:=]?\s*(\d+(?:\.\d+)?|\.\d+)\s*(%?)\s*[)\]]?\s*$",
            )
            .ok()
        })
        .as_ref()
}

/// Pull a trailing `confidence 0.7` style score out of a reason and return
/// it with the reason text minus the score.
fn confidence_in_reason(reason: &str) -> Option<(f32, String)> {
    let captures = trailing_confidence()?.captures(reason)?;
    let whole = captures.get(0)?;
    let mut value: f32 = captures.get(1)?.as_str().parse().ok()?;
    if captures.get(2).is_some_and(|percent| !percent.as_str().is_empty()) {
        value /= 100.0;
    }

    let stripped = reason[..whole.start()].trim_end().to_string();
    Some((value.clamp(0.0, 1.0), stripped))
}
