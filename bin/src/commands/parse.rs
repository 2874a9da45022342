use crate::commands::write_suggestions;
use mend::{parse_with, Category, ResponseFormat};
use std::io::Write;
use tracing::debug;

/// Parse a raw model response and print what was understood.
pub fn run(raw: &str, format: ResponseFormat, json: bool, out: &mut impl Write) -> anyhow::Result<usize> {
    let suggestions = parse_with(raw, format, Category::Grammar);
    debug!("Parsed {} suggestions from {} bytes as {:?}", suggestions.len(), raw.len(), format);
    write_suggestions(out, &suggestions, None, json)?;
    Ok(suggestions.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_skip_what_they_cannot_read() {
        let raw = "Here you go:\n\"teh\"|\"the\"|Spelling|typo\nNONE\n\"a\"|\"an\"|Article_Usage|before a vowel\n";
        let mut out = Vec::new();

        let count = run(raw, ResponseFormat::Lines, false, &mut out).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Spelling: \"teh\" -> \"the\" (typo)\nArticle_Usage: \"a\" -> \"an\" (before a vowel)\n"
        );
    }

    #[test]
    fn objects_as_json() {
        let raw = "```json\n[{original: \"has went\", suggestion: \"went\", category: grammar, needsChange: true}]\n```";
        let mut out = Vec::new();

        run(raw, ResponseFormat::Objects, true, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["original"], "has went");
        assert_eq!(value[0]["replacement"], "went");
        assert_eq!(value[0]["kind"], "grammar_sentence");
    }

    #[test]
    fn nothing_parsed_prints_nothing() {
        let mut out = Vec::new();
        assert_eq!(run("NONE", ResponseFormat::ScoredLines, false, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
