pub mod check;
pub mod fix;
pub mod parse;

use mend::{span, Suggestion};
use std::io::Write;

/// One suggestion per line: `category: "original" -> "replacement" (reason)`,
/// prefixed with the byte offset when it can be located in `text`.
pub(crate) fn write_suggestion(
    out: &mut impl Write,
    suggestion: &Suggestion,
    text: Option<&str>,
) -> std::io::Result<()> {
    if let Some(range) = text.and_then(|text| span::locate(text, &suggestion.original)) {
        write!(out, "{}: ", range.start)?;
    }
    write!(
        out,
        "{}: {:?} -> {:?}",
        suggestion.category, suggestion.original, suggestion.replacement
    )?;
    if !suggestion.explanation.is_empty() {
        write!(out, " ({})", suggestion.explanation)?;
    }
    writeln!(out)
}

pub(crate) fn write_suggestions(
    out: &mut impl Write,
    suggestions: &[Suggestion],
    text: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, suggestions)?;
        writeln!(out)?;
        return Ok(());
    }
    for suggestion in suggestions {
        write_suggestion(out, suggestion, text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend::Category;

    #[test]
    fn located_suggestion_carries_offset() {
        let suggestion = Suggestion::new("has went", "had gone", Category::Grammar)
            .with_explanation("past perfect");
        let mut out = Vec::new();
        write_suggestion(&mut out, &suggestion, Some("I has went to store.")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2: Grammar: \"has went\" -> \"had gone\" (past perfect)\n"
        );
    }

    #[test]
    fn unlocated_suggestion_has_no_offset() {
        let suggestion = Suggestion::new("teh", "the", Category::Spelling);
        let mut out = Vec::new();
        write_suggestion(&mut out, &suggestion, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Spelling: \"teh\" -> \"the\"\n");
    }
}
