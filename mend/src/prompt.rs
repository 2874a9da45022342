//! Requests sent to the model.
//!
//! Replies are parsed by [`crate::parse`]; the two sides must agree on the
//! line format, so the format text lives here next to the instructions
//! that use it.

use crate::suggestion::Category;
use serde::{Deserialize, Serialize};

/// Category labels offered to the model, in wire spelling.
pub const CATEGORIES: &str =
    "Grammar, Spelling, Word_Choice, Clarity, Punctuation, Capitalization, Verb_Tense, Article_Usage";

/// Suggestion cap used when none is configured.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// The general request: up to `max` short-span corrections as delimited
/// lines, or `NONE`.
pub fn micro_edit(text: &str, max: usize) -> String {
    format!(
        r#"You are an English writing assistant. Read the text and propose up to {max} micro-edits.
Each micro-edit must replace a SHORT contiguous span (word or phrase) with a corrected span.
Do NOT return full-sentence rewrites. Spans must appear exactly in the text.

Text:
"{text}"

Output: one suggestion per line, pipe-separated with no extra text:
"original_span"|"suggested_span"|category|reason
- Keep spans short and focused (avoid whole sentences)
- Categories: {CATEGORIES}
- Reason: short bullet (no 'and')

Good examples:
"Him"|"He"|Grammar|Use subject pronoun
"don’t likes"|"doesn't like"|Verb_Tense|Fix agreement after subject
"go"|"to go"|Grammar|Use infinitive after 'like'
"because too much noisy"|"because it is too noisy"|Clarity|Complete clause with copula

If no edits are needed, return: NONE"#
    )
}

/// A focused analysis pass run in thorough mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    Grammar,
    Spelling,
    Punctuation,
    WordChoice,
    Clarity,
}

impl Pass {
    pub const ALL: [Pass; 5] = [
        Pass::Grammar,
        Pass::Spelling,
        Pass::Punctuation,
        Pass::WordChoice,
        Pass::Clarity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Pass::Grammar => "grammar",
            Pass::Spelling => "spelling",
            Pass::Punctuation => "punctuation",
            Pass::WordChoice => "word_choice",
            Pass::Clarity => "clarity",
        }
    }

    /// Category given to replies that leave the category blank.
    pub fn category(self) -> Category {
        match self {
            Pass::Grammar => Category::Grammar,
            Pass::Spelling => Category::Spelling,
            Pass::Punctuation => Category::Punctuation,
            Pass::WordChoice => Category::WordChoice,
            Pass::Clarity => Category::Clarity,
        }
    }

    fn focus(self) -> &'static str {
        match self {
            Pass::Grammar => {
                "grammar errors only: subject-verb agreement, pronoun case, verb tense and article usage"
            },
            Pass::Spelling => "spelling mistakes and typos only",
            Pass::Punctuation => "punctuation and capitalization errors only",
            Pass::WordChoice => "words that are wrong or imprecise in context; suggest a better word",
            Pass::Clarity => "phrases that are awkward or unclear; suggest a clearer phrase of similar length",
        }
    }

    /// Request for this pass. Replies carry a fifth confidence field.
    pub fn prompt(self, text: &str, max: usize) -> String {
        format!(
            r#"You are an English writing assistant. Check the text for {focus}.
Propose up to {max} micro-edits. Each must replace a SHORT span that appears exactly in the text.

Text:
"{text}"

Output: one suggestion per line, pipe-separated with no extra text:
"original_span"|"suggested_span"|category|reason|confidence
- Categories: {CATEGORIES}
- Confidence: a number between 0 and 1

If no edits are needed, return: NONE"#,
            focus = self.focus(),
        )
    }
}

/// The auxiliary structured request: a JSON array of correction objects.
pub fn structured_check(text: &str, max: usize) -> String {
    format!(
        r#"You are an English writing assistant. Review the text and list up to {max} corrections.

Text:
"{text}"

Respond with a JSON array only, no prose. Each element:
{{"original": "<exact span from the text>", "suggestion": "<corrected span>", "category": "<one of: {CATEGORIES}>", "explanation": "<short reason>", "confidence": <0 to 1>, "needs_change": true, "alternatives": ["<other corrected span>"]}}

If no edits are needed, return: []"#
    )
}
