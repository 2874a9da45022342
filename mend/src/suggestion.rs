//! Correction suggestions and their classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence given to suggestions whose response carried no usable score.
pub const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Closed set of correction categories the model is asked to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grammar,
    Spelling,
    WordChoice,
    Clarity,
    Punctuation,
    Capitalization,
    VerbTense,
    ArticleUsage,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Grammar,
        Category::Spelling,
        Category::WordChoice,
        Category::Clarity,
        Category::Punctuation,
        Category::Capitalization,
        Category::VerbTense,
        Category::ArticleUsage,
    ];

    /// Label used on the wire, e.g. `Word_Choice`.
    pub fn label(self) -> &'static str {
        match self {
            Category::Grammar => "Grammar",
            Category::Spelling => "Spelling",
            Category::WordChoice => "Word_Choice",
            Category::Clarity => "Clarity",
            Category::Punctuation => "Punctuation",
            Category::Capitalization => "Capitalization",
            Category::VerbTense => "Verb_Tense",
            Category::ArticleUsage => "Article_Usage",
        }
    }

    /// Recognize a category label, ignoring case and treating spaces,
    /// hyphens and underscores alike. `vocabulary` is an alias of
    /// [`Category::WordChoice`].
    pub fn from_label(label: &str) -> Option<Category> {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "grammar" => Some(Category::Grammar),
            "spelling" => Some(Category::Spelling),
            "word_choice" | "vocabulary" => Some(Category::WordChoice),
            "clarity" => Some(Category::Clarity),
            "punctuation" => Some(Category::Punctuation),
            "capitalization" => Some(Category::Capitalization),
            "verb_tense" => Some(Category::VerbTense),
            "article_usage" => Some(Category::ArticleUsage),
            _ => None,
        }
    }

    /// Classify a raw category field from a model response.
    ///
    /// Blank labels take `default`; unrecognized labels are grammar.
    pub fn classify(label: &str, default: Category) -> Category {
        if label.trim().is_empty() {
            return default;
        }
        Category::from_label(label).unwrap_or(Category::Grammar)
    }

    /// Display bucket for this category.
    ///
    /// Clarity shares the word-choice bucket while remaining its own
    /// category.
    pub fn kind(self) -> SuggestionKind {
        match self {
            Category::Spelling => SuggestionKind::Spelling,
            Category::WordChoice | Category::Clarity => SuggestionKind::WordChoice,
            Category::Grammar
            | Category::Punctuation
            | Category::Capitalization
            | Category::VerbTense
            | Category::ArticleUsage => SuggestionKind::GrammarSentence,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse bucket used for display and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Spelling,
    WordChoice,
    GrammarSentence,
}

/// A proposed replacement of one span of the document.
///
/// `original` is a textual key into the document, not an offset. Two
/// suggestions are the same suggestion when their `original` and
/// `replacement` match exactly; see [`Suggestion::same_identity`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub original: String,
    pub replacement: String,
    pub category: Category,
    pub kind: SuggestionKind,
    pub explanation: String,
    pub confidence: f32,
    /// Sequence number assigned by the [`SuggestionStore`](crate::SuggestionStore)
    /// that accepted this suggestion. Zero until then.
    pub created_at: u64,
}

impl Suggestion {
    pub fn new(
        original: impl Into<String>,
        replacement: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            category,
            kind: category.kind(),
            explanation: String::new(),
            confidence: DEFAULT_CONFIDENCE,
            created_at: 0,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Set the confidence, clamped to `[0, 1]`. Non-finite values keep the
    /// current confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        if confidence.is_finite() {
            self.confidence = confidence.clamp(0.0, 1.0);
        }
        self
    }

    /// De-duplication key: the exact `(original, replacement)` pair.
    pub fn key(&self) -> (&str, &str) {
        (&self.original, &self.replacement)
    }

    pub fn same_identity(&self, other: &Suggestion) -> bool {
        self.key() == other.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
    }

    #[test]
    fn label_normalization() {
        assert_eq!(Category::from_label("word choice"), Some(Category::WordChoice));
        assert_eq!(Category::from_label("VERB-TENSE"), Some(Category::VerbTense));
        assert_eq!(Category::from_label(" Vocabulary "), Some(Category::WordChoice));
        assert_eq!(Category::from_label("tone"), None);
    }

    #[test]
    fn classify_defaults() {
        assert_eq!(Category::classify("", Category::Spelling), Category::Spelling);
        assert_eq!(Category::classify("style", Category::Spelling), Category::Grammar);
        assert_eq!(Category::classify("clarity", Category::Grammar), Category::Clarity);
    }

    #[test]
    fn kind_mapping() {
        assert_eq!(Category::Spelling.kind(), SuggestionKind::Spelling);
        assert_eq!(Category::WordChoice.kind(), SuggestionKind::WordChoice);
        assert_eq!(Category::Clarity.kind(), SuggestionKind::WordChoice);
        assert_eq!(Category::VerbTense.kind(), SuggestionKind::GrammarSentence);
        assert_eq!(Category::Grammar.kind(), SuggestionKind::GrammarSentence);
    }

    #[test]
    fn confidence_is_clamped() {
        let s = Suggestion::new("a", "b", Category::Grammar);
        assert_eq!(s.clone().with_confidence(1.7).confidence, 1.0);
        assert_eq!(s.clone().with_confidence(-0.2).confidence, 0.0);
        assert_eq!(s.with_confidence(f32::NAN).confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn identity_ignores_metadata() {
        let a = Suggestion::new("Him", "He", Category::Grammar).with_confidence(0.3);
        let b = Suggestion::new("Him", "He", Category::Spelling).with_explanation("x");
        let c = Suggestion::new("him", "He", Category::Grammar);
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }
}
