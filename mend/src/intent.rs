use crate::{
    state::{EditId, WritingMode},
    suggestion::Suggestion,
};

/// Everything that can change a [`SessionState`](crate::SessionState).
///
/// The first group comes from the user through the rendering surface. The
/// second group is produced by a running analysis and carries the
/// generation it was started for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    UpdateText(String),
    SelectMode(WritingMode),
    ApplySuggestion(Suggestion),
    ApplyAllSuggestions,
    RejectSuggestion(Suggestion),
    RevertEdit(EditId),
    AnalyzeText,
    ClearError,

    /// One suggestion accepted while the analysis is still running.
    SuggestionStreamed {
        generation: u64,
        suggestion: Suggestion,
    },
    /// The final ranked list of an analysis.
    SuggestionsLoaded {
        generation: u64,
        suggestions: Vec<Suggestion>,
    },
    /// The analysis ended. `error` is set when every attempted pass failed.
    AnalysisFinished {
        generation: u64,
        error: Option<String>,
    },
}
