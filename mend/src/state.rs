use crate::{boundary::BoundaryTracker, suggestion::Suggestion};
use serde::{Deserialize, Serialize};
use std::{fmt, ops::Range};

/// Register the user is writing in. Purely informational.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingMode {
    #[default]
    Email,
    Essay,
    Creative,
    Business,
    Academic,
}

/// Identifier of an [`AppliedEdit`], unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EditId(pub u64);

impl fmt::Display for EditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edit-{}", self.0)
    }
}

/// A committed replacement, kept so it can be reverted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEdit {
    pub id: EditId,
    /// Buffer text that was replaced.
    pub original_text: String,
    /// Text that was inserted in its place.
    pub applied_text: String,
    /// Where `applied_text` sat right after it was inserted.
    pub range: Range<usize>,
    /// Buffer revision at which the edit was applied.
    pub sequence: u64,
}

/// Everything a rendering surface needs to draw one editing session.
///
/// States are values: every transition produces a new state and never
/// changes one that has been handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub text: String,
    pub word_count: usize,
    pub mode: WritingMode,
    /// Pending suggestions, in display order.
    pub suggestions: Vec<Suggestion>,
    pub applied_edits: Vec<AppliedEdit>,
    pub is_analyzing: bool,
    pub error: Option<String>,
    /// Incremented by every analysis request. Results tagged with an older
    /// generation are discarded.
    pub analysis_generation: u64,
    /// Incremented by every change to `text`.
    pub revision: u64,
    pub boundary: BoundaryTracker,
    next_edit_id: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let mut state = Self::default();
        state.set_text(text.into());
        state
    }

    /// Replace the text, keeping the derived fields current.
    pub(crate) fn set_text(&mut self, text: String) {
        self.word_count = word_count(&text);
        self.text = text;
        self.revision += 1;
    }

    pub(crate) fn allocate_edit_id(&mut self) -> EditId {
        self.next_edit_id += 1;
        EditId(self.next_edit_id)
    }

    pub fn edit(&self, id: EditId) -> Option<&AppliedEdit> {
        self.applied_edits.iter().find(|edit| edit.id == id)
    }
}

/// Number of whitespace-delimited words; zero for blank text.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
