use crate::{boundary::BoundaryEvent, suggestion::Suggestion};

/// Side effects requested by a transition.
///
/// The reducer never performs I/O. It describes what should happen and the
/// [`Session`](crate::Session) carries it out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run an analysis of `text` and report back tagged with `generation`.
    Analyze { generation: u64, text: String },

    /// A suggestion was applied to the buffer.
    SuggestionAccepted(Suggestion),

    /// A suggestion was dismissed.
    SuggestionRejected(Suggestion),

    /// The user finished a word or sentence.
    Boundary(BoundaryEvent),
}
