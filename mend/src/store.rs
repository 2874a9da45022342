//! Accumulates suggestions across analysis passes and stream chunks.

use crate::suggestion::Suggestion;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tracing::trace;

/// Cap applied by [`rank`] when no other limit is configured.
pub const MAX_SUGGESTIONS: usize = 200;

/// Ordered, de-duplicated collection of suggestions.
///
/// Suggestions are keyed by their exact `(original, replacement)` pair.
/// Every newly accepted suggestion is also published to each live
/// subscriber, so a caller can show results before the analysis that
/// produces them has finished.
#[derive(Debug, Default)]
pub struct SuggestionStore {
    entries: Vec<Suggestion>,
    seen: FxHashSet<(String, String)>,
    next_sequence: u64,
    subscribers: Vec<mpsc::UnboundedSender<Suggestion>>,
}

impl SuggestionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `suggestion` unless its key is already present.
    ///
    /// Returns whether it was accepted.
    pub fn add(&mut self, mut suggestion: Suggestion) -> bool {
        let key = (suggestion.original.clone(), suggestion.replacement.clone());
        if !self.seen.insert(key) {
            trace!(
                "Ignoring duplicate suggestion {:?} -> {:?}",
                suggestion.original,
                suggestion.replacement
            );
            return false;
        }

        self.next_sequence += 1;
        suggestion.created_at = self.next_sequence;

        self.subscribers
            .retain(|subscriber| subscriber.send(suggestion.clone()).is_ok());
        self.entries.push(suggestion);
        true
    }

    /// Add every suggestion, returning how many were accepted.
    pub fn extend(&mut self, suggestions: impl IntoIterator<Item = Suggestion>) -> usize {
        suggestions
            .into_iter()
            .fold(0, |accepted, suggestion| accepted + usize::from(self.add(suggestion)))
    }

    /// Receive each suggestion accepted from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Suggestion> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Take all suggestions in insertion order and forget their keys.
    pub fn drain(&mut self) -> Vec<Suggestion> {
        self.seen.clear();
        std::mem::take(&mut self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.entries.iter()
    }
}

/// Order by confidence, highest first, preferring the shorter `original`
/// on ties, and keep at most `max`.
///
/// The sort is stable, so suggestions that compare equal keep their
/// insertion order.
pub fn rank(mut suggestions: Vec<Suggestion>, max: usize) -> Vec<Suggestion> {
    suggestions.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| span_len(a).cmp(&span_len(b)))
    });
    suggestions.truncate(max);
    suggestions
}

fn span_len(suggestion: &Suggestion) -> usize {
    suggestion.original.chars().count()
}
