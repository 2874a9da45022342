//! Word and sentence completion detection.
//!
//! The tracker watches successive versions of the buffer and reports when
//! the user finishes a word or a sentence, which is when an automatic
//! analysis is worth running. Deletions and applied suggestions open a
//! short cooldown so that backspacing over a full stop, or a correction
//! landing on one, is not mistaken for the user finishing a sentence.

use std::collections::BTreeSet;

/// Number of observed changes after a deletion during which boundary
/// events are flagged as deletion-related.
pub const DELETION_COOLDOWN_EVENTS: u64 = 3;

/// Minimum number of words for a completed sentence to be reported.
pub const MIN_SENTENCE_WORDS: usize = 3;

const WORD_BOUNDARY: [char; 3] = [' ', '\t', '\n'];
const SENTENCE_BOUNDARY: [char; 6] = ['.', '!', '?', ',', ';', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    WordCompleted,
    SentenceCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryEvent {
    pub kind: BoundaryKind,
    /// The completed word or sentence.
    pub extracted: String,
    /// Byte offset of `extracted` in the text that produced the event.
    pub position: usize,
    /// Whether a deletion or applied edit happened within the cooldown.
    pub was_deletion_involved: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryTracker {
    event_count: u64,
    last_deletion_event: Option<u64>,
    processed_sentences: BTreeSet<String>,
}

impl BoundaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare two successive versions of the text and report completed
    /// words and sentences.
    pub fn observe(&mut self, previous: &str, current: &str) -> Vec<BoundaryEvent> {
        self.event_count += 1;

        let previous_len = previous.chars().count();
        let current_len = current.chars().count();
        if current_len <= previous_len {
            if current_len < previous_len {
                self.mark_deletion();
            }
            return Vec::new();
        }

        let was_deletion_involved = self.deletion_recent();
        let Some(last) = current.chars().next_back() else {
            return Vec::new();
        };

        if WORD_BOUNDARY.contains(&last) {
            let word = current
                .trim_end_matches(&WORD_BOUNDARY[..])
                .split_whitespace()
                .next_back()
                .unwrap_or_default();
            if word.is_empty() {
                return Vec::new();
            }
            return vec![BoundaryEvent {
                kind: BoundaryKind::WordCompleted,
                extracted: word.to_string(),
                position: current.rfind(word).unwrap_or(0),
                was_deletion_involved,
            }];
        }

        if SENTENCE_BOUNDARY.contains(&last) {
            let Some(sentence) = completed_sentence(current) else {
                return Vec::new();
            };
            if !self.processed_sentences.insert(sentence.to_string()) {
                return Vec::new();
            }
            return vec![BoundaryEvent {
                kind: BoundaryKind::SentenceCompleted,
                extracted: sentence.to_string(),
                position: current.find(sentence).unwrap_or(0),
                was_deletion_involved,
            }];
        }

        Vec::new()
    }

    /// Start a cooldown as if the user had just deleted text.
    pub fn mark_deletion(&mut self) {
        self.last_deletion_event = Some(self.event_count);
    }

    /// Start the same cooldown for an applied or reverted suggestion.
    pub fn mark_edit(&mut self) {
        self.mark_deletion();
    }

    /// Observed changes since the last deletion, if any happened.
    pub fn recent_deletion_event_count(&self) -> Option<u64> {
        self.last_deletion_event
            .map(|at| self.event_count.saturating_sub(at))
    }

    pub fn deletion_recent(&self) -> bool {
        self.recent_deletion_event_count()
            .is_some_and(|since| since < DELETION_COOLDOWN_EVENTS)
    }

    /// Forget which sentences have been reported.
    pub fn clear_processed(&mut self) {
        self.processed_sentences.clear();
    }
}

/// The sentence closed by the last punctuation mark in `text`, trimmed,
/// when it has at least [`MIN_SENTENCE_WORDS`] words.
pub fn completed_sentence(text: &str) -> Option<&str> {
    let last_mark = text.rfind(&SENTENCE_BOUNDARY[..])?;
    let through_mark = text[..=last_mark].trim();

    // `through_mark` ends with the mark itself; look for the one before it.
    let body = &through_mark[..through_mark.len() - 1];
    let start = body
        .rfind(&SENTENCE_BOUNDARY[..])
        .map_or(0, |index| index + 1);

    let sentence = through_mark[start..].trim();
    (sentence.split_whitespace().count() >= MIN_SENTENCE_WORDS).then_some(sentence)
}
