//! The edit-reconciliation state machine.
//!
//! Every change to a session goes through [`process`]: it takes the current
//! state and an intent and returns the next state with the effects the
//! caller should carry out. Transitions are total. An intent that cannot be
//! honoured, such as applying a suggestion whose text has since been edited
//! away, leaves the state as it was.

use crate::{
    effects::Effect,
    intent::Intent,
    span,
    state::{AppliedEdit, EditId, SessionState},
    suggestion::Suggestion,
};
use tracing::debug;

/// Process one intent, discarding effects.
pub fn reduce(state: SessionState, intent: Intent) -> SessionState {
    process(state, intent).0
}

/// Process one intent and return the next state plus the effects to run.
pub fn process(mut state: SessionState, intent: Intent) -> (SessionState, Vec<Effect>) {
    debug!("Processing intent: {intent:?}");

    let result = match intent {
        Intent::UpdateText(text) => {
            let events = state.boundary.observe(&state.text, &text);
            if text.trim().is_empty() {
                state.boundary.clear_processed();
            }
            if text != state.text {
                state.set_text(text);
            }
            (state, events.into_iter().map(Effect::Boundary).collect())
        },

        Intent::SelectMode(mode) => {
            state.mode = mode;
            (state, vec![])
        },

        Intent::ApplySuggestion(suggestion) => apply_suggestion(state, suggestion),

        Intent::ApplyAllSuggestions => apply_all(state),

        Intent::RejectSuggestion(suggestion) => {
            let before = state.suggestions.len();
            state.suggestions.retain(|s| !s.same_identity(&suggestion));
            if state.suggestions.len() == before {
                (state, vec![])
            } else {
                (state, vec![Effect::SuggestionRejected(suggestion)])
            }
        },

        Intent::RevertEdit(id) => (revert_edit(state, id), vec![]),

        Intent::AnalyzeText => {
            state.is_analyzing = true;
            state.error = None;
            state.suggestions.clear();
            state.analysis_generation += 1;
            let effect = Effect::Analyze {
                generation: state.analysis_generation,
                text: state.text.clone(),
            };
            (state, vec![effect])
        },

        Intent::ClearError => {
            state.error = None;
            (state, vec![])
        },

        Intent::SuggestionStreamed {
            generation,
            suggestion,
        } => {
            if is_current(&state, generation)
                && !state.suggestions.iter().any(|s| s.same_identity(&suggestion))
            {
                state.suggestions.push(suggestion);
            }
            (state, vec![])
        },

        Intent::SuggestionsLoaded {
            generation,
            suggestions,
        } => {
            if is_current(&state, generation) {
                state.suggestions = reconcile_loaded(&state, suggestions);
            }
            (state, vec![])
        },

        Intent::AnalysisFinished { generation, error } => {
            if is_current(&state, generation) {
                state.is_analyzing = false;
                if let Some(message) = error {
                    state.suggestions.clear();
                    state.error = Some(message);
                }
            }
            (state, vec![])
        },
    };

    debug!("Intent processed, effects count: {}", result.1.len());
    result
}

fn is_current(state: &SessionState, generation: u64) -> bool {
    if generation == state.analysis_generation {
        true
    } else {
        debug!(
            "Ignoring result of analysis {generation}, current is {}",
            state.analysis_generation
        );
        false
    }
}

/// Order the live list by the analysis's ranked result.
///
/// Everything in `ranked` was already streamed in, so an entry missing from
/// the live list was applied, rejected or pruned since and stays gone. So
/// does one whose `original` the text no longer contains.
fn reconcile_loaded(state: &SessionState, ranked: Vec<Suggestion>) -> Vec<Suggestion> {
    let before = ranked.len();
    let kept: Vec<Suggestion> = ranked
        .into_iter()
        .filter(|s| state.suggestions.iter().any(|live| live.same_identity(s)))
        .filter(|s| span::contains(&state.text, &s.original))
        .collect();
    if kept.len() < before {
        debug!("{} ranked suggestions were settled during analysis", before - kept.len());
    }
    kept
}

/// Replace the first occurrence of `suggestion.original` and drop every
/// suggestion the replacement invalidated.
fn apply_suggestion(mut state: SessionState, suggestion: Suggestion) -> (SessionState, Vec<Effect>) {
    let Some(range) = span::locate(&state.text, &suggestion.original) else {
        debug!("Span {:?} is no longer in the text", suggestion.original);
        return (state, vec![]);
    };

    let original_text = state.text[range.clone()].to_string();
    let mut text = std::mem::take(&mut state.text);
    text.replace_range(range.clone(), &suggestion.replacement);
    state.set_text(text);

    let id = state.allocate_edit_id();
    state.applied_edits.push(AppliedEdit {
        id,
        original_text,
        applied_text: suggestion.replacement.clone(),
        range: range.start..range.start + suggestion.replacement.len(),
        sequence: state.revision,
    });

    let text = &state.text;
    state.suggestions.retain(|s| {
        !s.same_identity(&suggestion)
            && s.original != suggestion.original
            && span::contains(text, &s.original)
    });
    state.boundary.mark_edit();

    (state, vec![Effect::SuggestionAccepted(suggestion)])
}

/// Apply every pending suggestion, last first. Suggestions pruned by an
/// earlier application in the same pass are skipped.
fn apply_all(mut state: SessionState) -> (SessionState, Vec<Effect>) {
    let pending: Vec<Suggestion> = state.suggestions.iter().rev().cloned().collect();
    let mut effects = Vec::new();

    for suggestion in pending {
        if !state.suggestions.iter().any(|s| s.same_identity(&suggestion)) {
            continue;
        }
        let (next, applied) = apply_suggestion(state, suggestion);
        state = next;
        effects.extend(applied);
    }

    (state, effects)
}

/// Put an applied edit's original text back. Suggestions pruned when the
/// edit was applied stay pruned.
fn revert_edit(mut state: SessionState, id: EditId) -> SessionState {
    let Some(edit) = state.edit(id) else {
        debug!("No applied edit {id}");
        return state;
    };
    let Some(range) = span::locate_from(&state.text, &edit.applied_text, edit.range.start) else {
        debug!("Text of {id} is no longer in the buffer");
        return state;
    };
    let original_text = edit.original_text.clone();

    state.applied_edits.retain(|edit| edit.id != id);
    let mut text = std::mem::take(&mut state.text);
    text.replace_range(range, &original_text);
    state.set_text(text);
    state.boundary.mark_edit();
    state
}
