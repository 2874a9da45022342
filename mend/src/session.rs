//! The event loop around the reducer.
//!
//! A [`Session`] owns the current [`SessionState`] snapshot and is the only
//! place transitions happen. Intents from the user go through
//! [`Session::dispatch`]; analyses run as tokio tasks and report back over
//! a channel, and their results are applied by [`Session::pump`] or
//! [`Session::next_event`]. Readers hold a [`SnapshotReader`] and always
//! see a whole state, never one half way through a transition.
//!
//! Starting an analysis aborts the one in flight. Anything the aborted task
//! already sent carries the old generation and is dropped by the reducer.

use crate::{
    analysis::Analyzer,
    boundary::BoundaryKind,
    effects::Effect,
    intent::Intent,
    reducer,
    state::SessionState,
    store::SuggestionStore,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

/// Shared read access to the latest state.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    snapshot: Arc<RwLock<Arc<SessionState>>>,
}

impl SnapshotReader {
    pub fn get(&self) -> Arc<SessionState> {
        self.snapshot.read().clone()
    }
}

pub struct Session {
    snapshot: Arc<RwLock<Arc<SessionState>>>,
    analyzer: Arc<Analyzer>,
    events_tx: mpsc::UnboundedSender<Intent>,
    events_rx: mpsc::UnboundedReceiver<Intent>,
    in_flight: Option<JoinHandle<()>>,
    auto_analyze: bool,
}

impl Session {
    pub fn new(analyzer: Analyzer) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(SessionState::new()))),
            analyzer: Arc::new(analyzer),
            events_tx,
            events_rx,
            in_flight: None,
            auto_analyze: false,
        }
    }

    /// Start from `state` instead of an empty document.
    pub fn with_state(self, state: SessionState) -> Self {
        *self.snapshot.write() = Arc::new(state);
        self
    }

    /// Analyze automatically whenever the user completes a sentence that
    /// was not just touched by a deletion.
    pub fn with_auto_analyze(mut self, enabled: bool) -> Self {
        self.auto_analyze = enabled;
        self
    }

    pub fn state(&self) -> Arc<SessionState> {
        self.snapshot.read().clone()
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            snapshot: self.snapshot.clone(),
        }
    }

    /// Apply `intent` and carry out the resulting effects.
    ///
    /// Must be called within a tokio runtime when the intent can start an
    /// analysis.
    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        let current = SessionState::clone(&self.state());
        let (next, effects) = reducer::process(current, intent);
        *self.snapshot.write() = Arc::new(next);

        let mut follow_up = Vec::new();
        for effect in &effects {
            match effect {
                Effect::Analyze { generation, text } => {
                    self.spawn_analysis(*generation, text.clone());
                },
                Effect::Boundary(event) => {
                    debug!("{:?}: {:?}", event.kind, event.extracted);
                    if self.auto_analyze
                        && event.kind == BoundaryKind::SentenceCompleted
                        && !event.was_deletion_involved
                        && !self.state().is_analyzing
                    {
                        follow_up.push(Intent::AnalyzeText);
                    }
                },
                Effect::SuggestionAccepted(suggestion) => {
                    info!(
                        "Applied {:?} -> {:?} ({})",
                        suggestion.original, suggestion.replacement, suggestion.category
                    );
                },
                Effect::SuggestionRejected(suggestion) => {
                    debug!(
                        "Rejected {:?} -> {:?}",
                        suggestion.original, suggestion.replacement
                    );
                },
            }
        }

        let mut effects = effects;
        for intent in follow_up {
            effects.extend(self.dispatch(intent));
        }
        effects
    }

    /// Apply every analysis result that has already arrived. Returns how
    /// many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(intent) = self.events_rx.try_recv() {
            self.dispatch(intent);
            applied += 1;
        }
        applied
    }

    /// Wait for the next analysis result and apply it.
    pub async fn next_event(&mut self) -> Option<Vec<Effect>> {
        let intent = self.events_rx.recv().await?;
        Some(self.dispatch(intent))
    }

    /// Apply analysis results until no analysis is running.
    pub async fn wait_idle(&mut self) {
        while self.state().is_analyzing {
            if self.next_event().await.is_none() {
                break;
            }
        }
    }

    fn spawn_analysis(&mut self, generation: u64, text: String) {
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                debug!("Superseding in-flight analysis");
            }
            previous.abort();
        }

        let analyzer = self.analyzer.clone();
        let events = self.events_tx.clone();
        self.in_flight = Some(tokio::spawn(run_analysis(analyzer, generation, text, events)));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

async fn run_analysis(
    analyzer: Arc<Analyzer>,
    generation: u64,
    text: String,
    events: mpsc::UnboundedSender<Intent>,
) {
    let mut store = SuggestionStore::new();
    let mut accepted = store.subscribe();

    let forward = async {
        while let Some(suggestion) = accepted.recv().await {
            let _ = events.send(Intent::SuggestionStreamed {
                generation,
                suggestion,
            });
        }
    };
    let (report, ()) = tokio::join!(analyzer.analyze_into(&text, store), forward);

    let error = report.error_message();
    if error.is_none() {
        let _ = events.send(Intent::SuggestionsLoaded {
            generation,
            suggestions: report.suggestions,
        });
    }
    let _ = events.send(Intent::AnalysisFinished { generation, error });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{AnalysisMode, AnalysisOptions},
        testing::ScriptedBackend,
    };
    use std::time::Duration;

    fn session(backend: ScriptedBackend, mode: AnalysisMode) -> Session {
        mend_log::test();
        let options = AnalysisOptions {
            mode,
            ..AnalysisOptions::default()
        };
        Session::new(Analyzer::new(Arc::new(backend), options))
    }

    #[tokio::test]
    async fn analyze_then_apply_all() {
        let mut session = session(
            ScriptedBackend::new().reply("\"has went\"|\"went\"|Grammar|tense\n\"teh\"|\"the\"|Spelling|typo"),
            AnalysisMode::Quick,
        );

        session.dispatch(Intent::UpdateText("I has went to teh store.".into()));
        session.dispatch(Intent::AnalyzeText);
        assert!(session.state().is_analyzing);

        session.wait_idle().await;
        let state = session.state();
        assert!(!state.is_analyzing);
        assert_eq!(state.suggestions.len(), 2);

        session.dispatch(Intent::ApplyAllSuggestions);
        assert_eq!(session.state().text, "I went to the store.");
    }

    #[tokio::test]
    async fn reader_sees_latest_snapshot() {
        let mut session = session(ScriptedBackend::new(), AnalysisMode::Quick);
        let reader = session.reader();
        let before = reader.get();

        session.dispatch(Intent::UpdateText("hello".into()));
        assert_eq!(before.text, "");
        assert_eq!(reader.get().text, "hello");
    }

    #[tokio::test]
    async fn blank_text_finishes_without_backend() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = Session::new(Analyzer::new(backend.clone(), AnalysisOptions::default()));

        session.dispatch(Intent::AnalyzeText);
        session.wait_idle().await;

        assert!(!session.state().is_analyzing);
        assert_eq!(session.state().error, None);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn total_failure_sets_error() {
        let mut session = session(ScriptedBackend::new().fail("offline"), AnalysisMode::Thorough);
        session.dispatch(Intent::UpdateText("Some text here.".into()));
        session.dispatch(Intent::AnalyzeText);
        session.wait_idle().await;

        let state = session.state();
        assert!(!state.is_analyzing);
        assert!(state.suggestions.is_empty());
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to analyze text: model request failed: offline")
        );

        session.dispatch(Intent::ClearError);
        assert_eq!(session.state().error, None);
    }

    #[tokio::test]
    async fn partial_failure_keeps_results() {
        let mut session = session(
            ScriptedBackend::new()
                .fail_when("grammar errors only", "offline")
                .when("spelling mistakes", "\"teh\"|\"the\"|Spelling|typo|0.7"),
            AnalysisMode::Thorough,
        );
        session.dispatch(Intent::UpdateText("teh end".into()));
        session.dispatch(Intent::AnalyzeText);
        session.wait_idle().await;

        let state = session.state();
        assert_eq!(state.error, None);
        assert_eq!(state.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn streamed_suggestions_arrive_before_the_final_list() {
        let mut session = session(
            ScriptedBackend::new().stream_when("micro-edits", ["\"a\"|\"an\"|Grammar|x\n", "\"b\"|\"be\"|Grammar|y\n"]),
            AnalysisMode::Streaming,
        );
        session.dispatch(Intent::UpdateText("a b".into()));
        session.dispatch(Intent::AnalyzeText);

        session.next_event().await;
        let state = session.state();
        assert!(state.is_analyzing);
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.suggestions[0].original, "a");

        session.wait_idle().await;
        assert_eq!(session.state().suggestions.len(), 2);
    }

    #[tokio::test]
    async fn suggestions_settled_while_streaming_stay_settled() {
        let mut session = session(
            ScriptedBackend::new().stream_when(
                "micro-edits",
                ["\"has went\"|\"went\"|Grammar|tense\n", "\"teh\"|\"the\"|Spelling|typo\n"],
            ),
            AnalysisMode::Streaming,
        );
        session.dispatch(Intent::UpdateText("I has went to teh store.".into()));
        session.dispatch(Intent::AnalyzeText);

        session.next_event().await;
        session.next_event().await;
        let streamed = session.state().suggestions.clone();
        assert_eq!(streamed.len(), 2);

        session.dispatch(Intent::ApplySuggestion(streamed[0].clone()));
        session.dispatch(Intent::RejectSuggestion(streamed[1].clone()));
        session.wait_idle().await;

        let state = session.state();
        assert!(!state.is_analyzing);
        assert_eq!(state.text, "I went to teh store.");
        assert!(state.suggestions.is_empty(), "{:?}", state.suggestions);
    }

    #[tokio::test(start_paused = true)]
    async fn new_analysis_supersedes_the_running_one() {
        let mut session = session(
            ScriptedBackend::new()
                .when("first draft", "\"first\"|\"1st\"|Grammar|x")
                .when("second draft", "\"second\"|\"2nd\"|Grammar|y")
                .with_delay(Duration::from_secs(1)),
            AnalysisMode::Quick,
        );

        session.dispatch(Intent::UpdateText("first draft".into()));
        session.dispatch(Intent::AnalyzeText);
        tokio::time::sleep(Duration::from_millis(500)).await;

        session.dispatch(Intent::UpdateText("second draft".into()));
        session.dispatch(Intent::AnalyzeText);
        assert_eq!(session.state().analysis_generation, 2);

        session.wait_idle().await;
        let state = session.state();
        assert_eq!(state.suggestions.len(), 1);
        assert_eq!(state.suggestions[0].original, "second");
        assert_eq!(session.pump(), 0);
    }

    #[tokio::test]
    async fn auto_analyze_on_sentence_completion() {
        let mut session = session(
            ScriptedBackend::new().reply("\"has went\"|\"went\"|Grammar|tense"),
            AnalysisMode::Quick,
        )
        .with_auto_analyze(true);

        session.dispatch(Intent::UpdateText("I has went".into()));
        assert!(!session.state().is_analyzing);

        let effects = session.dispatch(Intent::UpdateText("I has went.".into()));
        assert!(effects.iter().any(|e| matches!(e, Effect::Analyze { .. })));
        assert!(session.state().is_analyzing);

        session.wait_idle().await;
        assert_eq!(session.state().suggestions.len(), 1);
    }

    #[tokio::test]
    async fn no_auto_analyze_right_after_a_deletion() {
        let mut session = session(ScriptedBackend::new(), AnalysisMode::Quick).with_auto_analyze(true);

        session.dispatch(Intent::UpdateText("I has went".into()));
        session.dispatch(Intent::UpdateText("I has wen".into()));
        let effects = session.dispatch(Intent::UpdateText("I has went.".into()));

        assert!(effects.iter().any(|e| matches!(e, Effect::Boundary(_))));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Analyze { .. })));
        assert!(!session.state().is_analyzing);
    }
}
