use anyhow::bail;
use mend::{AnalysisOptions, Analyzer, Backend, Intent, Session, SessionState};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixed {
    pub text: String,
    pub applied: usize,
}

/// Analyze `text` and apply every suggestion that still matches.
pub async fn run(backend: Arc<dyn Backend>, options: AnalysisOptions, text: String) -> anyhow::Result<Fixed> {
    let mut session = Session::new(Analyzer::new(backend, options)).with_state(SessionState::with_text(text));
    session.dispatch(Intent::AnalyzeText);
    session.wait_idle().await;

    let analyzed = session.state();
    if let Some(error) = &analyzed.error {
        bail!("{error}");
    }
    let offered = analyzed.suggestions.len();

    session.dispatch(Intent::ApplyAllSuggestions);
    let state = session.state();
    info!("Applied {} of {} suggestions", state.applied_edits.len(), offered);

    Ok(Fixed {
        text: state.text.clone(),
        applied: state.applied_edits.len(),
    })
}
