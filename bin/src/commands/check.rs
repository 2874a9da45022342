use crate::commands::{write_suggestion, write_suggestions};
use anyhow::bail;
use mend::{AnalysisOptions, Analyzer, Backend, SuggestionStore};
use std::{io::Write, sync::Arc};
use tracing::warn;

/// Analyze `text` and write the ranked suggestions to `out`.
///
/// With `stream`, each suggestion is written as soon as it is accepted
/// (one JSON object per line under `json`) instead of the ranked list.
pub async fn run(
    backend: Arc<dyn Backend>,
    options: AnalysisOptions,
    text: &str,
    json: bool,
    stream: bool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let analyzer = Analyzer::new(backend, options);

    let report = if stream {
        let mut store = SuggestionStore::new();
        let mut accepted = store.subscribe();
        let print = async {
            while let Some(suggestion) = accepted.recv().await {
                if json {
                    serde_json::to_writer(&mut *out, &suggestion)?;
                    writeln!(out)?;
                } else {
                    write_suggestion(out, &suggestion, Some(text))?;
                }
                out.flush()?;
            }
            anyhow::Ok(())
        };
        let (report, printed) = tokio::join!(analyzer.analyze_into(text, store), print);
        printed?;
        report
    } else {
        analyzer.analyze(text).await
    };

    if let Some(message) = report.error_message() {
        bail!(message);
    }
    for failure in &report.failures {
        warn!("{} request failed: {}", failure.request, failure.message);
    }

    if !stream {
        write_suggestions(out, &report.suggestions, Some(text), json)?;
    }
    Ok(report.suggestions.len())
}
