//! Runs analysis requests against a [`Backend`] and collects the results.
//!
//! A failing request never aborts the analysis: it is logged, recorded in
//! the [`AnalysisReport`], and the remaining requests still run. Only when
//! every request failed does the report count as a failure.

use crate::{
    backend::Backend,
    config::Config,
    parse::{self, LineAccumulator, ResponseFormat},
    prompt::{self, Pass, DEFAULT_MAX_SUGGESTIONS},
    store::{rank, SuggestionStore, MAX_SUGGESTIONS},
    suggestion::{Category, Suggestion},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// One general request.
    #[default]
    Quick,
    /// Every configured focused pass, then the structured check.
    Thorough,
    /// One general request, read line by line as it arrives.
    Streaming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub mode: AnalysisMode,
    /// Cap on suggestions requested per prompt.
    pub max_suggestions: usize,
    /// Cap on the ranked result.
    pub max_ranked: usize,
    pub passes: Vec<Pass>,
    pub structured_check: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            max_ranked: MAX_SUGGESTIONS,
            passes: Pass::ALL.to_vec(),
            structured_check: true,
        }
    }
}

impl From<&Config> for AnalysisOptions {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.mode,
            max_suggestions: config.max_suggestions,
            max_ranked: config.max_ranked,
            passes: config.passes.clone(),
            structured_check: config.structured_check,
        }
    }
}

/// A request that failed and what it failed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFailure {
    pub request: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    /// Ranked, capped suggestions.
    pub suggestions: Vec<Suggestion>,
    /// Number of requests sent.
    pub attempted: usize,
    pub failures: Vec<PassFailure>,
}

impl AnalysisReport {
    /// Every request failed and nothing was salvaged.
    pub fn is_total_failure(&self) -> bool {
        self.attempted > 0 && self.failures.len() >= self.attempted && self.suggestions.is_empty()
    }

    /// Message for the session's error slot, set only on total failure.
    pub fn error_message(&self) -> Option<String> {
        if !self.is_total_failure() {
            return None;
        }
        let cause = self
            .failures
            .last()
            .map_or("unknown error", |failure| failure.message.as_str());
        Some(format!("Failed to analyze text: {cause}"))
    }
}

/// Drives one backend with fixed options.
pub struct Analyzer {
    backend: Arc<dyn Backend>,
    options: AnalysisOptions,
}

impl Analyzer {
    pub fn new(backend: Arc<dyn Backend>, options: AnalysisOptions) -> Self {
        Self { backend, options }
    }

    /// Analyze `text` with a fresh store.
    pub async fn analyze(&self, text: &str) -> AnalysisReport {
        self.analyze_into(text, SuggestionStore::new()).await
    }

    /// Analyze `text`, collecting into `store`.
    ///
    /// Subscribers of `store` see each suggestion as it is accepted. The
    /// store is dropped on return, which ends their streams.
    pub async fn analyze_into(&self, text: &str, mut store: SuggestionStore) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        if text.trim().is_empty() {
            debug!("Skipping analysis of blank text");
            return report;
        }

        info!(
            "Analyzing {} chars in {:?} mode",
            text.len(),
            self.options.mode
        );
        let max = self.options.max_suggestions;

        match self.options.mode {
            AnalysisMode::Quick => {
                let prompt = prompt::micro_edit(text, max);
                self.run(&mut report, &mut store, "general", &prompt, ResponseFormat::Lines, Category::Grammar)
                    .await;
            },
            AnalysisMode::Thorough => {
                for pass in &self.options.passes {
                    let prompt = pass.prompt(text, max);
                    self.run(
                        &mut report,
                        &mut store,
                        pass.name(),
                        &prompt,
                        ResponseFormat::ScoredLines,
                        pass.category(),
                    )
                    .await;
                }
                if self.options.structured_check {
                    let prompt = prompt::structured_check(text, max);
                    self.run(
                        &mut report,
                        &mut store,
                        "structured",
                        &prompt,
                        ResponseFormat::Objects,
                        Category::Grammar,
                    )
                    .await;
                }
            },
            AnalysisMode::Streaming => {
                let prompt = prompt::micro_edit(text, max);
                self.run_streaming(&mut report, &mut store, &prompt).await;
            },
        }

        report.suggestions = rank(store.drain(), self.options.max_ranked);
        info!(
            "Analysis produced {} suggestions, {}/{} requests failed",
            report.suggestions.len(),
            report.failures.len(),
            report.attempted
        );
        report
    }

    async fn run(
        &self,
        report: &mut AnalysisReport,
        store: &mut SuggestionStore,
        request: &'static str,
        prompt: &str,
        format: ResponseFormat,
        default_category: Category,
    ) {
        report.attempted += 1;
        match self.backend.generate(prompt).await {
            Ok(response) => {
                let parsed = parse::parse_with(&response, format, default_category);
                let accepted = store.extend(parsed);
                debug!("Request {request} added {accepted} suggestions");
            },
            Err(err) => {
                warn!("Request {request} failed: {err}");
                report.failures.push(PassFailure {
                    request,
                    message: err.to_string(),
                });
            },
        }
    }

    async fn run_streaming(&self, report: &mut AnalysisReport, store: &mut SuggestionStore, prompt: &str) {
        report.attempted += 1;
        let mut lines = LineAccumulator::new();
        let mut chunks = self.backend.generate_streaming(prompt);

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => {
                    for line in lines.push(&chunk) {
                        if let Some(suggestion) = parse::parse_line(&line, Category::Grammar) {
                            store.add(suggestion);
                        }
                    }
                },
                Err(err) => {
                    warn!("Streaming request failed: {err}");
                    report.failures.push(PassFailure {
                        request: "streaming",
                        message: err.to_string(),
                    });
                    return;
                },
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(suggestion) = parse::parse_line(&line, Category::Grammar) {
                store.add(suggestion);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedBackend;

    fn analyzer(backend: ScriptedBackend, mode: AnalysisMode) -> (Arc<ScriptedBackend>, Analyzer) {
        let backend = Arc::new(backend);
        let options = AnalysisOptions {
            mode,
            ..AnalysisOptions::default()
        };
        (backend.clone(), Analyzer::new(backend, options))
    }

    #[tokio::test]
    async fn quick_mode_sends_one_general_request() {
        let (backend, analyzer) = analyzer(
            ScriptedBackend::new().reply("\"Him\"|\"He\"|Grammar|Use subject pronoun\nNONE\ngarbage-line"),
            AnalysisMode::Quick,
        );

        let report = analyzer.analyze("Him went home.").await;
        assert_eq!(report.attempted, 1);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].replacement, "He");
        assert!(backend.calls()[0].contains("propose up to 5 micro-edits"));
    }

    #[tokio::test]
    async fn blank_text_sends_nothing() {
        let (backend, analyzer) = analyzer(ScriptedBackend::new(), AnalysisMode::Thorough);
        let report = analyzer.analyze("  \n ").await;
        assert_eq!(report, AnalysisReport::default());
        assert!(!report.is_total_failure());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn thorough_mode_runs_every_pass_and_merges() {
        let (backend, analyzer) = analyzer(
            ScriptedBackend::new()
                .when("spelling mistakes", "\"teh\"|\"the\"||typo|0.6")
                .when("grammar errors only", "\"has went\"|\"went\"|Grammar|tense|0.95\n\"teh\"|\"the\"|Spelling|dup|0.1")
                .when("JSON array", r#"[{"original": "store", "suggestion": "the store", "category": "Article_Usage"}]"#),
            AnalysisMode::Thorough,
        );

        let report = analyzer.analyze("I has went to teh store.").await;
        assert_eq!(report.attempted, 6);
        assert_eq!(backend.calls().len(), 6);
        assert!(report.failures.is_empty());

        let ranked: Vec<_> = report
            .suggestions
            .iter()
            .map(|s| (s.original.as_str(), s.category))
            .collect();
        assert_eq!(
            ranked,
            [
                ("store", Category::ArticleUsage),
                ("has went", Category::Grammar),
                ("teh", Category::Spelling),
            ]
        );
    }

    #[tokio::test]
    async fn failed_pass_does_not_stop_the_others() {
        let (_, analyzer) = analyzer(
            ScriptedBackend::new()
                .fail_when("grammar errors only", "rate limited")
                .when("spelling mistakes", "\"teh\"|\"the\"|Spelling|typo|0.6"),
            AnalysisMode::Thorough,
        );

        let report = analyzer.analyze("teh cat").await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].request, "grammar");
        assert_eq!(report.suggestions.len(), 1);
        assert!(!report.is_total_failure());
        assert_eq!(report.error_message(), None);
    }

    #[tokio::test]
    async fn every_pass_failing_is_total_failure() {
        let (_, analyzer) = analyzer(ScriptedBackend::new().fail("offline"), AnalysisMode::Thorough);

        let report = analyzer.analyze("Some text here.").await;
        assert_eq!(report.failures.len(), report.attempted);
        assert!(report.is_total_failure());
        assert_eq!(
            report.error_message().as_deref(),
            Some("Failed to analyze text: model request failed: offline")
        );
    }

    #[tokio::test]
    async fn streaming_publishes_lines_as_they_complete() {
        let (_, analyzer) = analyzer(
            ScriptedBackend::new().stream_when(
                "micro-edits",
                ["\"Him\"|\"He\"|Gram", "mar|pronoun\n\"teh\"|\"the\"|Spel", "ling|typo\n\"b\"|\"c\""],
            ),
            AnalysisMode::Streaming,
        );

        let mut store = SuggestionStore::new();
        let mut published = store.subscribe();
        let report = analyzer.analyze_into("Him saw teh b", store).await;

        let mut order = Vec::new();
        while let Some(suggestion) = published.recv().await {
            order.push(suggestion.original);
        }
        assert_eq!(order, ["Him", "teh", "b"]);
        assert_eq!(report.suggestions.len(), 3);
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.original == "teh" && s.category == Category::Spelling));
    }

    #[tokio::test]
    async fn streaming_failure_is_reported() {
        let (_, analyzer) = analyzer(ScriptedBackend::new().fail("dropped"), AnalysisMode::Streaming);
        let report = analyzer.analyze("anything").await;
        assert!(report.is_total_failure());
    }

    #[test]
    fn options_follow_config() {
        let config = Config {
            mode: AnalysisMode::Thorough,
            max_suggestions: 9,
            passes: vec![Pass::Spelling],
            structured_check: false,
            ..Config::default()
        };
        let options = AnalysisOptions::from(&config);
        assert_eq!(options.mode, AnalysisMode::Thorough);
        assert_eq!(options.max_suggestions, 9);
        assert_eq!(options.passes, [Pass::Spelling]);
        assert!(!options.structured_check);
    }
}
