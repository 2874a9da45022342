//! In-memory [`Backend`] for tests.

use crate::backend::{Backend, BackendError, ChunkStream};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Chunks(Vec<String>),
    Fail(String),
}

/// Replays canned responses chosen by substring match on the prompt.
///
/// Rules are checked in the order they were added; the first rule whose
/// needle occurs in the prompt answers. Prompts matching no rule get the
/// fallback reply, `NONE` unless changed with [`ScriptedBackend::reply`].
#[derive(Debug)]
pub struct ScriptedBackend {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::Text("NONE".to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every unmatched prompt with `response`.
    pub fn reply(mut self, response: impl Into<String>) -> Self {
        self.fallback = Reply::Text(response.into());
        self
    }

    /// Answer prompts containing `needle` with `response`.
    pub fn when(mut self, needle: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(response.into())));
        self
    }

    /// Fail prompts containing `needle`.
    pub fn fail_when(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Fail(message.into())));
        self
    }

    /// Fail every unmatched prompt.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.fallback = Reply::Fail(message.into());
        self
    }

    /// Answer prompts containing `needle` with `chunks`, delivered one at a
    /// time by [`Backend::generate_streaming`].
    pub fn stream_when(
        mut self,
        needle: impl Into<String>,
        chunks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let chunks = chunks.into_iter().map(Into::into).collect();
        self.rules.push((needle.into(), Reply::Chunks(chunks)));
        self
    }

    /// Wait before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn lookup(&self, prompt: &str) -> Reply {
        self.calls.lock().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map_or_else(|| self.fallback.clone(), |(_, reply)| reply.clone())
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let reply = self.lookup(prompt);
        self.pause().await;
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Chunks(chunks) => Ok(chunks.concat()),
            Reply::Fail(message) => Err(BackendError::Request(message)),
        }
    }

    fn generate_streaming<'a>(&'a self, prompt: &'a str) -> ChunkStream<'a> {
        let chunks = match self.lookup(prompt) {
            Reply::Text(text) => vec![Ok(text)],
            Reply::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            Reply::Fail(message) => vec![Err(BackendError::Request(message))],
        };

        stream::iter(chunks)
            .then(move |chunk| async move {
                self.pause().await;
                chunk
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn rules_match_in_order() {
        let backend = ScriptedBackend::new()
            .when("spelling", "\"teh\"|\"the\"|Spelling|typo")
            .fail_when("grammar", "offline")
            .reply("fallback");

        assert_eq!(backend.generate("check spelling").await.unwrap(), "\"teh\"|\"the\"|Spelling|typo");
        assert!(backend.generate("check grammar").await.is_err());
        assert_eq!(backend.generate("other").await.unwrap(), "fallback");
        assert_eq!(backend.calls(), ["check spelling", "check grammar", "other"]);
    }

    #[tokio::test]
    async fn streams_chunks() {
        let backend = ScriptedBackend::new().stream_when("", ["a", "b"]);
        let chunks: Vec<String> = backend.generate_streaming("x").try_collect().await.unwrap();
        assert_eq!(chunks, ["a", "b"]);
        assert_eq!(backend.generate("x").await.unwrap(), "ab");
    }
}
