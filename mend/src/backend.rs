use async_trait::async_trait;
use futures::{stream, stream::BoxStream, StreamExt};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("model request failed: {0}")]
    Request(String),

    #[error("model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("model returned an empty response")]
    EmptyResponse,
}

/// Fragments of a response in arrival order.
pub type ChunkStream<'a> = BoxStream<'a, Result<String, BackendError>>;

/// A generative model reachable from this process.
///
/// Implementations are slow and fallible; callers run them off the
/// reducer and contain their failures.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Send `prompt` and wait for the whole response.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;

    /// Send `prompt` and yield the response as it is produced.
    ///
    /// Backends without incremental output produce the whole response as
    /// a single chunk.
    fn generate_streaming<'a>(&'a self, prompt: &'a str) -> ChunkStream<'a> {
        stream::once(self.generate(prompt)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    struct Echo;

    #[async_trait]
    impl Backend for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
            Ok(prompt.to_uppercase())
        }
    }

    #[tokio::test]
    async fn default_streaming_is_one_chunk() {
        let chunks: Vec<String> = Echo.generate_streaming("hi").try_collect().await.unwrap();
        assert_eq!(chunks, ["HI"]);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            BackendError::Timeout(Duration::from_secs(2)).to_string(),
            "model request timed out after 2s"
        );
        assert_eq!(
            BackendError::Request("offline".into()).to_string(),
            "model request failed: offline"
        );
    }
}
