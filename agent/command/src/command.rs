pub mod builder;
pub mod process;

pub use self::builder::CommandBackendBuilder;
use self::process::{CommandSpec, ModelProcess, ProcessError};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use mend::{Backend, BackendConfig, BackendError, ChunkStream};
use tokio::time::timeout;
use tracing::{debug, info};

/// A [`Backend`] that runs a command-line model client per request.
///
/// The prompt goes to the client's stdin and the response is read from its
/// stdout. Any client that works that way can be used, e.g. `llm`,
/// `ollama run <model>`, or a shell script.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    spec: CommandSpec,
}

impl CommandBackend {
    pub fn builder(program: impl Into<String>) -> CommandBackendBuilder {
        CommandBackendBuilder::new(program)
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        CommandBackendBuilder::from_config(config).build()
    }

    pub fn program(&self) -> &str {
        &self.spec.program
    }
}

#[async_trait]
impl Backend for CommandBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        info!("Requesting {} ({} byte prompt)", self.spec.program, prompt.len());
        let process = ModelProcess::spawn(&self.spec, prompt)?;

        let output = match timeout(self.spec.timeout, process.read_to_end()).await {
            Ok(output) => output?,
            Err(_) => {
                return Err(ProcessError::TimedOut {
                    program: self.spec.program.clone(),
                    timeout: self.spec.timeout,
                }
                .into())
            },
        };

        if output.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        debug!("{} answered with {} bytes", self.spec.program, output.len());
        Ok(output)
    }

    fn generate_streaming<'a>(&'a self, prompt: &'a str) -> ChunkStream<'a> {
        info!("Streaming from {} ({} byte prompt)", self.spec.program, prompt.len());
        match ModelProcess::spawn(&self.spec, prompt) {
            Ok(process) => process
                .into_chunks(self.spec.timeout)
                .map_err(BackendError::from)
                .boxed(),
            Err(err) => stream::once(async move { Err(err.into()) }).boxed(),
        }
    }
}
