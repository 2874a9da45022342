use futures::{stream, stream::BoxStream, StreamExt};
use mend::BackendError;
use snafu::{ResultExt, Snafu};
use std::{
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    process::{Child, ChildStdout, Command},
    task::JoinHandle,
    time::{timeout_at, Instant},
};
use tracing::{debug, trace};

const READ_BUFFER: usize = 4096;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProcessError {
    #[snafu(display("Failed to spawn {program}: {source}"))]
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to get process stdio"))]
    StdioFailed,

    #[snafu(display("Failed to read output of {program}: {source}"))]
    ReadFailed {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("{program} exited with {status}: {stderr}"))]
    ExitFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[snafu(display("{program} did not finish within {timeout:?}"))]
    TimedOut { program: String, timeout: Duration },
}

impl From<ProcessError> for BackendError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::TimedOut { timeout, .. } => BackendError::Timeout(timeout),
            other => BackendError::Request(other.to_string()),
        }
    }
}

/// How to run the model client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// One running request: the prompt is being written to stdin while the
/// caller reads stdout.
///
/// The child is killed if this is dropped before it exits.
pub struct ModelProcess {
    program: String,
    child: Child,
    stdout: ChildStdout,
    stdin_handle: JoinHandle<std::io::Result<()>>,
    stderr_handle: JoinHandle<String>,
}

impl ModelProcess {
    pub fn spawn(spec: &CommandSpec, prompt: &str) -> Result<Self, ProcessError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        debug!("Spawning {} {:?}", spec.program, spec.args);
        let mut child = command.spawn().context(SpawnFailedSnafu {
            program: spec.program.clone(),
        })?;

        let (Some(mut stdin), Some(stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return StdioFailedSnafu.fail();
        };

        // Stdin is fed concurrently with the stdout reads.
        let prompt = prompt.to_string();
        let stdin_handle = tokio::spawn(async move {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await
        });

        let stderr_handle = tokio::spawn(async move {
            let mut captured = String::new();
            if let Err(err) = stderr.read_to_string(&mut captured).await {
                trace!("Stopped reading stderr: {err}");
            }
            captured
        });

        Ok(Self {
            program: spec.program.clone(),
            child,
            stdout,
            stdin_handle,
            stderr_handle,
        })
    }

    /// Collect all of stdout and wait for a successful exit.
    pub async fn read_to_end(mut self) -> Result<String, ProcessError> {
        let mut output = String::new();
        self.stdout
            .read_to_string(&mut output)
            .await
            .context(ReadFailedSnafu {
                program: self.program.clone(),
            })?;
        self.finish().await?;
        Ok(output)
    }

    /// Yield stdout as it arrives, as valid UTF-8 chunks. The stream ends
    /// with an error if the process fails or `timeout` elapses first.
    pub fn into_chunks(self, timeout: Duration) -> BoxStream<'static, Result<String, ProcessError>> {
        let deadline = Instant::now() + timeout;
        stream::unfold(Some((self, Vec::new())), move |state| async move {
            let (mut process, mut carry) = state?;
            let mut buffer = [0u8; READ_BUFFER];
            loop {
                let read = match timeout_at(deadline, process.stdout.read(&mut buffer)).await {
                    Ok(read) => read,
                    Err(_) => {
                        let program = process.program.clone();
                        return Some((Err(ProcessError::TimedOut { program, timeout }), None));
                    },
                };

                match read {
                    Ok(0) => {
                        let tail = (!carry.is_empty())
                            .then(|| String::from_utf8_lossy(&carry).into_owned());
                        return match process.finish().await {
                            Err(err) => Some((Err(err), None)),
                            Ok(()) => tail.map(|tail| (Ok(tail), None)),
                        };
                    },
                    Ok(n) => {
                        carry.extend_from_slice(&buffer[..n]);
                        if let Some(chunk) = take_utf8(&mut carry) {
                            return Some((Ok(chunk), Some((process, carry))));
                        }
                    },
                    Err(source) => {
                        let program = process.program.clone();
                        return Some((Err(ProcessError::ReadFailed { program, source }), None));
                    },
                }
            }
        })
        .boxed()
    }

    async fn finish(mut self) -> Result<(), ProcessError> {
        let status = self.child.wait().await.context(ReadFailedSnafu {
            program: self.program.clone(),
        })?;

        match self.stdin_handle.await {
            Ok(Err(err)) => debug!("{} did not take the whole prompt: {err}", self.program),
            Err(err) => debug!("Prompt writer for {} failed: {err}", self.program),
            Ok(Ok(())) => {},
        }
        let stderr = self.stderr_handle.await.unwrap_or_default();

        if !status.success() {
            return ExitFailedSnafu {
                program: self.program,
                status,
                stderr: stderr.trim().to_string(),
            }
            .fail();
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", self.program, stderr.trim());
        }
        Ok(())
    }
}

/// Take the longest valid UTF-8 prefix of `carry`, leaving an incomplete
/// trailing sequence for the next read. Invalid bytes are replaced.
fn take_utf8(carry: &mut Vec<u8>) -> Option<String> {
    let valid = match std::str::from_utf8(carry) {
        Ok(_) => carry.len(),
        Err(err) if err.error_len().is_some() => {
            let chunk = String::from_utf8_lossy(carry).into_owned();
            carry.clear();
            return Some(chunk);
        },
        Err(err) => err.valid_up_to(),
    };

    if valid == 0 {
        return None;
    }
    let chunk = String::from_utf8_lossy(&carry[..valid]).into_owned();
    carry.drain(..valid);
    Some(chunk)
}
