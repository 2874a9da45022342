use crate::command::{process::CommandSpec, CommandBackend};
use mend::BackendConfig;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct CommandBackendBuilder {
    spec: CommandSpec,
}

impl CommandBackendBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            spec: CommandSpec::new(program),
        }
    }

    /// Start from the `[backend]` table of a [`mend::Config`].
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.program.clone())
            .args(config.args.iter().cloned())
            .timeout(config.timeout())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.spec.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.spec.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.cwd = Some(dir.into());
        self
    }

    /// Upper bound for one request, spawn to exit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    pub fn build(self) -> CommandBackend {
        CommandBackend { spec: self.spec }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_copies_the_backend_table() {
        let config = BackendConfig {
            program: "ollama".into(),
            args: vec!["run".into(), "llama3".into()],
            timeout_secs: 7,
        };

        let backend = CommandBackendBuilder::from_config(&config).arg("--nowordwrap").build();
        assert_eq!(backend.program(), "ollama");
        assert_eq!(backend.spec.args, ["run", "llama3", "--nowordwrap"]);
        assert_eq!(backend.spec.timeout, Duration::from_secs(7));
    }

    #[test]
    fn env_and_cwd() {
        let backend = CommandBackendBuilder::new("llm")
            .env("LLM_KEY", "secret")
            .cwd("/tmp")
            .build();
        assert_eq!(backend.spec.env, [("LLM_KEY".to_string(), "secret".to_string())]);
        assert_eq!(backend.spec.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(backend.spec.timeout, Duration::from_secs(60));
    }
}
