pub mod cli;
pub mod commands;

use anyhow::{bail, Context};
use cli::{Cli, Command};
use mend::{AnalysisOptions, Backend, Config};
use mend_agent_command::CommandBackend;
use std::{io::Write, path::Path, sync::Arc};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Run one parsed command line against the configured model client.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let discovered = Config::discover();
    let config = Config::load_with_overrides(cli.config.as_deref(), discovered.as_deref())?;
    debug!("Using backend {} {:?}", config.backend.program, config.backend.args);
    let backend: Arc<dyn Backend> = Arc::new(CommandBackend::from_config(&config.backend));

    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Check {
            input,
            json,
            mode,
            stream,
        } => {
            let text = read_input(&input).await?;
            let options = options(&config, mode.map(Into::into));
            commands::check::run(backend, options, &text, json, stream, &mut stdout).await?;
        },
        Command::Fix {
            input,
            in_place,
            mode,
        } => {
            if in_place && is_stdin(&input) {
                bail!("--in-place needs a file, not stdin");
            }
            let text = read_input(&input).await?;
            let options = options(&config, mode.map(Into::into));
            let fixed = commands::fix::run(backend, options, text).await?;

            if in_place {
                tokio::fs::write(&input, &fixed.text)
                    .await
                    .with_context(|| format!("Failed to write {}", input.display()))?;
                info!("Wrote {} edits to {}", fixed.applied, input.display());
            } else {
                stdout.write_all(fixed.text.as_bytes())?;
            }
        },
        Command::Parse { format, json } => {
            let raw = read_input(Path::new("-")).await?;
            commands::parse::run(&raw, format.into(), json, &mut stdout)?;
        },
    }

    stdout.flush()?;
    Ok(())
}

fn options(config: &Config, mode: Option<mend::AnalysisMode>) -> AnalysisOptions {
    let mut options = AnalysisOptions::from(config);
    if let Some(mode) = mode {
        options.mode = mode;
    }
    options
}

fn is_stdin(path: &Path) -> bool {
    path == Path::new("-")
}

async fn read_input(path: &Path) -> anyhow::Result<String> {
    if is_stdin(path) {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
