//! Logging setup for mend: a log file, plus stderr when asked for.
//!
//! The file gets `warn` and above unless a filter is set in the environment.
//! Stderr is enabled when `MEND_LOG` or `RUST_LOG` is set, and always in
//! debug builds.
//!
//! ## Environment Variables
//!
//! 1. **`MEND_LOG`** (highest priority). A bare level such as `debug` applies
//!    to every mend crate; anything with `=`, `:` or `,` is used verbatim.
//! 2. **`RUST_LOG`**, used verbatim.
//! 3. **Default**: `warn` globally, `info` for mend crates.
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/mend/logs/mend-<pid>.log`
//! - macOS: `~/Library/Application Support/mend/logs/mend-12345.log`
//! - Linux: `~/.local/share/mend/logs/mend-12345.log`
//!
//! Override with `--log-file <path>`. A path with an extension names the
//! file; any other path names the directory.

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type Error = Box<dyn std::error::Error + Send + Sync>;

const CRATES: [&str; 4] = ["mend", "mend_bin", "mend_agent_command", "mend_log"];

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program.
/// Dropping it flushes and stops the background file writer.
pub fn init(config: LogConfig) -> Result<LogGuard, Error> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let console_enabled = env_filter_set() || cfg!(debug_assertions);
    let console_layer = console_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(create_filter())
    });

    Registry::default()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize console-only logging for tests.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn env_filter_set() -> bool {
    env::var("MEND_LOG").is_ok() || env::var("RUST_LOG").is_ok()
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("mend-{}.log", std::process::id());

    match override_path {
        Some(path) if path.extension().is_some() => {
            let dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            (dir, name)
        },
        Some(dir) => (dir, filename),
        None => {
            let dir = dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mend")
                .join("logs");
            (dir, filename)
        },
    }
}

/// File filter: the environment's filter when one is set, else `warn`.
fn create_file_filter() -> EnvFilter {
    if env_filter_set() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

/// `MEND_LOG` > `RUST_LOG` > default.
fn create_filter() -> EnvFilter {
    if let Ok(mend_log) = env::var("MEND_LOG") {
        return EnvFilter::new(expand_mend_log(&mend_log));
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(expand_mend_log("info"))
}

/// `debug` becomes `warn,mend=debug,mend_bin=debug,...`; directives are
/// passed through.
fn expand_mend_log(mend_log: &str) -> String {
    if mend_log.contains(['=', ':', ',']) {
        return mend_log.to_string();
    }

    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|krate| format!("{krate}={mend_log}")));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_expands_to_every_crate() {
        assert_eq!(
            expand_mend_log("debug"),
            "warn,mend=debug,mend_bin=debug,mend_agent_command=debug,mend_log=debug"
        );
    }

    #[test]
    fn directives_pass_through() {
        assert_eq!(expand_mend_log("mend=trace"), "mend=trace");
        assert_eq!(expand_mend_log("info,mend::session=trace"), "info,mend::session=trace");
    }

    #[test]
    fn log_file_override_with_extension() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let path = tmp_dir.path().join("custom.log");

        let (dir, name) = resolve_log_path(Some(path));
        assert_eq!(dir, tmp_dir.path());
        assert_eq!(name, "custom.log");
    }

    #[test]
    fn log_file_override_directory() {
        let tmp_dir = tempfile::tempdir().unwrap();

        let (dir, name) = resolve_log_path(Some(tmp_dir.path().to_path_buf()));
        assert_eq!(dir, tmp_dir.path());
        assert_eq!(name, format!("mend-{}.log", std::process::id()));
    }

    #[test]
    fn bare_file_name_lands_in_current_directory() {
        let (dir, name) = resolve_log_path(Some(PathBuf::from("run.log")));
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "run.log");
    }
}
