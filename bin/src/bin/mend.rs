use clap::Parser;
use mend_bin::cli::Cli;
use mend_log::LogConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _log_guard = match mend_log::init(LogConfig {
        log_file_path: cli.log_file.clone(),
    }) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {e}");
            None
        },
    };

    if let Err(e) = mend_bin::run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
