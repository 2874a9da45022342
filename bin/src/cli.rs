use clap::{Parser, Subcommand, ValueEnum};
use mend::{AnalysisMode, ResponseFormat};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mend", version, about = "Model-suggested writing corrections")]
pub struct Cli {
    /// Config file to use instead of `<config_dir>/mend/config.toml`
    #[arg(long, global = true, env = "MEND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file, or directory for the log file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a document and print the suggestions
    Check {
        /// File to analyze, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,

        /// Analysis mode, overriding the config
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Print each suggestion as soon as it is accepted
        #[arg(long)]
        stream: bool,
    },

    /// Analyze a document and apply every suggestion
    Fix {
        /// File to fix, `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Overwrite the input file instead of printing the result
        #[arg(short, long)]
        in_place: bool,

        /// Analysis mode, overriding the config
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
    },

    /// Parse a raw model response from stdin
    Parse {
        /// Shape of the response
        #[arg(short, long, value_enum, default_value = "lines")]
        format: FormatArg,

        /// Print suggestions as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Quick,
    Thorough,
    Streaming,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Quick => AnalysisMode::Quick,
            ModeArg::Thorough => AnalysisMode::Thorough,
            ModeArg::Streaming => AnalysisMode::Streaming,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Lines,
    Scored,
    Objects,
}

impl From<FormatArg> for ResponseFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Lines => ResponseFormat::Lines,
            FormatArg::Scored => ResponseFormat::ScoredLines,
            FormatArg::Objects => ResponseFormat::Objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_defaults_to_stdin() {
        let cli = Cli::parse_from(["mend", "check"]);
        match cli.command {
            Command::Check {
                input,
                json,
                mode,
                stream,
            } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(!json);
                assert_eq!(mode, None);
                assert!(!stream);
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "mend",
            "fix",
            "notes.txt",
            "--in-place",
            "--mode",
            "thorough",
            "--config",
            "mend.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("mend.toml")));
        match cli.command {
            Command::Fix {
                input,
                in_place,
                mode,
            } => {
                assert_eq!(input, PathBuf::from("notes.txt"));
                assert!(in_place);
                assert_eq!(mode.map(AnalysisMode::from), Some(AnalysisMode::Thorough));
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_format_names() {
        let cli = Cli::parse_from(["mend", "parse", "--format", "scored"]);
        match cli.command {
            Command::Parse { format, .. } => {
                assert_eq!(ResponseFormat::from(format), ResponseFormat::ScoredLines)
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
