//! CLI argument definitions for the reserva pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "reserva",
    version,
    about = "Reserva - booking cancellation retraining pipeline",
    long_about = "Retrain the booking-cancellation classifier from a bucketed \
                  reservations dataset.\n\n\
                  Downloads the raw table, splits and preprocesses it, balances the \
                  training classes, selects the most informative features, runs a \
                  randomized hyperparameter search over the boosted-tree classifier, \
                  and persists the model with its evaluation metrics."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full retraining pipeline.
    Run(RunArgs),

    /// Print the resolved pipeline configuration and exit.
    ShowConfig(ShowConfigArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the pipeline configuration file.
    #[arg(long = "config", value_name = "PATH", default_value = "config/config.yaml")]
    pub config: PathBuf,

    /// Root directory for all pipeline artifacts.
    #[arg(long = "artifacts-dir", value_name = "DIR", default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Local directory acting as the bucket mirror
    /// (`<DIR>/<bucket>/<object>`).
    #[arg(long = "bucket-root", value_name = "DIR", conflicts_with = "bucket_endpoint")]
    pub bucket_root: Option<PathBuf>,

    /// HTTPS endpoint serving bucket objects
    /// (`<URL>/<bucket>/<object>`).
    #[arg(long = "bucket-endpoint", value_name = "URL")]
    pub bucket_endpoint: Option<String>,
}

#[derive(Parser)]
pub struct ShowConfigArgs {
    /// Path to the pipeline configuration file.
    #[arg(long = "config", value_name = "PATH", default_value = "config/config.yaml")]
    pub config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_resolve() {
        let cli = Cli::parse_from(["reserva", "run", "--bucket-root", "/data"]);
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.config, PathBuf::from("config/config.yaml"));
        assert_eq!(args.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(args.bucket_root, Some(PathBuf::from("/data")));
    }
}
