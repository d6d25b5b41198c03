use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "voxtail",
    version,
    about = "Incremental message-list synchronization for chat channels",
    long_about = None
)]
pub struct CliArgs {
    /// Channel to load history for.
    #[arg(value_name = "CHANNEL_ID")]
    pub channel: String,

    /// Center the initial page around this message instead of the live edge.
    #[arg(long, value_name = "MESSAGE_ID")]
    pub nearby: Option<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// API base URL.
    #[arg(long, value_name = "URL")]
    pub api_base: Option<String>,

    /// Session token for the history API.
    #[arg(long, env = "VOXTAIL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}
