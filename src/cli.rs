//! Command-line argument parsing for `gconsole`.

use crate::config::Config;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// An interactive console for graph query languages.
#[derive(Parser, Debug)]
#[command(name = "gconsole")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// State database path (overrides the config file)
    #[arg(long, value_name = "PATH", conflicts_with = "in_memory")]
    pub state_db: Option<PathBuf>,

    /// Keep favorites in memory only
    #[arg(long)]
    pub in_memory: bool,

    /// Read input from a script file instead of the terminal (use "-" for stdin)
    #[arg(long, value_name = "PATH")]
    pub script: Option<String>,

    /// Print how each block splits without executing it
    #[arg(long)]
    pub split_only: bool,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Log to a file instead of stderr (defaults to the platform state directory)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the output format from the --output argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Returns the log file to write to, if file logging was requested.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .as_ref()
            .map(|path| path.clone().unwrap_or_else(crate::logging::get_log_path))
    }

    /// Returns true when input comes from the terminal.
    pub fn is_interactive(&self) -> bool {
        self.script.is_none()
    }

    /// Validates argument combinations clap cannot express.
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.parse_output_format()?;

        if matches!(self.script.as_deref(), Some("")) {
            return Err("--script requires a path or \"-\"".to_string());
        }

        Ok(())
    }
}
