//! Command-line interface for codegauge

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Default)]
pub enum Verbosity {
    /// Quiet mode - only show errors
    Quiet = 0,

    /// Normal mode - show errors and warnings
    #[default]
    Normal = 1,

    /// Verbose mode - show errors, warnings, and info
    Verbose = 2,

    /// Debug mode - show everything including debug info
    Debug = 3,
}

impl From<u8> for Verbosity {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }
}

impl Verbosity {
    /// Log level used when `RUST_LOG` is not set
    pub fn log_level(&self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Warn,
            Verbosity::Verbose => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal summary
    #[default]
    Pretty,

    /// Full report as JSON
    Json,
}

/// codegauge - static-analysis aggregation and scoring
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Runs Python analyzers over a project and scores the results",
    long_about = "codegauge runs ruff, bandit, radon and jscpd over a project tree, normalizes their findings into one issue list, and scores the project per category along with a per-file structural risk ranking."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v=info, -vv=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Custom configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::from(self.verbose)
        }
    }
}

/// Commands that codegauge can execute
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a project and print its scores
    Analyze(AnalyzeArgs),

    /// List registered analyzers with their availability
    #[command(visible_alias = "list-tools")]
    Tools(ToolsArgs),
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Project directory to analyze
    #[arg(name = "PATH")]
    pub path: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the per-file structure scorer
    #[arg(long)]
    pub no_structure: bool,

    /// Maximum number of analyzers running at once
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Only run the named analyzers
    #[arg(long, value_delimiter = ',')]
    pub tools: Option<Vec<String>>,
}

/// Arguments for the tools command
#[derive(Args, Debug)]
pub struct ToolsArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,
}
