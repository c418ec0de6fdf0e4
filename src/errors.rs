use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for codegauge
#[derive(Debug, Error)]
pub enum GaugeError {
    /// The project tree to analyze does not exist
    #[error("Project path '{0}' does not exist or is not a directory")]
    ProjectNotFound(PathBuf),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool errors that escaped an adapter
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// The analysis was cancelled before it completed
    #[error("Analysis was cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error loading configuration file
    #[error("Failed to load config from {path}: {message}")]
    LoadError { path: PathBuf, message: String },

    /// TOML parsing error
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Config parsed but holds values the scorer cannot use
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failures of a single sandboxed process run
#[derive(Debug, Error)]
pub enum SandboxError {
    /// No program was given
    #[error("Command must be a non-empty list of arguments")]
    EmptyCommand,

    /// Working directory is missing
    #[error("Directory '{0}' does not exist")]
    MissingDirectory(PathBuf),

    /// Binary could not be found
    #[error("Command '{program}' not found. Is it installed?")]
    NotFound { program: String },

    /// Binary exists but may not be executed
    #[error("Permission denied to execute '{program}'")]
    PermissionDenied { program: String },

    /// Process exceeded its wall-clock budget and was killed
    #[error("Command '{program}' exceeded timeout of {seconds} seconds")]
    Timeout { program: String, seconds: f64 },

    /// Process exited with a code the policy does not accept
    #[error("Command '{program}' failed with {}: {output}", describe_exit(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        output: String,
    },

    /// Any other spawn or wait failure
    #[error("Unexpected error running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Adapter-level failures. None of these abort an analysis run.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool is not installed or does not answer `--version`
    #[error("Tool '{tool}' is not installed or not available")]
    Unavailable { tool: String },

    /// Tool ran past its timeout
    #[error("Tool '{tool}' timed out after {seconds} seconds")]
    Timeout { tool: String, seconds: f64 },

    /// Tool could not be started or exited with a non-whitelisted code
    #[error("Tool '{tool}' failed with {}: {message}", describe_exit(.code))]
    ExecutionFailed {
        tool: String,
        code: Option<i32>,
        message: String,
    },

    /// Tool succeeded but its output could not be parsed
    #[error("Failed to parse {tool} output: {message}")]
    MalformedOutput { tool: String, message: String },
}

impl ToolError {
    /// Attach a tool name to a sandbox failure
    pub fn from_sandbox(tool: &str, err: SandboxError) -> Self {
        let tool = tool.to_string();
        match err {
            SandboxError::NotFound { .. } => ToolError::Unavailable { tool },
            SandboxError::Timeout { seconds, .. } => ToolError::Timeout { tool, seconds },
            SandboxError::Failed { code, output, .. } => ToolError::ExecutionFailed {
                tool,
                code,
                message: output,
            },
            other => ToolError::ExecutionFailed {
                tool,
                code: None,
                message: other.to_string(),
            },
        }
    }

    /// Shorthand for a payload that failed to parse
    pub fn malformed(tool: &str, message: impl Into<String>) -> Self {
        ToolError::MalformedOutput {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    /// Name of the tool the error belongs to
    pub fn tool(&self) -> &str {
        match self {
            ToolError::Unavailable { tool }
            | ToolError::Timeout { tool, .. }
            | ToolError::ExecutionFailed { tool, .. }
            | ToolError::MalformedOutput { tool, .. } => tool,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}
