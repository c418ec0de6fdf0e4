//! Analyzer adapters supported by codegauge

use std::fmt::Display;
use std::path::Path;

use async_trait::async_trait;
use log::{info, warn};

use crate::config::defaults::NOISE_DIRECTORIES;
use crate::config::ToolSettings;
use crate::errors::ToolError;
use crate::models::{Issue, IssueCategory, ToolName};
use crate::sandbox::{CommandOutput, Sandbox};

pub mod bandit;
pub mod jscpd;
pub mod radon;
pub mod registry;
pub mod ruff;

pub use bandit::Bandit;
pub use jscpd::Jscpd;
pub use radon::Radon;
pub use registry::{AnalyzerInfo, AnalyzerRegistry};
pub use ruff::Ruff;

/// Separator between description parts
pub const DESCRIPTION_SEPARATOR: &str = " | ";

/// Trait for analyzer adapters
///
/// Implementations MUST follow these guidelines:
/// 1. Return `ToolError::Unavailable` when the tool is not installed
/// 2. Return `ToolError::MalformedOutput` when the whole payload is unreadable
/// 3. Skip (and log) individual records that do not match the expected shape
/// 4. Produce issues in the order the tool reported them
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Short identifier, also the key of its `[tools.<name>]` config section
    fn name(&self) -> &str;

    /// Human-readable name
    fn display_name(&self) -> &str;

    /// Tool identifier stamped on every issue
    fn tool(&self) -> ToolName;

    /// Category of the issues this analyzer produces
    fn category(&self) -> IssueCategory;

    /// Description of the analyzer
    fn description(&self) -> &str;

    /// Check if the tool is installed and available
    async fn is_available(&self) -> bool;

    /// Get the version of the tool, if available
    async fn version(&self) -> Option<String>;

    /// Run the tool on a project tree and normalize its findings
    async fn analyze(&self, project_path: &Path) -> Result<Vec<Issue>, ToolError>;
}

/// Common state shared by the built-in adapters
#[derive(Debug, Clone)]
pub struct AnalyzerBase {
    /// Short identifier
    pub name: String,

    /// Human-readable name
    pub display_name: String,

    /// Analyzer description
    pub description: String,

    /// Tool identifier
    pub tool: ToolName,

    /// Category of produced issues
    pub category: IssueCategory,

    /// Executable used when the settings do not override it
    pub program: String,

    /// Per-tool settings
    pub settings: ToolSettings,

    /// Process runner
    pub sandbox: Sandbox,
}

impl AnalyzerBase {
    /// Executable that will actually be spawned
    pub fn program(&self) -> &str {
        self.settings.program(&self.program)
    }

    /// Fail with `Unavailable` unless the tool answers `--version`
    pub async fn ensure_available(&self) -> Result<(), ToolError> {
        if self.sandbox.is_available(self.program()).await {
            Ok(())
        } else {
            warn!("{} is not installed or not available", self.name);
            Err(ToolError::Unavailable {
                tool: self.name.clone(),
            })
        }
    }

    /// Run the tool with `args` followed by the configured extra arguments
    pub async fn run_tool(
        &self,
        args: &[String],
        project_path: &Path,
    ) -> Result<CommandOutput, ToolError> {
        let command: Vec<&str> = std::iter::once(self.program())
            .chain(args.iter().map(String::as_str))
            .chain(self.settings.extra_args.iter().map(String::as_str))
            .collect();

        info!(
            "Running {} on {} (timeout {}s)",
            self.name,
            project_path.display(),
            self.settings.timeout_secs
        );

        match self
            .sandbox
            .run(&command, project_path, self.settings.timeout())
            .await
        {
            Ok(output) => {
                info!("{} completed in {:?}", self.name, output.duration);
                Ok(output)
            }
            Err(e) => {
                warn!("{} failed on {}: {}", self.name, project_path.display(), e);
                Err(ToolError::from_sandbox(&self.name, e))
            }
        }
    }

    /// Log the number of issues found
    pub fn log_result(&self, issues: &[Issue], project_path: &Path) {
        if issues.is_empty() {
            info!("{} found no issues in {}", self.display_name, project_path.display());
        } else {
            info!(
                "{} found {} issues in {}",
                self.display_name,
                issues.len(),
                project_path.display()
            );
        }
    }
}

/// Noise directories joined with `separator`, each passed through `shape`
pub fn noise_patterns(separator: &str, shape: impl Fn(&str) -> String) -> String {
    NOISE_DIRECTORIES
        .iter()
        .map(|dir| shape(dir))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Builds issue descriptions in a fixed, parseable order:
/// message, identifier, location refinement, taxonomy, snippet, fix hint.
#[derive(Debug, Clone, Default)]
pub struct DescriptionBuilder {
    parts: Vec<String>,
}

impl DescriptionBuilder {
    /// Start with the tool's raw message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            parts: vec![message.into()],
        }
    }

    /// Append `label: value`
    pub fn part(mut self, label: &str, value: impl Display) -> Self {
        self.parts.push(format!("{}: {}", label, value));
        self
    }

    /// Append `label: value` when a non-empty value is present
    pub fn maybe<T: Display>(self, label: &str, value: Option<T>) -> Self {
        match value {
            Some(value) if !value.to_string().trim().is_empty() => self.part(label, value),
            _ => self,
        }
    }

    /// `Column: c` for a point, `Columns: a-b` for a range
    pub fn columns(self, start: Option<u32>, end: Option<u32>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if start != end => {
                self.part("Columns", format!("{}-{}", start, end))
            }
            (Some(start), _) => self.part("Column", start),
            _ => self,
        }
    }

    /// `Lines: a-b`, only for multi-line ranges
    pub fn lines(self, start: Option<u32>, end: Option<u32>) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if end > start => {
                self.part("Lines", format!("{}-{}", start, end))
            }
            _ => self,
        }
    }

    /// `CWE-<id>: <link>`, defaulting the link to the MITRE definition page
    pub fn cwe(mut self, id: Option<u64>, link: Option<&str>) -> Self {
        if let Some(id) = id {
            let link = link
                .filter(|link| !link.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("https://cwe.mitre.org/data/definitions/{}.html", id)
                });
            self.parts.push(format!("CWE-{}: {}", id, link));
        }
        self
    }

    /// `Code: <snippet>`, whitespace-collapsed and length-capped
    pub fn snippet(self, code: Option<&str>) -> Self {
        match code.map(crate::utils::compact_snippet) {
            Some(code) if !code.is_empty() => self.part("Code", code),
            _ => self,
        }
    }

    /// Join the parts
    pub fn build(self) -> String {
        self.parts.join(DESCRIPTION_SEPARATOR)
    }
}
