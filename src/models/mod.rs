//! Core data models for codegauge

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

pub mod structure;

pub use structure::*;

/// Top-level grouping of an issue
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum IssueCategory {
    /// Complexity, maintainability, size and duplication
    Structure,

    /// Lint and style findings
    Quality,

    /// Security findings
    Security,

    /// Dependency hygiene
    Dependencies,
}

/// Canonical four-level severity shared by every tool
///
/// Variants are declared from least to most severe so the derived `Ord`
/// gives `Critical > High > Medium > Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Severity {
    /// Cosmetic or low-impact finding
    Low,

    /// Should be fixed
    Medium,

    /// Likely defect or risk
    High,

    /// Must be fixed
    Critical,
}

impl Severity {
    /// Get the color name for this severity
    pub fn color_name(&self) -> &'static str {
        match self {
            Severity::Critical => "red",
            Severity::High => "yellow",
            Severity::Medium => "blue",
            Severity::Low => "white",
        }
    }
}

/// Identifier of the analyzer that produced an issue
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ToolName {
    /// Python linter
    Ruff,

    /// Python security scanner
    Bandit,

    /// Complexity and maintainability metrics
    Radon,

    /// Copy/paste detector
    Jscpd,

    /// Anything registered outside the built-in set
    Custom,
}

/// Structure metrics attached to an issue. Sparse: an adapter only fills
/// what it measured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueMetrics {
    /// Cyclomatic complexity of the offending block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cyclomatic_complexity: Option<f64>,

    /// Maintainability index of the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainability_index: Option<f64>,

    /// Source lines of code of the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sloc: Option<u64>,

    /// Tokens in the duplicated block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_tokens: Option<u64>,

    /// Files on the other side of a duplicate pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_files: Option<Vec<String>>,
}

/// One normalized finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Category of the issue
    pub category: IssueCategory,

    /// Canonical severity
    pub severity: Severity,

    /// Producing analyzer
    pub tool: ToolName,

    /// Short title
    pub title: String,

    /// Context parts joined with `" | "`
    pub description: String,

    /// Path relative to the project root
    pub file_path: String,

    /// Primary reference line (1-indexed)
    pub line_number: u32,

    /// First line of the reported range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,

    /// Last line of the reported range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    /// First column of the reported range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<u32>,

    /// Last column of the reported range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,

    /// Structure metrics, if the adapter computed any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<IssueMetrics>,
}

impl Issue {
    /// Create an issue anchored at `line_number`. Lines below 1 clamp to 1.
    pub fn new(
        tool: ToolName,
        category: IssueCategory,
        severity: Severity,
        title: impl Into<String>,
        file_path: impl Into<String>,
        line_number: u32,
    ) -> Self {
        Self {
            category,
            severity,
            tool,
            title: title.into(),
            description: String::new(),
            file_path: file_path.into(),
            line_number: line_number.max(1),
            start_line: None,
            end_line: None,
            start_column: None,
            end_column: None,
            metrics: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the line range. An end before the start is dropped.
    pub fn with_lines(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        let start = start.filter(|line| *line > 0);
        self.start_line = start;
        self.end_line = match (start, end) {
            (Some(start), Some(end)) if end < start => None,
            (_, end) => end.filter(|line| *line > 0),
        };
        self
    }

    /// Set the column range
    pub fn with_columns(mut self, start: Option<u32>, end: Option<u32>) -> Self {
        self.start_column = start;
        self.end_column = end;
        self
    }

    /// Attach structure metrics
    pub fn with_metrics(mut self, metrics: IssueMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Outcome of one adapter in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolStatus {
    /// Ran and produced a parseable payload
    Completed,

    /// Not installed
    Unavailable,

    /// Killed after its timeout
    TimedOut,

    /// Exited with a non-whitelisted code
    Failed,

    /// Output could not be parsed
    MalformedOutput,

    /// Adapter panicked
    Panicked,

    /// Not run (documentation-only project)
    Skipped,
}

/// Summary of one adapter run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRun {
    /// Tool identifier
    pub tool: ToolName,

    /// Adapter display name
    pub name: String,

    /// How the run ended
    pub status: ToolStatus,

    /// Number of issues contributed
    pub issues_found: usize,

    /// Wall-clock time in milliseconds
    pub duration_ms: u64,
}

/// Output of one full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Weighted overall score
    pub overall_score: f64,

    /// Structure category score
    pub structure_score: f64,

    /// Quality category score
    pub quality_score: f64,

    /// Security category score
    pub security_score: f64,

    /// Dependencies category score
    pub dependencies_score: f64,

    /// Every issue, in adapter-registration order
    pub issues: Vec<Issue>,

    /// Per-file structure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureReport>,

    /// One entry per registered adapter
    #[serde(default)]
    pub tools: Vec<ToolRun>,
}

impl AnalysisReport {
    /// Report for a project with nothing to analyze
    pub fn perfect() -> Self {
        Self {
            overall_score: 100.0,
            structure_score: 100.0,
            quality_score: 100.0,
            security_score: 100.0,
            dependencies_score: 100.0,
            issues: Vec::new(),
            structure: None,
            tools: Vec::new(),
        }
    }

    /// Score of a single category
    pub fn category_score(&self, category: IssueCategory) -> f64 {
        match category {
            IssueCategory::Structure => self.structure_score,
            IssueCategory::Quality => self.quality_score,
            IssueCategory::Security => self.security_score,
            IssueCategory::Dependencies => self.dependencies_score,
        }
    }

    /// Count issues of the given severity
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}
