//! jscpd copy/paste detector

use std::path::Path;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;

use crate::config::{Thresholds, ToolSettings};
use crate::errors::ToolError;
use crate::models::{Issue, IssueCategory, IssueMetrics, Severity, ToolName};
use crate::sandbox::Sandbox;
use crate::tools::{noise_patterns, Analyzer, AnalyzerBase, DescriptionBuilder};
use crate::utils;

/// File name of the JSON reporter output
pub const REPORT_FILE_NAME: &str = "jscpd-report.json";

#[derive(Debug, Deserialize)]
struct JscpdReport {
    #[serde(default)]
    duplicates: Vec<serde_json::Value>,
}

/// One duplicated block shared by two locations
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JscpdDuplicate {
    format: Option<String>,
    lines: Option<u32>,
    tokens: Option<u64>,
    fragment: Option<String>,
    first_file: JscpdLocation,
    second_file: JscpdLocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JscpdLocation {
    name: String,
    start: Option<u32>,
    end: Option<u32>,
    start_loc: Option<JscpdPosition>,
    end_loc: Option<JscpdPosition>,
}

#[derive(Debug, Deserialize)]
struct JscpdPosition {
    line: Option<u32>,
    column: Option<u32>,
}

impl JscpdLocation {
    fn start_line(&self) -> Option<u32> {
        self.start
            .or_else(|| self.start_loc.as_ref().and_then(|loc| loc.line))
    }

    fn end_line(&self) -> Option<u32> {
        self.end
            .or_else(|| self.end_loc.as_ref().and_then(|loc| loc.line))
    }

    fn columns(&self) -> (Option<u32>, Option<u32>) {
        (
            self.start_loc.as_ref().and_then(|loc| loc.column),
            self.end_loc.as_ref().and_then(|loc| loc.column),
        )
    }
}

/// Severity of a duplicated block by its token count
pub fn map_severity(tokens: u64) -> Severity {
    if tokens >= 300 {
        Severity::High
    } else if tokens >= 100 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// jscpd duplication analyzer
pub struct Jscpd {
    base: AnalyzerBase,
    min_tokens: u32,
}

impl Default for Jscpd {
    fn default() -> Self {
        Self::new(ToolSettings::default(), Sandbox::new(), Thresholds::default())
    }
}

impl Jscpd {
    /// Create a new jscpd analyzer
    pub fn new(settings: ToolSettings, sandbox: Sandbox, thresholds: Thresholds) -> Self {
        Self {
            base: AnalyzerBase {
                name: "jscpd".to_string(),
                display_name: "jscpd Duplication Detector".to_string(),
                description: "Detects copy/pasted blocks across source files".to_string(),
                tool: ToolName::Jscpd,
                category: IssueCategory::Structure,
                program: "jscpd".to_string(),
                settings,
                sandbox,
            },
            min_tokens: thresholds.min_duplicate_tokens,
        }
    }

    /// Arguments writing the JSON report into `report_dir`
    pub fn command_args(&self, report_dir: &Path) -> Vec<String> {
        vec![
            ".".to_string(),
            "--silent".to_string(),
            "--reporters".to_string(),
            "json".to_string(),
            "--output".to_string(),
            report_dir.to_string_lossy().into_owned(),
            "--min-tokens".to_string(),
            self.min_tokens.to_string(),
            "--ignore".to_string(),
            noise_patterns(",", |dir| format!("**/{}/**", dir)),
        ]
    }

    /// Parse the content of `jscpd-report.json` into issues, two per pair
    pub fn parse_report(&self, report: &str, project_path: &Path) -> Result<Vec<Issue>, ToolError> {
        let report: JscpdReport = serde_json::from_str(report).map_err(|e| {
            debug!("Report was: {}", report.chars().take(200).collect::<String>());
            ToolError::malformed(&self.base.name, e.to_string())
        })?;

        let mut issues = Vec::with_capacity(report.duplicates.len() * 2);
        for (index, value) in report.duplicates.into_iter().enumerate() {
            match serde_json::from_value::<JscpdDuplicate>(value) {
                Ok(duplicate) => {
                    let first = utils::relative_file_path(project_path, &duplicate.first_file.name);
                    let second =
                        utils::relative_file_path(project_path, &duplicate.second_file.name);

                    issues.push(self.side_to_issue(
                        &duplicate,
                        &duplicate.first_file,
                        &first,
                        &duplicate.second_file,
                        &second,
                    ));
                    issues.push(self.side_to_issue(
                        &duplicate,
                        &duplicate.second_file,
                        &second,
                        &duplicate.first_file,
                        &first,
                    ));
                }
                Err(e) => warn!("Skipping malformed jscpd duplicate #{}: {}", index, e),
            }
        }

        Ok(issues)
    }

    fn side_to_issue(
        &self,
        duplicate: &JscpdDuplicate,
        side: &JscpdLocation,
        side_path: &str,
        other: &JscpdLocation,
        other_path: &str,
    ) -> Issue {
        let tokens = duplicate.tokens.unwrap_or(0);
        let start = side.start_line();
        let end = side.end_line();
        let lines = duplicate.lines.unwrap_or_else(|| match (start, end) {
            (Some(start), Some(end)) if end >= start => end - start + 1,
            _ => 0,
        });
        let (start_column, end_column) = side.columns();

        let other_location = match other.start_line() {
            Some(line) => format!("{}:{}", other_path, line),
            None => other_path.to_string(),
        };

        let description = DescriptionBuilder::new(format!(
            "Code duplicated with {}",
            other_location
        ))
        .part("Tokens", tokens)
        .part("Lines", lines)
        .maybe("Format", duplicate.format.as_deref())
        .columns(start_column, end_column)
        .snippet(duplicate.fragment.as_deref())
        .part("Fix", "Extract the shared code into a reusable function or module")
        .build();

        Issue::new(
            self.base.tool,
            self.base.category,
            map_severity(tokens),
            format!("Duplicated block ({} lines)", lines),
            side_path,
            start.unwrap_or(1),
        )
        .with_description(description)
        .with_lines(start, end)
        .with_columns(start_column, end_column)
        .with_metrics(IssueMetrics {
            duplicate_tokens: Some(tokens),
            duplicate_files: Some(vec![other_path.to_string()]),
            ..IssueMetrics::default()
        })
    }
}

#[async_trait]
impl Analyzer for Jscpd {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn display_name(&self) -> &str {
        &self.base.display_name
    }

    fn tool(&self) -> ToolName {
        self.base.tool
    }

    fn category(&self) -> IssueCategory {
        self.base.category
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    async fn is_available(&self) -> bool {
        self.base.sandbox.is_available(self.base.program()).await
    }

    async fn version(&self) -> Option<String> {
        self.base.sandbox.version(self.base.program()).await
    }

    async fn analyze(&self, project_path: &Path) -> Result<Vec<Issue>, ToolError> {
        self.base.ensure_available().await?;

        let report_dir = tempfile::tempdir().map_err(|e| {
            ToolError::malformed(&self.base.name, format!("cannot create report dir: {}", e))
        })?;

        self.base
            .run_tool(&self.command_args(report_dir.path()), project_path)
            .await?;

        let report_path = report_dir.path().join(REPORT_FILE_NAME);
        let report = tokio::fs::read_to_string(&report_path).await.map_err(|e| {
            ToolError::malformed(
                &self.base.name,
                format!("cannot read {}: {}", report_path.display(), e),
            )
        })?;

        let issues = self.parse_report(&report, project_path)?;

        self.base.log_result(&issues, project_path);
        Ok(issues)
    }
}
