//! Ruff linter for Python

use std::path::Path;

use async_trait::async_trait;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::config::ToolSettings;
use crate::errors::ToolError;
use crate::models::{Issue, IssueCategory, Severity, ToolName};
use crate::sandbox::Sandbox;
use crate::tools::{noise_patterns, Analyzer, AnalyzerBase, DescriptionBuilder};
use crate::utils;

/// Rule families and their severity. The longest family that prefixes a
/// rule code wins.
const SEVERITY_BY_PREFIX: &[(&str, Severity)] = &[
    ("E", Severity::High),
    ("W", Severity::Medium),
    ("F", Severity::High),
    ("C", Severity::Medium),
    ("N", Severity::Low),
    ("D", Severity::Low),
    ("S", Severity::Critical),
    ("B", Severity::High),
    ("A", Severity::Medium),
    ("T", Severity::Low),
    ("Q", Severity::Low),
    ("UP", Severity::Medium),
    ("PERF", Severity::High),
    ("RUF", Severity::Medium),
    ("I", Severity::Medium),
    ("PL", Severity::High),
    ("PT", Severity::Medium),
    ("SIM", Severity::Medium),
    ("TID", Severity::Low),
    ("TCH", Severity::Medium),
    ("ARG", Severity::Medium),
    ("PTH", Severity::Medium),
    ("ERA", Severity::Low),
    ("PD", Severity::Medium),
    ("PGH", Severity::High),
    ("FLY", Severity::Low),
    ("NPY", Severity::Medium),
    ("AIR", Severity::Medium),
    ("TRIO", Severity::High),
    ("DJ", Severity::Medium),
];

/// Rules that conflict with each other or with common project setups
const IGNORED_RULES: &[&str] = &[
    "D100", "D101", "D102", "D103", "D104", "D105", "D106", "D107", "D203", "D211", "D212",
    "D213", "ANN", "COM812", "COM819", "ISC001", "ISC002", "Q000", "Q001", "Q002", "Q003",
];

static RULE_FAMILY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]+").unwrap());

/// One diagnostic of `ruff check --output-format=json`
#[derive(Debug, Deserialize)]
struct RuffRecord {
    /// Null for syntax errors
    code: Option<String>,
    message: String,
    filename: String,
    location: Option<RuffLocation>,
    end_location: Option<RuffLocation>,
    fix: Option<RuffFix>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuffLocation {
    row: Option<u32>,
    column: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RuffFix {
    message: Option<String>,
}

/// Map a ruff rule code to a canonical severity.
///
/// Missing codes and unknown families are Medium.
pub fn map_severity(code: Option<&str>) -> Severity {
    let family = match code.and_then(|code| RULE_FAMILY.find(code)) {
        Some(family) => family.as_str().to_uppercase(),
        None => return Severity::Medium,
    };

    SEVERITY_BY_PREFIX
        .iter()
        .filter(|(prefix, _)| family.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, severity)| *severity)
        .unwrap_or(Severity::Medium)
}

/// Ruff linter for Python
pub struct Ruff {
    base: AnalyzerBase,
}

impl Default for Ruff {
    fn default() -> Self {
        Self::new(ToolSettings::default(), Sandbox::new())
    }
}

impl Ruff {
    /// Create a new Ruff analyzer
    pub fn new(settings: ToolSettings, sandbox: Sandbox) -> Self {
        Self {
            base: AnalyzerBase {
                name: "ruff".to_string(),
                display_name: "Ruff Code Quality Analyzer".to_string(),
                description: "An extremely fast Python linter, written in Rust".to_string(),
                tool: ToolName::Ruff,
                category: IssueCategory::Quality,
                program: "ruff".to_string(),
                settings,
                sandbox,
            },
        }
    }

    /// Arguments requesting JSON over the whole tree
    pub fn command_args(&self) -> Vec<String> {
        vec![
            "check".to_string(),
            ".".to_string(),
            "--output-format=json".to_string(),
            "--force-exclude".to_string(),
            "--no-cache".to_string(),
            "--select=ALL".to_string(),
            format!("--ignore={}", IGNORED_RULES.join(",")),
            "--line-length=120".to_string(),
            format!("--extend-exclude={}", noise_patterns(",", str::to_string)),
        ]
    }

    /// Parse ruff JSON output into issues
    pub fn parse_output(&self, output: &str, project_path: &Path) -> Result<Vec<Issue>, ToolError> {
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload = utils::extract_json_payload(output)
            .ok_or_else(|| ToolError::malformed(&self.base.name, "no JSON found in output"))?;

        let records: Vec<serde_json::Value> = serde_json::from_str(payload).map_err(|e| {
            debug!("Output was: {}", payload.chars().take(200).collect::<String>());
            ToolError::malformed(&self.base.name, e.to_string())
        })?;

        let mut issues = Vec::with_capacity(records.len());
        for (index, value) in records.into_iter().enumerate() {
            match serde_json::from_value::<RuffRecord>(value) {
                Ok(record) => issues.push(self.record_to_issue(record, project_path)),
                Err(e) => warn!("Skipping malformed Ruff issue #{}: {}", index, e),
            }
        }

        Ok(issues)
    }

    fn record_to_issue(&self, record: RuffRecord, project_path: &Path) -> Issue {
        let code = record.code.as_deref().filter(|code| !code.is_empty());
        let (row, column) = record
            .location
            .as_ref()
            .map_or((None, None), |loc| (loc.row, loc.column));
        let (end_row, end_column) = record
            .end_location
            .as_ref()
            .map_or((None, None), |loc| (loc.row, loc.column));

        let title = format!("{}: {}", code.unwrap_or("syntax-error"), record.message);

        let description = DescriptionBuilder::new(record.message.as_str())
            .maybe("Rule", code)
            .columns(column, end_column)
            .maybe("Docs", record.url.as_deref())
            .maybe(
                "Fix",
                record.fix.as_ref().and_then(|fix| fix.message.as_deref()),
            )
            .build();

        Issue::new(
            self.base.tool,
            self.base.category,
            map_severity(code),
            title,
            utils::relative_file_path(project_path, &record.filename),
            row.unwrap_or(1),
        )
        .with_description(description)
        .with_lines(row, end_row)
        .with_columns(column, end_column)
    }
}

#[async_trait]
impl Analyzer for Ruff {
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

        let output = self.base.run_tool(&self.command_args(), project_path).await?;
        let issues = self.parse_output(&output.stdout, project_path)?;

        self.base.log_result(&issues, project_path);
        Ok(issues)
    }
}
