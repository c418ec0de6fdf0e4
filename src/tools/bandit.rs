//! Bandit security scanner for Python

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use strum_macros::EnumString;

use crate::config::ToolSettings;
use crate::errors::ToolError;
use crate::models::{Issue, IssueCategory, Severity, ToolName};
use crate::sandbox::Sandbox;
use crate::tools::{noise_patterns, Analyzer, AnalyzerBase, DescriptionBuilder};
use crate::utils;

/// Severity or confidence level as bandit reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum BanditLevel {
    Low,
    Medium,
    High,
    Undefined,
}

impl BanditLevel {
    /// Parse a raw level. Missing values count as MEDIUM and unknown words as
    /// UNDEFINED.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => BanditLevel::Medium,
            Some(raw) => raw.parse().unwrap_or(BanditLevel::Undefined),
        }
    }
}

/// Combine bandit's severity and confidence into a canonical severity.
///
/// Confidence only ever escalates a level; it never stands in for severity.
pub fn map_severity(severity: BanditLevel, confidence: BanditLevel) -> Severity {
    match (severity, confidence) {
        (BanditLevel::High, BanditLevel::High) => Severity::Critical,
        (BanditLevel::High, _) => Severity::High,
        (BanditLevel::Medium, BanditLevel::High) => Severity::High,
        (BanditLevel::Medium, _) => Severity::Medium,
        (BanditLevel::Low | BanditLevel::Undefined, _) => Severity::Low,
    }
}

/// Top-level `bandit -f json` payload
#[derive(Debug, Deserialize)]
struct BanditReport {
    #[serde(default)]
    results: Vec<serde_json::Value>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
    #[serde(default)]
    metrics: HashMap<String, serde_json::Value>,
}

/// One finding in `results`
#[derive(Debug, Deserialize)]
struct BanditResult {
    test_id: Option<String>,
    test_name: Option<String>,
    issue_text: Option<String>,
    issue_severity: Option<String>,
    issue_confidence: Option<String>,
    issue_cwe: Option<BanditCwe>,
    filename: String,
    line_number: Option<u32>,
    #[serde(default)]
    line_range: Vec<u32>,
    col_offset: Option<u32>,
    end_col_offset: Option<u32>,
    code: Option<String>,
    more_info: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BanditCwe {
    id: Option<u64>,
    link: Option<String>,
}

/// Bandit security scanner for Python
pub struct Bandit {
    base: AnalyzerBase,
}

impl Default for Bandit {
    fn default() -> Self {
        Self::new(ToolSettings::default(), Sandbox::new())
    }
}

impl Bandit {
    /// Create a new Bandit analyzer
    pub fn new(settings: ToolSettings, sandbox: Sandbox) -> Self {
        Self {
            base: AnalyzerBase {
                name: "bandit".to_string(),
                display_name: "Bandit Security Analyzer".to_string(),
                description: "Finds common security issues in Python code".to_string(),
                tool: ToolName::Bandit,
                category: IssueCategory::Security,
                program: "bandit".to_string(),
                settings,
                sandbox,
            },
        }
    }

    /// Arguments for a recursive JSON scan reporting every level
    pub fn command_args(&self) -> Vec<String> {
        vec![
            "-r".to_string(),
            ".".to_string(),
            "-f".to_string(),
            "json".to_string(),
            "-q".to_string(),
            "--severity-level=low".to_string(),
            "--confidence-level=low".to_string(),
            "-x".to_string(),
            noise_patterns(",", |dir| format!("./{}", dir)),
        ]
    }

    /// Parse bandit JSON output into issues
    pub fn parse_output(&self, output: &str, project_path: &Path) -> Result<Vec<Issue>, ToolError> {
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload = utils::extract_json_payload(output)
            .ok_or_else(|| ToolError::malformed(&self.base.name, "no JSON found in output"))?;

        let report: BanditReport = serde_json::from_str(payload).map_err(|e| {
            debug!("Output was: {}", payload.chars().take(200).collect::<String>());
            ToolError::malformed(&self.base.name, e.to_string())
        })?;

        self.log_metrics(&report.metrics);
        for error in &report.errors {
            warn!("Bandit reported a scan error: {}", error);
        }

        let mut issues = Vec::with_capacity(report.results.len());
        for (index, value) in report.results.into_iter().enumerate() {
            match serde_json::from_value::<BanditResult>(value) {
                Ok(result) => issues.push(self.result_to_issue(result, project_path)),
                Err(e) => warn!("Skipping malformed Bandit issue #{}: {}", index, e),
            }
        }

        Ok(issues)
    }

    fn log_metrics(&self, metrics: &HashMap<String, serde_json::Value>) {
        let Some(totals) = metrics.get("_totals") else {
            return;
        };

        let total = |key: &str| totals.get(key).and_then(|v| v.as_f64()).unwrap_or(0.0);
        info!("Bandit scanned {} lines of code", total("loc"));
        info!(
            "Security issues by severity: HIGH={}, MEDIUM={}, LOW={}",
            total("SEVERITY.HIGH"),
            total("SEVERITY.MEDIUM"),
            total("SEVERITY.LOW")
        );
    }

    fn result_to_issue(&self, result: BanditResult, project_path: &Path) -> Issue {
        let severity = BanditLevel::parse(result.issue_severity.as_deref());
        let confidence = BanditLevel::parse(result.issue_confidence.as_deref());

        let text = result
            .issue_text
            .clone()
            .unwrap_or_else(|| "Security issue".to_string());
        let test_id = result.test_id.as_deref().unwrap_or("Unknown");

        let test = match result.test_name.as_deref() {
            Some(name) if !name.is_empty() => format!("{} ({})", test_id, name),
            _ => test_id.to_string(),
        };

        let start_line = result.line_range.first().copied();
        let end_line = if result.line_range.len() > 1 {
            result.line_range.last().copied()
        } else {
            None
        };

        let mut description = DescriptionBuilder::new(text.as_str()).part("Test", test);
        if let (Some(conf), Some(sev)) = (&result.issue_confidence, &result.issue_severity) {
            description = description.part("Confidence", format!("{}, Severity: {}", conf, sev));
        }
        let (cwe_id, cwe_link) = result
            .issue_cwe
            .as_ref()
            .map_or((None, None), |cwe| (cwe.id, cwe.link.as_deref()));

        // bandit reports a zero CWE id when the check has no mapping
        let cwe_id = cwe_id.filter(|id| *id > 0);

        let description = description
            .columns(
                result.col_offset,
                result.end_col_offset.filter(|_| result.col_offset.is_some()),
            )
            .lines(start_line, end_line)
            .cwe(cwe_id, cwe_link)
            .snippet(result.code.as_deref())
            .maybe("More info", result.more_info.as_deref())
            .build();

        Issue::new(
            self.base.tool,
            self.base.category,
            map_severity(severity, confidence),
            format!("{}: {}", test_id, text),
            utils::relative_file_path(project_path, &result.filename),
            result.line_number.or(start_line).unwrap_or(1),
        )
        .with_description(description)
        .with_lines(start_line, end_line)
        .with_columns(result.col_offset, result.end_col_offset)
    }
}

#[async_trait]
impl Analyzer for Bandit {
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
