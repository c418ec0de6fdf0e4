//! Radon complexity, maintainability and size metrics for Python

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use strum_macros::{Display, EnumIter};

use crate::config::{Thresholds, ToolSettings};
use crate::errors::ToolError;
use crate::models::{Issue, IssueCategory, IssueMetrics, Severity, ToolName};
use crate::sandbox::Sandbox;
use crate::tools::{noise_patterns, Analyzer, AnalyzerBase, DescriptionBuilder};
use crate::utils;

/// Radon sub-commands, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RadonPass {
    /// Raw size metrics
    Raw,

    /// Cyclomatic complexity per block
    Cc,

    /// Maintainability index per file
    Mi,
}

/// Per-file entry: radon reports `{"error": ...}` for files it cannot parse
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntry<T> {
    Error { error: String },
    Data(T),
}

/// One block of `radon cc -j`
#[derive(Debug, Deserialize)]
struct CcBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    name: String,
    lineno: Option<u32>,
    endline: Option<u32>,
    col_offset: Option<u32>,
    complexity: f64,
    rank: Option<String>,
    classname: Option<String>,
}

/// One file of `radon mi -j`
#[derive(Debug, Deserialize)]
struct MiEntry {
    mi: f64,
    rank: Option<String>,
}

/// One file of `radon raw -j`
#[derive(Debug, Deserialize)]
struct RawEntry {
    sloc: Option<u64>,
    loc: Option<u64>,
}

/// Severity of a function by cyclomatic complexity
pub fn complexity_severity(complexity: f64) -> Severity {
    if complexity > 40.0 {
        Severity::Critical
    } else if complexity > 20.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Severity of a file by maintainability index
pub fn maintainability_severity(mi: f64) -> Severity {
    if mi < 10.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Severity of a file by SLOC, given the size threshold
pub fn size_severity(sloc: u64, threshold: u64) -> Severity {
    if sloc > threshold.saturating_mul(2) {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Radon metrics analyzer
pub struct Radon {
    base: AnalyzerBase,
    thresholds: Thresholds,
}

impl Default for Radon {
    fn default() -> Self {
        Self::new(ToolSettings::default(), Sandbox::new(), Thresholds::default())
    }
}

impl Radon {
    /// Create a new Radon analyzer
    pub fn new(settings: ToolSettings, sandbox: Sandbox, thresholds: Thresholds) -> Self {
        Self {
            base: AnalyzerBase {
                name: "radon".to_string(),
                display_name: "Radon Complexity Analyzer".to_string(),
                description: "Cyclomatic complexity, maintainability index and raw metrics"
                    .to_string(),
                tool: ToolName::Radon,
                category: IssueCategory::Structure,
                program: "radon".to_string(),
                settings,
                sandbox,
            },
            thresholds,
        }
    }

    /// Arguments of one pass
    pub fn command_args(&self, pass: RadonPass) -> Vec<String> {
        vec![
            pass.to_string(),
            ".".to_string(),
            "-j".to_string(),
            "-i".to_string(),
            noise_patterns(",", str::to_string),
        ]
    }

    /// Decode the per-file map of a pass, skipping error and malformed entries
    fn parse_files<T: DeserializeOwned>(
        &self,
        pass: RadonPass,
        output: &str,
        project_path: &Path,
    ) -> Result<Vec<(String, T)>, ToolError> {
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload = utils::extract_json_payload(output).ok_or_else(|| {
            ToolError::malformed(&self.base.name, format!("no JSON found in {} output", pass))
        })?;

        let files: BTreeMap<String, serde_json::Value> = serde_json::from_str(payload)
            .map_err(|e| ToolError::malformed(&self.base.name, format!("{}: {}", pass, e)))?;

        let mut entries = Vec::with_capacity(files.len());
        for (file, value) in files {
            match serde_json::from_value::<FileEntry<T>>(value) {
                Ok(FileEntry::Data(data)) => {
                    entries.push((utils::relative_file_path(project_path, &file), data))
                }
                Ok(FileEntry::Error { error }) => {
                    warn!("Radon {} could not analyze {}: {}", pass, file, error)
                }
                Err(e) => warn!("Skipping malformed Radon {} entry for {}: {}", pass, file, e),
            }
        }

        Ok(entries)
    }

    /// Parse `radon raw -j` into SLOC per file
    pub fn parse_raw(
        &self,
        output: &str,
        project_path: &Path,
    ) -> Result<BTreeMap<String, u64>, ToolError> {
        Ok(self
            .parse_files::<RawEntry>(RadonPass::Raw, output, project_path)?
            .into_iter()
            .filter_map(|(file, raw)| raw.sloc.or(raw.loc).map(|sloc| (file, sloc)))
            .collect())
    }

    /// Parse `radon cc -j` into one issue per overly complex function
    pub fn parse_cc(&self, output: &str, project_path: &Path) -> Result<Vec<Issue>, ToolError> {
        let mut issues = Vec::new();

        for (file, blocks) in
            self.parse_files::<Vec<serde_json::Value>>(RadonPass::Cc, output, project_path)?
        {
            for value in blocks {
                let block = match serde_json::from_value::<CcBlock>(value) {
                    Ok(block) => block,
                    Err(e) => {
                        warn!("Skipping malformed Radon cc block in {}: {}", file, e);
                        continue;
                    }
                };

                // Class blocks aggregate their methods, which are reported on their own
                if block.kind.as_deref() == Some("class") {
                    continue;
                }
                if block.complexity <= f64::from(self.thresholds.complexity) {
                    continue;
                }

                issues.push(self.complexity_issue(&file, block));
            }
        }

        Ok(issues)
    }

    fn complexity_issue(&self, file: &str, block: CcBlock) -> Issue {
        let qualified = match &block.classname {
            Some(class) => format!("{}.{}", class, block.name),
            None => block.name.clone(),
        };
        let kind = block.kind.as_deref().unwrap_or("function");

        let description = DescriptionBuilder::new(format!(
            "{} '{}' has cyclomatic complexity {} (threshold {})",
            capitalize(kind),
            qualified,
            block.complexity,
            self.thresholds.complexity
        ))
        .maybe("Rank", block.rank.as_deref())
        .columns(block.col_offset, None)
        .lines(block.lineno, block.endline)
        .part("Fix", "Split the function into smaller, single-purpose units")
        .build();

        Issue::new(
            self.base.tool,
            self.base.category,
            complexity_severity(block.complexity),
            format!(
                "High cyclomatic complexity in {} ({})",
                qualified, block.complexity
            ),
            file,
            block.lineno.unwrap_or(1),
        )
        .with_description(description)
        .with_lines(block.lineno, block.endline)
        .with_columns(block.col_offset, None)
        .with_metrics(IssueMetrics {
            cyclomatic_complexity: Some(block.complexity),
            ..IssueMetrics::default()
        })
    }

    /// Parse `radon mi -j` into one issue per hard-to-maintain file
    pub fn parse_mi(
        &self,
        output: &str,
        project_path: &Path,
        sloc: &BTreeMap<String, u64>,
    ) -> Result<Vec<Issue>, ToolError> {
        let threshold = self.thresholds.maintainability_index;

        Ok(self
            .parse_files::<MiEntry>(RadonPass::Mi, output, project_path)?
            .into_iter()
            .filter(|(_, entry)| entry.mi < threshold)
            .map(|(file, entry)| {
                let description = DescriptionBuilder::new(format!(
                    "Maintainability index {:.1} is below {:.1}",
                    entry.mi, threshold
                ))
                .maybe("Rank", entry.rank.as_deref())
                .part(
                    "Fix",
                    "Reduce complexity and size, extract cohesive modules",
                )
                .build();

                Issue::new(
                    self.base.tool,
                    self.base.category,
                    maintainability_severity(entry.mi),
                    format!("Low maintainability index ({:.1})", entry.mi),
                    file.as_str(),
                    1,
                )
                .with_description(description)
                .with_metrics(IssueMetrics {
                    maintainability_index: Some(entry.mi),
                    sloc: sloc.get(&file).copied(),
                    ..IssueMetrics::default()
                })
            })
            .collect())
    }

    /// One issue per file whose SLOC exceeds the size threshold
    pub fn size_issues(&self, sloc: &BTreeMap<String, u64>) -> Vec<Issue> {
        let threshold = self.thresholds.sloc;

        sloc.iter()
            .filter(|(_, lines)| **lines > threshold)
            .map(|(file, lines)| {
                let description = DescriptionBuilder::new(format!(
                    "File has {} source lines (threshold {})",
                    lines, threshold
                ))
                .part("Fix", "Split the file into smaller modules")
                .build();

                Issue::new(
                    self.base.tool,
                    self.base.category,
                    size_severity(*lines, threshold),
                    format!("Large file ({} SLOC)", lines),
                    file.as_str(),
                    1,
                )
                .with_description(description)
                .with_metrics(IssueMetrics {
                    sloc: Some(*lines),
                    ..IssueMetrics::default()
                })
            })
            .collect()
    }

    async fn run_pass(&self, pass: RadonPass, project_path: &Path) -> Result<String, ToolError> {
        let output = self
            .base
            .run_tool(&self.command_args(pass), project_path)
            .await?;
        Ok(output.stdout)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Analyzer for Radon {
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

        let mut failures = Vec::new();

        let sloc = match self.run_pass(RadonPass::Raw, project_path).await {
            Ok(output) => self.parse_raw(&output, project_path),
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            warn!("Radon raw pass failed: {}", e);
            failures.push(e);
            BTreeMap::new()
        });

        let mut issues = match self.run_pass(RadonPass::Cc, project_path).await {
            Ok(output) => self.parse_cc(&output, project_path),
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            warn!("Radon cc pass failed: {}", e);
            failures.push(e);
            Vec::new()
        });

        let mi_issues = match self.run_pass(RadonPass::Mi, project_path).await {
            Ok(output) => self.parse_mi(&output, project_path, &sloc),
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            warn!("Radon mi pass failed: {}", e);
            failures.push(e);
            Vec::new()
        });

        if failures.len() == 3 {
            return Err(failures.remove(0));
        }

        issues.extend(mi_issues);
        issues.extend(self.size_issues(&sloc));

        self.base.log_result(&issues, project_path);
        Ok(issues)
    }
}
