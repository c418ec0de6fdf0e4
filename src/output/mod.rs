//! Output formatting for codegauge

use std::collections::BTreeMap;

use colored::{ColoredString, Colorize};
use serde_json::json;
use strum::IntoEnumIterator;

use crate::models::{AnalysisReport, HotspotPriority, IssueCategory, Severity, ToolStatus};
use crate::tools::registry::AnalyzerInfo;

/// Issues listed per category in the pretty output
const MAX_LISTED_ISSUES: usize = 10;

/// Trait for formatting output
pub trait ReportFormatter {
    /// Format a full analysis report
    fn format_report(&self, report: &AnalysisReport) -> String;

    /// Format the analyzer availability listing
    fn format_tools(&self, tools: &[AnalyzerInfo]) -> String;
}

/// Colored terminal output
#[derive(Clone, Default)]
pub struct PrettyFormatter;

impl PrettyFormatter {
    pub fn new() -> Self {
        Self
    }

    fn score(value: f64) -> ColoredString {
        let text = format!("{:5.1}", value);
        if value >= 80.0 {
            text.green().bold()
        } else if value >= 50.0 {
            text.yellow().bold()
        } else {
            text.red().bold()
        }
    }

    fn severity(severity: Severity) -> ColoredString {
        let label = format!("{:<8}", severity.to_string().to_uppercase());
        label.color(severity.color_name())
    }

    fn status(status: ToolStatus) -> ColoredString {
        let label = status.to_string();
        match status {
            ToolStatus::Completed => label.green(),
            ToolStatus::Skipped => label.dimmed(),
            ToolStatus::Unavailable => label.yellow(),
            _ => label.red(),
        }
    }
}

impl ReportFormatter for PrettyFormatter {
    fn format_report(&self, report: &AnalysisReport) -> String {
        let separator = "━".repeat(60).dimmed();
        let mut output = String::new();

        output.push_str(&format!(
            "\n{}\n  {} {}\n{}\n\n",
            separator,
            "codegauge report".bold(),
            chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            separator
        ));

        output.push_str(&format!(
            "  Overall       {}\n",
            Self::score(report.overall_score)
        ));
        for category in IssueCategory::iter() {
            output.push_str(&format!(
                "  {:<13} {}\n",
                category.to_string(),
                Self::score(report.category_score(category))
            ));
        }

        if !report.tools.is_empty() {
            output.push_str(&format!("\n  {}\n", "Analyzers".bold()));
            for run in &report.tools {
                output.push_str(&format!(
                    "    {:<8} {:<16} {:>4} issues  {}ms\n",
                    run.name,
                    Self::status(run.status),
                    run.issues_found,
                    run.duration_ms
                ));
            }
        }

        if report.issues.is_empty() {
            output.push_str(&format!("\n  {} No issues detected!\n", "✨".green()));
        } else {
            let counts: Vec<String> = Severity::iter()
                .rev()
                .map(|severity| (severity, report.count_by_severity(severity)))
                .filter(|(_, count)| *count > 0)
                .map(|(severity, count)| {
                    format!(
                        "{} {}",
                        count,
                        severity.to_string().to_lowercase().color(severity.color_name())
                    )
                })
                .collect();
            output.push_str(&format!(
                "\n  Found {} issues: {}\n",
                report.issues.len(),
                counts.join(", ")
            ));

            let mut by_category: BTreeMap<IssueCategory, Vec<_>> = BTreeMap::new();
            for issue in &report.issues {
                by_category.entry(issue.category).or_default().push(issue);
            }

            for (category, mut issues) in by_category {
                issues.sort_by(|a, b| b.severity.cmp(&a.severity));
                output.push_str(&format!(
                    "\n  {} ({})\n",
                    category.to_string().bold(),
                    issues.len()
                ));
                for issue in issues.iter().take(MAX_LISTED_ISSUES) {
                    output.push_str(&format!(
                        "    {} {}:{}  {}\n",
                        Self::severity(issue.severity),
                        issue.file_path.cyan(),
                        issue.line_number,
                        issue.title
                    ));
                }
                if issues.len() > MAX_LISTED_ISSUES {
                    output.push_str(&format!(
                        "    {}\n",
                        format!("... and {} more", issues.len() - MAX_LISTED_ISSUES).dimmed()
                    ));
                }
            }
        }

        if let Some(structure) = &report.structure {
            output.push_str(&format!(
                "\n  {}  score {}  complexity {}  maintainability {}  duplication {}\n",
                "Structure".bold(),
                Self::score(structure.structure_score),
                Self::score(structure.complexity_score),
                Self::score(structure.maintainability_score),
                Self::score(structure.duplication_score)
            ));

            for hotspot in &structure.hotspots {
                let priority = hotspot.priority.to_string();
                let priority = match hotspot.priority {
                    HotspotPriority::Critical => priority.red().bold(),
                    HotspotPriority::High => priority.yellow(),
                    HotspotPriority::Medium => priority.blue(),
                };
                output.push_str(&format!(
                    "    {:<8} {:.2}  {} ({} issues)\n",
                    priority, hotspot.risk_score, hotspot.file_path, hotspot.issues_count
                ));
            }
        }

        output.push_str(&format!("\n{}\n", separator));
        output
    }

    fn format_tools(&self, tools: &[AnalyzerInfo]) -> String {
        let mut output = String::new();
        for tool in tools {
            let status = if tool.available {
                "✓".green()
            } else {
                "✗".red()
            };
            let version = tool
                .version
                .as_deref()
                .map_or(String::new(), |v| format!(" ({})", v));
            output.push_str(&format!(
                "{} {:<8} {}{}\n    {}\n",
                status,
                tool.name.bold(),
                tool.display_name,
                version.dimmed(),
                tool.description.dimmed()
            ));
        }
        output
    }
}

/// JSON formatter for machine-readable output
#[derive(Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_tools(&self, tools: &[AnalyzerInfo]) -> String {
        let tools: Vec<_> = tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "display_name": tool.display_name,
                    "description": tool.description,
                    "available": tool.available,
                    "version": tool.version,
                })
            })
            .collect();

        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}
