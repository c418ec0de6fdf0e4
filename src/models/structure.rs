use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Remediation tier of a hotspot
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HotspotPriority {
    /// Risk above the hotspot threshold
    Medium,

    /// Risk above the high threshold but not critical
    High,

    /// Risk above the critical threshold
    Critical,
}

/// A file flagged as high structural risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    /// File path as reported by the analyzers
    pub file_path: String,

    /// Composite risk in `[0, 1]`
    pub risk_score: f64,

    /// Tier derived from `risk_score`
    pub priority: HotspotPriority,

    /// Number of structure issues in the file
    pub issues_count: usize,

    /// Normalized complexity risk
    pub complexity_score: f64,

    /// Normalized maintainability risk
    pub maintainability_score: f64,

    /// Normalized duplication risk
    pub duplication_score: f64,

    /// Normalized size risk
    pub size_score: f64,

    /// Largest SLOC seen for the file
    pub sloc: u64,
}

/// 5th/25th/50th/75th/95th percentile of one metric across files
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileBands {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl PercentileBands {
    /// Map a value onto `[0, 1]` risk using p5/p95 as clamping bounds.
    ///
    /// A degenerate band (p95 == p5) yields zero risk.
    pub fn normalize(&self, value: f64, higher_is_worse: bool) -> f64 {
        let span = self.p95 - self.p5;
        if span <= 0.0 {
            return 0.0;
        }

        let position = ((value - self.p5) / span).clamp(0.0, 1.0);
        if higher_is_worse {
            position
        } else {
            1.0 - position
        }
    }
}

/// Percentile bands for every metric the structure scorer uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBands {
    pub complexity: PercentileBands,
    pub maintainability_index: PercentileBands,
    pub sloc: PercentileBands,
    pub duplicate_tokens: PercentileBands,
}

/// Project-wide structure metric totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Sum of per-file SLOC
    pub total_lines_of_code: u64,

    /// Sum of duplicated tokens
    pub total_duplicate_tokens: u64,

    /// Mean of per-file average complexity
    pub avg_complexity: f64,

    /// Mean maintainability index
    pub avg_maintainability_index: f64,

    /// Files with complexity findings
    pub files_with_complexity_issues: usize,

    /// Files with a maintainability index
    pub files_with_maintainability_issues: usize,

    /// Files involved in a duplicate pair
    pub files_with_duplicates: usize,
}

/// Detailed output of the structure scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureReport {
    /// 100 minus the mean per-file risk, scaled to 0..100
    pub structure_score: f64,

    /// Share-of-files based complexity score
    pub complexity_score: f64,

    /// Share-of-files based maintainability score
    pub maintainability_score: f64,

    /// Share-of-files based duplication score
    pub duplication_score: f64,

    /// Riskiest files, highest first
    pub hotspots: Vec<Hotspot>,

    /// Project-wide totals
    pub metrics_summary: MetricsSummary,

    /// Percentile bands used for normalization
    pub bands: MetricBands,

    /// Files with at least one structure issue
    pub total_files_analyzed: usize,
}

impl StructureReport {
    /// Report for a project without structure issues
    pub fn healthy() -> Self {
        Self {
            structure_score: 100.0,
            complexity_score: 100.0,
            maintainability_score: 100.0,
            duplication_score: 100.0,
            hotspots: Vec::new(),
            metrics_summary: MetricsSummary::default(),
            bands: MetricBands::default(),
            total_files_analyzed: 0,
        }
    }
}
