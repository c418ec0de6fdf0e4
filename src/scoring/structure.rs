//! Per-file structural risk and hotspot ranking

use std::collections::BTreeMap;

use log::debug;

use crate::config::{SeverityPenalties, StructureWeights};
use crate::models::{
    Hotspot, HotspotPriority, Issue, IssueCategory, MetricBands, MetricsSummary, PercentileBands,
    StructureReport,
};
use crate::scoring::MAX_SCORE;

/// Share-of-files penalty for component scores
const COMPONENT_PENALTY: f64 = 50.0;

/// Running metric totals for one file, built from its structure issues
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetricAggregate {
    pub complexity_sum: f64,
    pub complexity_count: usize,

    /// Last maintainability index seen
    pub maintainability_index: Option<f64>,

    /// Largest SLOC seen
    pub sloc: Option<u64>,

    pub duplicate_tokens: u64,
    pub duplicate_pairs: usize,
    pub severity_penalty: f64,
    pub issues_count: usize,
}

impl FileMetricAggregate {
    /// Fold one issue into the totals
    pub fn add(&mut self, issue: &Issue, penalties: &SeverityPenalties) {
        self.issues_count += 1;
        self.severity_penalty += penalties.penalty(issue.severity);

        let Some(metrics) = &issue.metrics else {
            return;
        };

        if let Some(complexity) = metrics.cyclomatic_complexity {
            self.complexity_sum += complexity;
            self.complexity_count += 1;
        }
        if let Some(mi) = metrics.maintainability_index {
            self.maintainability_index = Some(mi);
        }
        if let Some(sloc) = metrics.sloc {
            self.sloc = Some(self.sloc.map_or(sloc, |seen| seen.max(sloc)));
        }
        if let Some(tokens) = metrics.duplicate_tokens {
            self.duplicate_tokens += tokens;
            self.duplicate_pairs += 1;
        }
    }

    /// Mean complexity of the file's complexity-bearing issues
    pub fn average_complexity(&self) -> Option<f64> {
        (self.complexity_count > 0).then(|| self.complexity_sum / self.complexity_count as f64)
    }

    /// Summed duplicate tokens, if the file takes part in any pair
    pub fn duplication(&self) -> Option<f64> {
        (self.duplicate_pairs > 0).then_some(self.duplicate_tokens as f64)
    }
}

/// Value at percentile `p` (0..=1) of sorted values, interpolating linearly
/// between the closest ranks. Empty input yields 0.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = p.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// p5/p25/p50/p75/p95 over the values present
pub fn percentile_bands(values: impl IntoIterator<Item = f64>) -> PercentileBands {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    PercentileBands {
        p5: percentile(&sorted, 0.05),
        p25: percentile(&sorted, 0.25),
        p50: percentile(&sorted, 0.50),
        p75: percentile(&sorted, 0.75),
        p95: percentile(&sorted, 0.95),
    }
}

/// Normalized risks of one file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FileRisk {
    complexity: f64,
    maintainability: f64,
    duplication: f64,
    size: f64,
    severity: f64,
    composite: f64,
}

/// Percentile-normalized structure scorer
#[derive(Debug, Clone, Default)]
pub struct StructureScorer {
    weights: StructureWeights,
    penalties: SeverityPenalties,
}

impl StructureScorer {
    pub fn new(weights: StructureWeights, penalties: SeverityPenalties) -> Self {
        Self { weights, penalties }
    }

    /// Group structure issues by file. Other categories are ignored.
    pub fn aggregate(&self, issues: &[Issue]) -> BTreeMap<String, FileMetricAggregate> {
        let mut files: BTreeMap<String, FileMetricAggregate> = BTreeMap::new();
        for issue in issues
            .iter()
            .filter(|issue| issue.category == IssueCategory::Structure)
        {
            files
                .entry(issue.file_path.clone())
                .or_default()
                .add(issue, &self.penalties);
        }
        files
    }

    /// Score the structure issues of a corpus
    pub fn score(&self, issues: &[Issue]) -> StructureReport {
        let files = self.aggregate(issues);
        if files.is_empty() {
            return StructureReport::healthy();
        }

        let bands = MetricBands {
            complexity: percentile_bands(files.values().filter_map(|f| f.average_complexity())),
            maintainability_index: percentile_bands(
                files.values().filter_map(|f| f.maintainability_index),
            ),
            sloc: percentile_bands(files.values().filter_map(|f| f.sloc.map(|s| s as f64))),
            duplicate_tokens: percentile_bands(files.values().filter_map(|f| f.duplication())),
        };

        let risks: Vec<(&String, &FileMetricAggregate, FileRisk)> = files
            .iter()
            .map(|(path, file)| (path, file, self.file_risk(file, &bands)))
            .collect();

        let mean_risk =
            risks.iter().map(|(_, _, risk)| risk.composite).sum::<f64>() / risks.len() as f64;
        let structure_score = (MAX_SCORE - MAX_SCORE * mean_risk).clamp(0.0, MAX_SCORE);

        let mut hotspots: Vec<Hotspot> = risks
            .iter()
            .filter(|(_, _, risk)| risk.composite > self.weights.hotspot_threshold)
            .map(|(path, file, risk)| Hotspot {
                file_path: (*path).clone(),
                risk_score: risk.composite,
                priority: self.priority(risk.composite),
                issues_count: file.issues_count,
                complexity_score: risk.complexity,
                maintainability_score: risk.maintainability,
                duplication_score: risk.duplication,
                size_score: risk.size,
                sloc: file.sloc.unwrap_or(0),
            })
            .collect();
        hotspots.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        hotspots.truncate(self.weights.max_hotspots);

        let total = files.len();
        let with_complexity = files.values().filter(|f| f.complexity_count > 0).count();
        let below_floor = files
            .values()
            .filter(|f| {
                f.maintainability_index
                    .is_some_and(|mi| mi < self.weights.maintainability_floor)
            })
            .count();
        let with_duplicates = files.values().filter(|f| f.duplicate_pairs > 0).count();

        debug!(
            "Structure scored {} files: score {:.1}, {} hotspots",
            total,
            structure_score,
            hotspots.len()
        );

        StructureReport {
            structure_score,
            complexity_score: component_score(with_complexity, total),
            maintainability_score: component_score(below_floor, total),
            duplication_score: component_score(with_duplicates, total),
            hotspots,
            metrics_summary: summarize(&files),
            bands,
            total_files_analyzed: total,
        }
    }

    fn file_risk(&self, file: &FileMetricAggregate, bands: &MetricBands) -> FileRisk {
        let w = &self.weights;

        let complexity = file
            .average_complexity()
            .map_or(0.0, |v| bands.complexity.normalize(v, true));
        let maintainability = file
            .maintainability_index
            .map_or(0.0, |v| bands.maintainability_index.normalize(v, false));
        let duplication = file
            .duplication()
            .map_or(0.0, |v| bands.duplicate_tokens.normalize(v, true));
        let size = file
            .sloc
            .map_or(0.0, |v| bands.sloc.normalize(v as f64, true));
        let severity = (file.severity_penalty / w.severity_penalty_cap).min(1.0);

        let composite = (complexity * w.complexity
            + maintainability * w.maintainability
            + duplication * w.duplication
            + size * w.size
            + severity * w.severity)
            .clamp(0.0, 1.0);

        FileRisk {
            complexity,
            maintainability,
            duplication,
            size,
            severity,
            composite,
        }
    }

    fn priority(&self, risk: f64) -> HotspotPriority {
        if risk > self.weights.critical_threshold {
            HotspotPriority::Critical
        } else if risk > self.weights.high_threshold {
            HotspotPriority::High
        } else {
            HotspotPriority::Medium
        }
    }
}

fn component_score(affected: usize, total: usize) -> f64 {
    if total == 0 {
        return MAX_SCORE;
    }
    let share = affected as f64 / total as f64;
    (MAX_SCORE - COMPONENT_PENALTY * share).max(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn summarize(files: &BTreeMap<String, FileMetricAggregate>) -> MetricsSummary {
    let complexities: Vec<f64> = files.values().filter_map(|f| f.average_complexity()).collect();
    let indices: Vec<f64> = files.values().filter_map(|f| f.maintainability_index).collect();

    MetricsSummary {
        total_lines_of_code: files.values().filter_map(|f| f.sloc).sum(),
        total_duplicate_tokens: files.values().map(|f| f.duplicate_tokens).sum(),
        avg_complexity: mean(&complexities),
        avg_maintainability_index: mean(&indices),
        files_with_complexity_issues: complexities.len(),
        files_with_maintainability_issues: indices.len(),
        files_with_duplicates: files.values().filter(|f| f.duplicate_pairs > 0).count(),
    }
}
