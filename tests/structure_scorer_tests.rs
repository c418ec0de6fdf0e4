use pretty_assertions::assert_eq;

use codegauge::config::{SeverityPenalties, StructureWeights};
use codegauge::models::{HotspotPriority, Issue, IssueCategory, IssueMetrics, Severity, ToolName};
use codegauge::scoring::structure::{percentile, percentile_bands, StructureScorer};

fn structure_issue(file: &str, severity: Severity, metrics: IssueMetrics) -> Issue {
    Issue::new(
        ToolName::Radon,
        IssueCategory::Structure,
        severity,
        "structure finding",
        file,
        1,
    )
    .with_metrics(metrics)
}

fn complexity(value: f64) -> IssueMetrics {
    IssueMetrics {
        cyclomatic_complexity: Some(value),
        ..IssueMetrics::default()
    }
}

fn maintainability(mi: f64, sloc: u64) -> IssueMetrics {
    IssueMetrics {
        maintainability_index: Some(mi),
        sloc: Some(sloc),
        ..IssueMetrics::default()
    }
}

fn duplication(tokens: u64, other: &str) -> IssueMetrics {
    IssueMetrics {
        duplicate_tokens: Some(tokens),
        duplicate_files: Some(vec![other.to_string()]),
        ..IssueMetrics::default()
    }
}

fn scorer() -> StructureScorer {
    StructureScorer::new(StructureWeights::default(), SeverityPenalties::default())
}

#[test]
fn test_percentile_interpolates_between_ranks() {
    let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_eq!(percentile(&sorted, 0.0), 1.0);
    assert_eq!(percentile(&sorted, 0.5), 3.0);
    assert_eq!(percentile(&sorted, 1.0), 5.0);
    assert!((percentile(&sorted, 0.05) - 1.2).abs() < 1e-9);
    assert!((percentile(&sorted, 0.95) - 4.8).abs() < 1e-9);
    assert_eq!(percentile(&[], 0.5), 0.0);
    assert_eq!(percentile(&[7.0], 0.95), 7.0);
}

#[test]
fn test_bands_ignore_input_order() {
    let bands = percentile_bands(vec![5.0, 1.0, 3.0, 2.0, 4.0]);
    assert_eq!(bands.p50, 3.0);
    assert_eq!(bands.p25, 2.0);
    assert_eq!(bands.p75, 4.0);
}

#[test]
fn test_no_structure_issues_is_healthy() {
    let quality_only = vec![Issue::new(
        ToolName::Ruff,
        IssueCategory::Quality,
        Severity::High,
        "E501: Line too long",
        "a.py",
        3,
    )];

    let report = scorer().score(&quality_only);
    assert_eq!(report.structure_score, 100.0);
    assert!(report.hotspots.is_empty());
    assert_eq!(report.total_files_analyzed, 0);
}

#[test]
fn test_single_file_metrics_normalize_to_zero() {
    let issues = vec![
        structure_issue("only.py", Severity::Low, complexity(15.0)),
        structure_issue("only.py", Severity::Low, maintainability(12.0, 700)),
        structure_issue("only.py", Severity::Low, duplication(80, "only.py")),
    ];

    let report = scorer().score(&issues);
    assert_eq!(report.total_files_analyzed, 1);
    assert_eq!(report.bands.complexity.p5, report.bands.complexity.p95);

    // Only the severity component remains: 3 penalty points out of 50
    let expected_risk = 3.0 / 50.0 * 0.10;
    assert!((report.structure_score - (100.0 - 100.0 * expected_risk)).abs() < 1e-9);
    assert!(report.structure_score.is_finite());
    assert!(report.hotspots.is_empty());
}

#[test]
fn test_aggregation() {
    let issues = vec![
        structure_issue("a.py", Severity::Medium, complexity(12.0)),
        structure_issue("a.py", Severity::High, complexity(30.0)),
        structure_issue("a.py", Severity::Low, maintainability(50.0, 300)),
        structure_issue("a.py", Severity::Low, maintainability(18.0, 320)),
        structure_issue("a.py", Severity::Low, duplication(60, "b.py")),
        structure_issue("a.py", Severity::Low, duplication(40, "c.py")),
    ];

    let files = scorer().aggregate(&issues);
    let a = &files["a.py"];
    assert_eq!(a.average_complexity(), Some(21.0));
    assert_eq!(a.maintainability_index, Some(18.0));
    assert_eq!(a.sloc, Some(320));
    assert_eq!(a.duplicate_tokens, 100);
    assert_eq!(a.duplicate_pairs, 2);
    assert_eq!(a.severity_penalty, 5.0 + 10.0 + 1.0 * 4.0);
    assert_eq!(a.issues_count, 6);
}

#[test]
fn test_hotspots_sorted_tiered_and_capped() {
    let mut issues = Vec::new();
    for i in 0..15u32 {
        let file = format!("mod_{:02}.py", i);
        let level = f64::from(i);
        issues.push(structure_issue(&file, Severity::Critical, complexity(10.0 + level * 5.0)));
        issues.push(structure_issue(
            &file,
            Severity::Critical,
            maintainability(60.0 - level * 4.0, 100 + u64::from(i) * 100),
        ));
        issues.push(structure_issue(&file, Severity::High, duplication(50 + u64::from(i) * 30, "x.py")));
    }

    let report = scorer().score(&issues);
    assert_eq!(report.total_files_analyzed, 15);
    assert!(report.hotspots.len() <= 10);
    assert!(!report.hotspots.is_empty());

    for pair in report.hotspots.windows(2) {
        assert!(pair[0].risk_score >= pair[1].risk_score);
    }

    let top = &report.hotspots[0];
    assert_eq!(top.file_path, "mod_14.py");
    assert_eq!(top.priority, HotspotPriority::Critical);
    for hotspot in &report.hotspots {
        assert!(hotspot.risk_score > 0.3);
        let expected = if hotspot.risk_score > 0.7 {
            HotspotPriority::Critical
        } else if hotspot.risk_score > 0.5 {
            HotspotPriority::High
        } else {
            HotspotPriority::Medium
        };
        assert_eq!(hotspot.priority, expected);
    }

    assert!(report.structure_score >= 0.0 && report.structure_score <= 100.0);
}

#[test]
fn test_component_scores_and_summary() {
    let issues = vec![
        structure_issue("a.py", Severity::Medium, complexity(14.0)),
        structure_issue("b.py", Severity::Medium, maintainability(15.0, 800)),
        structure_issue("c.py", Severity::Low, duplication(70, "d.py")),
        structure_issue("d.py", Severity::Low, duplication(70, "c.py")),
    ];

    let report = scorer().score(&issues);
    assert_eq!(report.total_files_analyzed, 4);
    assert_eq!(report.complexity_score, 87.5);
    assert_eq!(report.maintainability_score, 87.5);
    assert_eq!(report.duplication_score, 75.0);

    let summary = &report.metrics_summary;
    assert_eq!(summary.total_lines_of_code, 800);
    assert_eq!(summary.total_duplicate_tokens, 140);
    assert_eq!(summary.avg_complexity, 14.0);
    assert_eq!(summary.avg_maintainability_index, 15.0);
    assert_eq!(summary.files_with_complexity_issues, 1);
    assert_eq!(summary.files_with_maintainability_issues, 1);
    assert_eq!(summary.files_with_duplicates, 2);
}

#[test]
fn test_equal_risk_hotspots_sort_by_path() {
    let weights = StructureWeights {
        hotspot_threshold: 0.0,
        ..StructureWeights::default()
    };
    let scorer = StructureScorer::new(weights, SeverityPenalties::default());

    // Identical metrics: every band is degenerate, risk comes from severity alone
    let issues: Vec<Issue> = ["zeta.py", "alpha.py", "mid.py"]
        .iter()
        .map(|file| structure_issue(file, Severity::Critical, complexity(20.0)))
        .collect();

    let report = scorer.score(&issues);
    let order: Vec<&str> = report
        .hotspots
        .iter()
        .map(|h| h.file_path.as_str())
        .collect();
    assert_eq!(order, vec!["alpha.py", "mid.py", "zeta.py"]);
}
