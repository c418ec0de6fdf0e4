use std::collections::BTreeMap;
use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::rstest;

use codegauge::config::{Thresholds, ToolSettings};
use codegauge::errors::ToolError;
use codegauge::models::{IssueCategory, Severity, ToolName};
use codegauge::sandbox::Sandbox;
use codegauge::tools::radon::{
    complexity_severity, maintainability_severity, size_severity, Radon, RadonPass,
};

const PROJECT: &str = "/work/project";

#[rstest]
#[case(11.0, Severity::Medium)]
#[case(20.0, Severity::Medium)]
#[case(21.0, Severity::High)]
#[case(40.0, Severity::High)]
#[case(41.0, Severity::Critical)]
fn test_complexity_severity(#[case] complexity: f64, #[case] expected: Severity) {
    assert_eq!(complexity_severity(complexity), expected);
}

#[rstest]
#[case(5.0, Severity::High)]
#[case(10.0, Severity::Medium)]
#[case(19.9, Severity::Medium)]
fn test_maintainability_severity(#[case] mi: f64, #[case] expected: Severity) {
    assert_eq!(maintainability_severity(mi), expected);
}

#[test]
fn test_size_severity() {
    assert_eq!(size_severity(501, 500), Severity::Low);
    assert_eq!(size_severity(1000, 500), Severity::Low);
    assert_eq!(size_severity(1001, 500), Severity::Medium);
}

#[test]
fn test_command_args_per_pass() {
    let radon = Radon::default();
    for (pass, name) in [
        (RadonPass::Raw, "raw"),
        (RadonPass::Cc, "cc"),
        (RadonPass::Mi, "mi"),
    ] {
        let args = radon.command_args(pass);
        assert_eq!(args[0], name);
        assert_eq!(args[1], ".");
        assert!(args.contains(&"-j".to_string()));
        assert!(args.last().unwrap().contains("node_modules"));
    }
}

#[test]
fn test_parse_cc_skips_classes_and_simple_functions() {
    let radon = Radon::default();
    let output = r#"{
        "/work/project/svc/core.py": [
            {"type": "class", "name": "Engine", "lineno": 1, "endline": 200,
             "col_offset": 0, "complexity": 60, "rank": "F"},
            {"type": "method", "name": "run", "classname": "Engine", "lineno": 10,
             "endline": 90, "col_offset": 4, "complexity": 45, "rank": "F"},
            {"type": "function", "name": "helper", "lineno": 120, "endline": 130,
             "col_offset": 0, "complexity": 3, "rank": "A"},
            {"type": "function", "name": "route", "lineno": 140, "endline": 180,
             "col_offset": 0, "complexity": 12, "rank": "C"}
        ],
        "/work/project/broken.py": {"error": "invalid syntax (<unknown>, line 3)"}
    }"#;

    let issues = radon.parse_cc(output, Path::new(PROJECT)).unwrap();
    assert_eq!(issues.len(), 2);

    let method = &issues[0];
    assert_eq!(method.tool, ToolName::Radon);
    assert_eq!(method.category, IssueCategory::Structure);
    assert_eq!(method.severity, Severity::Critical);
    assert_eq!(method.file_path, "svc/core.py");
    assert_eq!(method.line_number, 10);
    assert_eq!(method.end_line, Some(90));
    assert_eq!(method.title, "High cyclomatic complexity in Engine.run (45)");
    assert_eq!(
        method.metrics.as_ref().unwrap().cyclomatic_complexity,
        Some(45.0)
    );
    assert!(method.description.starts_with("Method 'Engine.run'"));
    assert!(method.description.contains("Rank: F"));
    assert!(method.description.contains("Lines: 10-90"));

    assert_eq!(issues[1].severity, Severity::Medium);
    assert_eq!(issues[1].title, "High cyclomatic complexity in route (12)");
}

#[test]
fn test_parse_cc_respects_configured_threshold() {
    let radon = Radon::new(
        ToolSettings::default(),
        Sandbox::new(),
        Thresholds {
            complexity: 2,
            ..Thresholds::default()
        },
    );
    let output = r#"{"a.py": [{"type": "function", "name": "f", "lineno": 1, "complexity": 3}]}"#;

    let issues = radon.parse_cc(output, Path::new(PROJECT)).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Medium);
}

#[test]
fn test_parse_mi_attaches_sloc() {
    let radon = Radon::default();
    let raw = r#"{
        "/work/project/legacy.py": {"loc": 900, "lloc": 700, "sloc": 820, "comments": 3},
        "/work/project/tiny.py": {"loc": 10, "lloc": 8, "sloc": 9, "comments": 0}
    }"#;
    let mi = r#"{
        "/work/project/legacy.py": {"mi": 7.31, "rank": "C"},
        "/work/project/tiny.py": {"mi": 88.0, "rank": "A"},
        "/work/project/odd.py": {"error": "could not parse"}
    }"#;

    let sloc = radon.parse_raw(raw, Path::new(PROJECT)).unwrap();
    assert_eq!(sloc.get("legacy.py"), Some(&820));
    assert_eq!(sloc.get("tiny.py"), Some(&9));

    let issues = radon.parse_mi(mi, Path::new(PROJECT), &sloc).unwrap();
    assert_eq!(issues.len(), 1);

    let issue = &issues[0];
    assert_eq!(issue.file_path, "legacy.py");
    assert_eq!(issue.severity, Severity::High);
    assert_eq!(issue.line_number, 1);
    assert_eq!(issue.title, "Low maintainability index (7.3)");
    let metrics = issue.metrics.as_ref().unwrap();
    assert_eq!(metrics.maintainability_index, Some(7.31));
    assert_eq!(metrics.sloc, Some(820));
}

#[test]
fn test_size_issues() {
    let radon = Radon::default();
    let sloc: BTreeMap<String, u64> = [
        ("big.py".to_string(), 1500),
        ("medium.py".to_string(), 600),
        ("small.py".to_string(), 40),
    ]
    .into_iter()
    .collect();

    let issues = radon.size_issues(&sloc);
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].file_path, "big.py");
    assert_eq!(issues[0].severity, Severity::Medium);
    assert_eq!(issues[0].title, "Large file (1500 SLOC)");
    assert_eq!(issues[1].file_path, "medium.py");
    assert_eq!(issues[1].severity, Severity::Low);
    assert_eq!(issues[1].metrics.as_ref().unwrap().sloc, Some(600));
}

#[test]
fn test_unparseable_pass_is_malformed() {
    let radon = Radon::default();
    let err = radon.parse_cc("oops", Path::new(PROJECT)).unwrap_err();
    assert!(matches!(err, ToolError::MalformedOutput { .. }));
    assert!(radon.parse_raw("", Path::new(PROJECT)).unwrap().is_empty());
}

#[cfg(unix)]
mod fake_radon {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use codegauge::config::{Thresholds, ToolSettings};
    use codegauge::sandbox::Sandbox;
    use codegauge::tools::radon::Radon;

    /// Shell script standing in for radon, dispatching on the pass name
    pub fn script(dir: &TempDir, body: &str) -> Radon {
        let path = dir.path().join("radon");
        fs::write(
            &path,
            format!(
                "#!/bin/sh\ncase \"$1\" in\n  --version) echo 'radon 6.0.1' ;;\n{}\nesac\n",
                body
            ),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let settings = ToolSettings {
            executable: Some(path.to_string_lossy().into_owned()),
            ..ToolSettings::default()
        };
        Radon::new(settings, Sandbox::new(), Thresholds::default())
    }

    pub fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "x = 1\n").unwrap();
        dir
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_pass_keeps_other_results() {
    use codegauge::tools::Analyzer;

    let bin = tempfile::TempDir::new().unwrap();
    let radon = fake_radon::script(
        &bin,
        r#"  raw) echo '{"app.py": {"loc": 900, "sloc": 800}}' ;;
  cc) echo 'cc exploded' >&2; exit 2 ;;
  mi) echo '{"./app.py": {"mi": 12.5, "rank": "B"}}' ;;"#,
    );
    let project = fake_radon::project();

    let issues = radon.analyze(project.path()).await.unwrap();
    assert_eq!(issues.len(), 2);

    let mi = &issues[0];
    assert_eq!(mi.title, "Low maintainability index (12.5)");
    assert_eq!(mi.file_path, "app.py");
    let metrics = mi.metrics.as_ref().unwrap();
    assert_eq!(metrics.maintainability_index, Some(12.5));
    assert_eq!(metrics.sloc, Some(800));

    assert_eq!(issues[1].title, "Large file (800 SLOC)");
    assert_eq!(issues[1].severity, Severity::Low);
}

#[cfg(unix)]
#[tokio::test]
async fn test_unparseable_pass_counts_as_failed() {
    use codegauge::tools::Analyzer;

    let bin = tempfile::TempDir::new().unwrap();
    let radon = fake_radon::script(
        &bin,
        r#"  raw) echo 'not json' ;;
  cc) echo '{"app.py": [{"type": "function", "name": "f", "lineno": 4, "complexity": 25}]}' ;;
  mi) exit 1 ;;"#,
    );
    let project = fake_radon::project();

    let issues = radon.analyze(project.path()).await.unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].title, "High cyclomatic complexity in f (25)");
    assert_eq!(issues[0].severity, Severity::High);
}

#[cfg(unix)]
#[tokio::test]
async fn test_every_pass_failing_fails_the_tool() {
    use codegauge::tools::Analyzer;

    let bin = tempfile::TempDir::new().unwrap();
    let radon = fake_radon::script(&bin, "  *) echo 'radon crashed' >&2; exit 1 ;;");
    let project = fake_radon::project();

    let err = radon.analyze(project.path()).await.unwrap_err();
    match err {
        ToolError::ExecutionFailed { tool, code, message } => {
            assert_eq!(tool, "radon");
            assert_eq!(code, Some(1));
            assert_eq!(message.trim(), "radon crashed");
        }
        other => panic!("unexpected error: {other}"),
    }
}
