use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use codegauge::app::GaugeApp;
use codegauge::cli::{AnalyzeArgs, Cli, Commands, OutputFormat, ToolsArgs, Verbosity};
use codegauge::config::TomlConfigProvider;
use codegauge::models::AnalysisReport;

fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
    match Cli::try_parse_from(argv).expect("arguments parse").command {
        Commands::Analyze(args) => args,
        other => panic!("Expected Analyze command, got {:?}", other),
    }
}

#[test]
fn test_analyze_defaults() {
    let args = analyze_args(&["codegauge", "analyze", "proj"]);

    assert_eq!(args.path, PathBuf::from("proj"));
    assert_eq!(args.format, OutputFormat::Pretty);
    assert_eq!(args.output, None);
    assert!(!args.no_structure);
    assert_eq!(args.workers, None);
    assert_eq!(args.tools, None);
}

#[test]
fn test_analyze_flags() {
    let args = analyze_args(&[
        "codegauge",
        "analyze",
        "proj",
        "--format",
        "json",
        "-o",
        "report.json",
        "--no-structure",
        "--workers",
        "2",
        "--tools",
        "ruff,radon",
    ]);

    assert_eq!(args.format, OutputFormat::Json);
    assert_eq!(args.output, Some(PathBuf::from("report.json")));
    assert!(args.no_structure);
    assert_eq!(args.workers, Some(2));
    assert_eq!(
        args.tools,
        Some(vec!["ruff".to_string(), "radon".to_string()])
    );
}

#[test]
fn test_analyze_requires_path() {
    assert!(Cli::try_parse_from(["codegauge", "analyze"]).is_err());
    assert!(Cli::try_parse_from(["codegauge", "analyze", "p", "--format", "xml"]).is_err());
    assert!(Cli::try_parse_from(["codegauge"]).is_err());
}

#[test]
fn test_tools_command_and_alias() {
    let cli = Cli::parse_from(["codegauge", "tools"]);
    assert!(matches!(
        cli.command,
        Commands::Tools(ToolsArgs {
            format: OutputFormat::Pretty
        })
    ));

    let cli = Cli::parse_from(["codegauge", "list-tools", "--format", "json"]);
    assert!(matches!(
        cli.command,
        Commands::Tools(ToolsArgs {
            format: OutputFormat::Json
        })
    ));
}

#[test]
fn test_global_flags() {
    let cli = Cli::parse_from(["codegauge", "analyze", "p", "-vv", "-c", "gauge.toml"]);
    assert_eq!(cli.verbose, 2);
    assert!(!cli.quiet);
    assert_eq!(cli.config, Some(PathBuf::from("gauge.toml")));
    assert_eq!(cli.verbosity(), Verbosity::Debug);

    let cli = Cli::parse_from(["codegauge", "-q", "-v", "tools"]);
    assert_eq!(cli.verbosity(), Verbosity::Quiet);
}

#[test]
fn test_verbosity_levels() {
    let cli = Cli::parse_from(["codegauge", "tools"]);
    assert_eq!(cli.verbosity(), Verbosity::Normal);

    let verbosity: Verbosity = 0.into();
    assert_eq!(verbosity, Verbosity::Normal);

    let verbosity: Verbosity = 1.into();
    assert_eq!(verbosity, Verbosity::Verbose);

    // Anything past -vv stays at Debug
    let verbosity: Verbosity = 10.into();
    assert_eq!(verbosity, Verbosity::Debug);

    assert_eq!(Verbosity::Quiet.log_level(), LevelFilter::Error);
    assert_eq!(Verbosity::Normal.log_level(), LevelFilter::Warn);
    assert_eq!(Verbosity::Verbose.log_level(), LevelFilter::Info);
    assert_eq!(Verbosity::Debug.log_level(), LevelFilter::Debug);
}

#[test]
fn test_load_config_applies_overrides() {
    let project = TempDir::new().unwrap();
    let app = GaugeApp::new(TomlConfigProvider::new());

    let path = project.path().to_string_lossy().into_owned();
    let args = analyze_args(&["codegauge", "analyze", &path]);
    let config = app.load_config(project.path(), &args).unwrap();
    assert!(config.analysis.structure_detail);
    assert_eq!(config.analysis.max_workers, 4);

    let args = analyze_args(&[
        "codegauge",
        "analyze",
        &path,
        "--no-structure",
        "--workers",
        "0",
    ]);
    let config = app.load_config(project.path(), &args).unwrap();
    assert!(!config.analysis.structure_detail);
    assert_eq!(config.analysis.max_workers, 1);
}

#[tokio::test]
async fn test_analyze_with_no_matching_tools_writes_json() {
    let project = TempDir::new().unwrap();
    std::fs::write(project.path().join("app.py"), "print('hi')\n").unwrap();
    let out = project.path().join("report.json");

    let path = project.path().to_string_lossy().into_owned();
    let out_arg = out.to_string_lossy().into_owned();
    let args = analyze_args(&[
        "codegauge",
        "analyze",
        &path,
        "--format",
        "json",
        "--tools",
        "nothing-by-this-name",
        "--no-structure",
        "-o",
        &out_arg,
    ]);

    let app = GaugeApp::new(TomlConfigProvider::new()).with_verbosity(Verbosity::Quiet);
    let (report, rendered) = app.analyze(&args).await.unwrap();

    assert!(report.tools.is_empty());
    assert_eq!(report.overall_score, 100.0);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), rendered);

    let parsed: AnalysisReport = serde_json::from_str(&rendered).unwrap();
    assert_eq!(parsed, report);
    assert!(parsed.structure.is_none());
}

#[tokio::test]
async fn test_analyze_missing_path_fails() {
    let args = analyze_args(&["codegauge", "analyze", "/definitely/not/a/project"]);
    let app = GaugeApp::new(TomlConfigProvider::new()).with_verbosity(Verbosity::Quiet);
    assert!(app.analyze(&args).await.is_err());
}

#[tokio::test]
async fn test_tools_listing_honors_format() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".codegauge.toml"),
        "[tools.ruff]\nenabled = false\n[tools.bandit]\nenabled = false\n\
         [tools.radon]\nenabled = false\n[tools.jscpd]\nenabled = false\n",
    )
    .unwrap();

    let app = GaugeApp::new(TomlConfigProvider::new());
    let listing = app
        .tools(
            dir.path(),
            &ToolsArgs {
                format: OutputFormat::Json,
            },
        )
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}
