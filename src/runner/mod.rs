//! Analysis orchestration: run every analyzer, merge, score

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::task::{self, JoinHandle};

use crate::config::GaugeConfig;
use crate::errors::{GaugeError, ToolError};
use crate::models::{AnalysisReport, Issue, ToolRun, ToolStatus};
use crate::scoring::{CategoryScoreCalculator, StructureScorer};
use crate::tools::{Analyzer, AnalyzerRegistry};
use crate::utils::file_selection;

/// Runs the registered analyzers against a project tree and scores the
/// merged issues
pub struct Orchestrator {
    registry: AnalyzerRegistry,
    config: GaugeConfig,
}

impl Orchestrator {
    /// Create an orchestrator over an explicit registry
    pub fn new(registry: AnalyzerRegistry, config: GaugeConfig) -> Self {
        Self { registry, config }
    }

    /// Orchestrator with the built-in analyzers enabled in `config`
    pub fn with_default_analyzers(config: GaugeConfig) -> Self {
        let registry = AnalyzerRegistry::with_default_analyzers(&config);
        Self::new(registry, config)
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GaugeConfig {
        &self.config
    }

    /// Analyze the tree at `project_path`.
    ///
    /// Only a missing project directory fails the run. Analyzer failures are
    /// logged and recorded in the report's tool runs.
    pub async fn run_analysis(&self, project_path: &Path) -> Result<AnalysisReport, GaugeError> {
        if !project_path.is_dir() {
            return Err(GaugeError::ProjectNotFound(project_path.to_path_buf()));
        }

        info!(
            "Analyzing {} with {} analyzers",
            project_path.display(),
            self.registry.len()
        );

        if self.config.analysis.skip_docs_only && self.is_docs_only(project_path).await {
            info!(
                "{} holds only documentation, skipping analyzers",
                project_path.display()
            );
            return Ok(self.skipped_report());
        }

        let workers = self.config.analysis.max_workers.max(1);
        let runs: Vec<_> = self
            .registry
            .analyzers()
            .iter()
            .cloned()
            .map(|analyzer| run_analyzer(analyzer, project_path))
            .collect();

        // `buffered` yields in submission order whatever the completion order
        let outcomes: Vec<(Vec<Issue>, ToolRun)> =
            stream::iter(runs).buffered(workers).collect().await;

        let mut issues = Vec::new();
        let mut tools = Vec::with_capacity(outcomes.len());
        for (found, run) in outcomes {
            issues.extend(found);
            tools.push(run);
        }

        Ok(self.build_report(issues, tools))
    }

    /// Score an already-collected corpus
    pub fn build_report(&self, issues: Vec<Issue>, tools: Vec<ToolRun>) -> AnalysisReport {
        let policy = &self.config.scoring;
        let scores = CategoryScoreCalculator::new(policy.clone()).calculate(&issues);

        let structure = self.config.analysis.structure_detail.then(|| {
            StructureScorer::new(policy.structure, policy.severity_penalties).score(&issues)
        });

        info!(
            "Analysis complete: {} issues, overall score {:.1}",
            issues.len(),
            scores.overall
        );

        AnalysisReport {
            overall_score: scores.overall,
            structure_score: scores.structure,
            quality_score: scores.quality,
            security_score: scores.security,
            dependencies_score: scores.dependencies,
            issues,
            structure,
            tools,
        }
    }

    /// Run the analysis on a background task
    pub fn spawn(self: Arc<Self>, project_path: PathBuf) -> AnalysisHandle {
        let task = task::spawn(async move { self.run_analysis(&project_path).await });
        AnalysisHandle { task }
    }

    async fn is_docs_only(&self, project_path: &Path) -> bool {
        let root = project_path.to_path_buf();
        task::spawn_blocking(move || file_selection::is_docs_only_tree(&root))
            .await
            .unwrap_or_else(|e| {
                warn!("Documentation scan did not complete: {}", e);
                false
            })
    }

    fn skipped_report(&self) -> AnalysisReport {
        let tools = self
            .registry
            .analyzers()
            .iter()
            .map(|analyzer| ToolRun {
                tool: analyzer.tool(),
                name: analyzer.name().to_string(),
                status: ToolStatus::Skipped,
                issues_found: 0,
                duration_ms: 0,
            })
            .collect();

        AnalysisReport {
            tools,
            ..AnalysisReport::perfect()
        }
    }
}

/// Run one analyzer, turning every failure (panics included) into zero
/// issues and a status
async fn run_analyzer(analyzer: Arc<dyn Analyzer>, project_path: &Path) -> (Vec<Issue>, ToolRun) {
    let start = Instant::now();
    debug!("Starting analyzer {}", analyzer.name());

    let outcome = AssertUnwindSafe(analyzer.analyze(project_path))
        .catch_unwind()
        .await;

    let (issues, status) = match outcome {
        Ok(Ok(issues)) => (issues, ToolStatus::Completed),
        Ok(Err(e)) => {
            error!(
                "Analyzer {} failed on {}: {}",
                analyzer.name(),
                project_path.display(),
                e
            );
            (Vec::new(), status_of(&e))
        }
        Err(_) => {
            error!(
                "Analyzer {} panicked on {}",
                analyzer.name(),
                project_path.display()
            );
            (Vec::new(), ToolStatus::Panicked)
        }
    };

    let run = ToolRun {
        tool: analyzer.tool(),
        name: analyzer.name().to_string(),
        status,
        issues_found: issues.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    debug!(
        "Analyzer {} finished with status {} in {}ms",
        run.name, run.status, run.duration_ms
    );

    (issues, run)
}

/// Tool run status for an adapter error
pub fn status_of(error: &ToolError) -> ToolStatus {
    match error {
        ToolError::Unavailable { .. } => ToolStatus::Unavailable,
        ToolError::Timeout { .. } => ToolStatus::TimedOut,
        ToolError::ExecutionFailed { .. } => ToolStatus::Failed,
        ToolError::MalformedOutput { .. } => ToolStatus::MalformedOutput,
    }
}

/// Handle to an analysis running in the background.
///
/// Cancelling drops the in-flight analyzer futures, which kills their
/// child processes.
pub struct AnalysisHandle {
    task: JoinHandle<Result<AnalysisReport, GaugeError>>,
}

impl AnalysisHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Abort the run
    pub fn cancel(&self) {
        info!("Cancelling analysis");
        self.task.abort();
    }

    /// Wait for the report. A cancelled run yields `GaugeError::Cancelled`.
    pub async fn wait(self) -> Result<AnalysisReport, GaugeError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(GaugeError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
