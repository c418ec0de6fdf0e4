use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::cli::{AnalyzeArgs, OutputFormat, ToolsArgs, Verbosity};
use crate::config::{ConfigProvider, GaugeConfig};
use crate::errors::GaugeError;
use crate::models::AnalysisReport;
use crate::output::{JsonFormatter, PrettyFormatter, ReportFormatter};
use crate::runner::Orchestrator;
use crate::tools::AnalyzerRegistry;

/// Core application wiring config, analyzers and output together
pub struct GaugeApp<C: ConfigProvider> {
    config_provider: C,
    verbosity: Verbosity,
}

impl<C: ConfigProvider> GaugeApp<C> {
    pub fn new(config_provider: C) -> Self {
        Self {
            config_provider,
            verbosity: Verbosity::default(),
        }
    }

    /// Set the verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Load config for `path` and apply the command-line overrides
    pub fn load_config(&self, path: &Path, args: &AnalyzeArgs) -> Result<GaugeConfig, GaugeError> {
        let mut config = self.config_provider.load_config(path)?;

        if args.no_structure {
            config.analysis.structure_detail = false;
        }
        if let Some(workers) = args.workers {
            config.analysis.max_workers = workers.max(1);
        }

        debug!("Effective config: {:?}", config);
        Ok(config)
    }

    /// Run the analyze command and return the rendered report
    pub async fn analyze(&self, args: &AnalyzeArgs) -> Result<(AnalysisReport, String), GaugeError> {
        if !args.path.is_dir() {
            return Err(GaugeError::ProjectNotFound(args.path.clone()));
        }

        let config = self.load_config(&args.path, args)?;
        let mut registry = AnalyzerRegistry::with_default_analyzers(&config);
        if let Some(names) = &args.tools {
            registry.retain_names(names.as_slice());
            info!("Restricted analyzers to {}", names.join(", "));
        }

        let orchestrator = Arc::new(Orchestrator::new(registry, config));
        let spinner = self.spinner(&args.path);

        let handle = orchestrator.spawn(args.path.clone());
        let result = handle.wait().await;

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let report = result?;
        let rendered = formatter(args.format).format_report(&report);

        if let Some(output) = &args.output {
            write_report(output, &rendered)?;
            info!("Report written to {}", output.display());
        }

        Ok((report, rendered))
    }

    /// Run the tools command and return the rendered listing
    pub async fn tools(&self, base_dir: &Path, args: &ToolsArgs) -> Result<String, GaugeError> {
        let config = self.config_provider.load_config(base_dir)?;
        let registry = AnalyzerRegistry::with_default_analyzers(&config);
        let infos = registry.analyzer_info().await;
        Ok(formatter(args.format).format_tools(&infos))
    }

    fn spinner(&self, path: &Path) -> Option<ProgressBar> {
        if self.verbosity == Verbosity::Quiet {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.magenta} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Analyzing {}", path.display()));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    }
}

fn formatter(format: OutputFormat) -> Box<dyn ReportFormatter> {
    match format {
        OutputFormat::Pretty => Box::new(PrettyFormatter::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

fn write_report(path: &Path, rendered: &str) -> Result<(), GaugeError> {
    std::fs::write(path, rendered)?;
    Ok(())
}
