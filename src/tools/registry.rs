use log::{debug, info};
use std::sync::Arc;

use crate::config::GaugeConfig;
use crate::sandbox::Sandbox;
use crate::tools::{Analyzer, Bandit, Jscpd, Radon, Ruff};

/// Availability report for one registered analyzer
#[derive(Debug, Clone)]
pub struct AnalyzerInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub available: bool,
    pub version: Option<String>,
}

/// Ordered set of analyzers. Registration order is the merge order of their
/// issues.
#[derive(Default, Clone)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Registry holding the built-in analyzers enabled in `config`:
    /// ruff, bandit, radon, jscpd
    pub fn with_default_analyzers(config: &GaugeConfig) -> Self {
        let mut registry = Self::new();
        let sandbox = Sandbox::new();
        let thresholds = config.thresholds;

        let candidates: Vec<Arc<dyn Analyzer>> = vec![
            Arc::new(Ruff::new(config.tool("ruff"), sandbox.clone())),
            Arc::new(Bandit::new(config.tool("bandit"), sandbox.clone())),
            Arc::new(Radon::new(config.tool("radon"), sandbox.clone(), thresholds)),
            Arc::new(Jscpd::new(config.tool("jscpd"), sandbox, thresholds)),
        ];

        for analyzer in candidates {
            if config.tool(analyzer.name()).enabled {
                registry.register(analyzer);
            } else {
                debug!("Analyzer {} is disabled in config", analyzer.name());
            }
        }

        info!("Registered {} analyzers", registry.len());
        registry
    }

    /// Check if an analyzer is already registered
    pub fn has_analyzer(&self, name: &str) -> bool {
        self.analyzers.iter().any(|a| a.name() == name)
    }

    /// Append an analyzer. A second analyzer with the same name is ignored.
    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        if !self.has_analyzer(analyzer.name()) {
            debug!("Registering analyzer: {}", analyzer.name());
            self.analyzers.push(analyzer);
        } else {
            debug!("Analyzer already registered: {}", analyzer.name());
        }
    }

    /// Analyzers in registration order
    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    /// Look up an analyzer by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.iter().find(|a| a.name() == name).cloned()
    }

    /// Keep only the named analyzers, preserving registration order
    pub fn retain_names<S: AsRef<str>>(&mut self, names: &[S]) {
        self.analyzers
            .retain(|a| names.iter().any(|name| name.as_ref() == a.name()));
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Availability and version of every analyzer
    pub async fn analyzer_info(&self) -> Vec<AnalyzerInfo> {
        let mut infos = Vec::with_capacity(self.analyzers.len());
        for analyzer in &self.analyzers {
            infos.push(AnalyzerInfo {
                name: analyzer.name().to_string(),
                display_name: analyzer.display_name().to_string(),
                description: analyzer.description().to_string(),
                available: analyzer.is_available().await,
                version: analyzer.version().await,
            });
        }
        infos
    }
}
