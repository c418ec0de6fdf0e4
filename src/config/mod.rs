//! Configuration management for codegauge

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::models::{IssueCategory, Severity};

pub mod defaults;

/// File names searched for, in order, in each directory
pub const CONFIG_FILE_NAMES: &[&str] = &[".codegauge.toml", "codegauge.toml"];

/// Configuration provider trait
pub trait ConfigProvider {
    /// Load configuration for the project rooted at `base_dir`
    fn load_config(&self, base_dir: &Path) -> Result<GaugeConfig, ConfigError>;
}

/// Orchestrator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Maximum number of adapters running at once
    pub max_workers: usize,

    /// Return a perfect report for documentation-only trees
    pub skip_docs_only: bool,

    /// Run the structure scorer and attach its report
    pub structure_detail: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_workers: 4,
            skip_docs_only: true,
            structure_detail: true,
        }
    }
}

/// Points subtracted from a category score per issue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPenalties {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self {
            critical: 20.0,
            high: 10.0,
            medium: 5.0,
            low: 1.0,
        }
    }
}

impl SeverityPenalties {
    /// Penalty for a severity
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Weights of the category scores in the overall score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub structure: f64,
    pub quality: f64,
    pub security: f64,
    pub dependencies: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            structure: 0.4,
            quality: 0.3,
            security: 0.2,
            dependencies: 0.1,
        }
    }
}

impl CategoryWeights {
    /// Weight of a category
    pub fn weight(&self, category: IssueCategory) -> f64 {
        match category {
            IssueCategory::Structure => self.structure,
            IssueCategory::Quality => self.quality,
            IssueCategory::Security => self.security,
            IssueCategory::Dependencies => self.dependencies,
        }
    }

    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.structure + self.quality + self.security + self.dependencies
    }
}

/// Sub-weights and thresholds of the structure scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureWeights {
    pub complexity: f64,
    pub maintainability: f64,
    pub duplication: f64,
    pub size: f64,
    pub severity: f64,

    /// Severity penalty at which the severity component saturates
    pub severity_penalty_cap: f64,

    /// Minimum risk for a file to become a hotspot
    pub hotspot_threshold: f64,

    /// Risk above which a hotspot is HIGH
    pub high_threshold: f64,

    /// Risk above which a hotspot is CRITICAL
    pub critical_threshold: f64,

    /// Maximum number of hotspots reported
    pub max_hotspots: usize,

    /// Maintainability index below which a file counts against the
    /// maintainability component score
    pub maintainability_floor: f64,
}

impl Default for StructureWeights {
    fn default() -> Self {
        Self {
            complexity: 0.35,
            maintainability: 0.20,
            duplication: 0.15,
            size: 0.10,
            severity: 0.10,
            severity_penalty_cap: 50.0,
            hotspot_threshold: 0.3,
            high_threshold: 0.5,
            critical_threshold: 0.7,
            max_hotspots: 10,
            maintainability_floor: 60.0,
        }
    }
}

/// Complete scoring policy, injectable into both scorers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub severity_penalties: SeverityPenalties,
    pub category_weights: CategoryWeights,
    pub structure: StructureWeights,
}

impl ScoringPolicy {
    /// Check the policy is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalties = &self.severity_penalties;
        if [
            penalties.critical,
            penalties.high,
            penalties.medium,
            penalties.low,
        ]
        .iter()
        .any(|p| *p < 0.0)
        {
            return Err(ConfigError::Invalid(
                "severity penalties must not be negative".to_string(),
            ));
        }

        let weights = &self.category_weights;
        if [
            weights.structure,
            weights.quality,
            weights.security,
            weights.dependencies,
        ]
        .iter()
        .any(|w| *w < 0.0)
        {
            return Err(ConfigError::Invalid(
                "category weights must not be negative".to_string(),
            ));
        }
        if (weights.total() - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "category weights must sum to 1.0, got {}",
                weights.total()
            )));
        }

        let structure = &self.structure;
        if structure.severity_penalty_cap <= 0.0 {
            return Err(ConfigError::Invalid(
                "structure.severity_penalty_cap must be positive".to_string(),
            ));
        }
        if !(structure.hotspot_threshold <= structure.high_threshold
            && structure.high_threshold <= structure.critical_threshold)
        {
            return Err(ConfigError::Invalid(
                "hotspot thresholds must satisfy hotspot <= high <= critical".to_string(),
            ));
        }

        Ok(())
    }
}

/// Thresholds deciding when a measured value becomes an issue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Cyclomatic complexity above which a function is reported
    pub complexity: u32,

    /// Maintainability index below which a file is reported
    pub maintainability_index: f64,

    /// SLOC above which a file is reported
    pub sloc: u64,

    /// Smallest duplicate block, in tokens
    pub min_duplicate_tokens: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            complexity: 10,
            maintainability_index: 20.0,
            sloc: 500,
            min_duplicate_tokens: 50,
        }
    }
}

/// Per-tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Whether the tool is registered at all
    pub enabled: bool,

    /// Wall-clock budget of each tool invocation
    pub timeout_secs: u64,

    /// Additional command-line arguments
    pub extra_args: Vec<String>,

    /// Custom executable path (if not using the one in PATH)
    pub executable: Option<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: defaults::DEFAULT_TOOL_TIMEOUT_SECS,
            extra_args: Vec::new(),
            executable: None,
        }
    }
}

impl ToolSettings {
    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Executable to run, falling back to `default`
    pub fn program<'a>(&'a self, default: &'a str) -> &'a str {
        self.executable.as_deref().unwrap_or(default)
    }
}

/// Main configuration for codegauge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    /// Orchestrator settings
    pub analysis: AnalysisSettings,

    /// Scoring policy
    pub scoring: ScoringPolicy,

    /// Issue thresholds
    pub thresholds: Thresholds,

    /// Tool-specific settings, keyed by tool name
    pub tools: HashMap<String, ToolSettings>,
}

impl GaugeConfig {
    /// Settings for a tool, defaulted when not configured
    pub fn tool(&self, name: &str) -> ToolSettings {
        self.tools
            .get(name)
            .cloned()
            .unwrap_or_else(|| defaults::default_tool_settings(name))
    }

    /// Check every section is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analysis.max_workers == 0 {
            return Err(ConfigError::Invalid(
                "analysis.max_workers must be at least 1".to_string(),
            ));
        }
        for (name, tool) in &self.tools {
            if tool.timeout_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "tools.{}.timeout_secs must be at least 1",
                    name
                )));
            }
        }
        self.scoring.validate()
    }
}

/// TOML configuration provider
#[derive(Debug, Default)]
pub struct TomlConfigProvider {
    /// Explicit config file, bypassing the directory search
    config_path: Option<PathBuf>,
}

impl TomlConfigProvider {
    /// Create a provider that searches from the project directory upwards
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Use an explicit configuration file
    pub fn with_config_file(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Find project-level config by traversing the directory tree upwards
    fn find_project_config(&self, base_dir: &Path) -> Option<PathBuf> {
        base_dir.ancestors().find_map(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Read configuration from a file
    fn read_config_file(&self, path: &Path) -> Result<GaugeConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config: GaugeConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn load_config(&self, base_dir: &Path) -> Result<GaugeConfig, ConfigError> {
        let path = match &self.config_path {
            Some(path) => Some(path.clone()),
            None => self.find_project_config(base_dir),
        };

        let config = match path {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                self.read_config_file(&path)?
            }
            None => {
                debug!("No config file found from {:?}, using defaults", base_dir);
                GaugeConfig::default()
            }
        };

        config.validate()?;
        Ok(config)
    }
}
