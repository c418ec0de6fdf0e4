//! Turning an issue corpus into scores

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::config::ScoringPolicy;
use crate::models::{IssueCategory, Issue, Severity};

pub mod structure;

pub use structure::StructureScorer;

/// Upper bound of every score
pub const MAX_SCORE: f64 = 100.0;

/// Four category scores and their weighted overall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub overall: f64,
    pub structure: f64,
    pub quality: f64,
    pub security: f64,
    pub dependencies: f64,
}

impl CategoryScores {
    /// Score of a single category
    pub fn get(&self, category: IssueCategory) -> f64 {
        match category {
            IssueCategory::Structure => self.structure,
            IssueCategory::Quality => self.quality,
            IssueCategory::Security => self.security,
            IssueCategory::Dependencies => self.dependencies,
        }
    }
}

impl Default for CategoryScores {
    fn default() -> Self {
        Self {
            overall: MAX_SCORE,
            structure: MAX_SCORE,
            quality: MAX_SCORE,
            security: MAX_SCORE,
            dependencies: MAX_SCORE,
        }
    }
}

/// Severity-penalty subtraction per category.
///
/// Issues are counted per category and severity before any arithmetic, so
/// the result does not depend on the order of the corpus.
#[derive(Debug, Clone, Default)]
pub struct CategoryScoreCalculator {
    policy: ScoringPolicy,
}

impl CategoryScoreCalculator {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Score a corpus
    pub fn calculate(&self, issues: &[Issue]) -> CategoryScores {
        let mut counts: HashMap<(IssueCategory, Severity), usize> = HashMap::new();
        for issue in issues {
            *counts.entry((issue.category, issue.severity)).or_default() += 1;
        }

        let score_of = |category: IssueCategory| -> f64 {
            let penalty: f64 = Severity::iter()
                .map(|severity| {
                    let count = counts.get(&(category, severity)).copied().unwrap_or(0);
                    count as f64 * self.policy.severity_penalties.penalty(severity)
                })
                .sum();
            (MAX_SCORE - penalty).max(0.0)
        };

        let mut scores = CategoryScores {
            overall: 0.0,
            structure: score_of(IssueCategory::Structure),
            quality: score_of(IssueCategory::Quality),
            security: score_of(IssueCategory::Security),
            dependencies: score_of(IssueCategory::Dependencies),
        };

        scores.overall = IssueCategory::iter()
            .map(|category| self.policy.category_weights.weight(category) * scores.get(category))
            .sum::<f64>()
            .clamp(0.0, MAX_SCORE);

        debug!(
            "Scored {} issues: overall {:.1} (structure {:.1}, quality {:.1}, security {:.1}, dependencies {:.1})",
            issues.len(),
            scores.overall,
            scores.structure,
            scores.quality,
            scores.security,
            scores.dependencies
        );

        scores
    }
}
