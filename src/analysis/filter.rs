//! Reportability filter for classified problems.
//!
//! Suppression gates inclusion in the actionable result set only; a
//! suppressed row still flows into the audit changelog.

use regex::Regex;
use tracing::debug;

use super::aggregate::ReplicationAnalysis;
use super::classify::AnalysisCode;

pub struct SuppressionFilter {
    ignore_hostname_patterns: Vec<Regex>,
}

impl SuppressionFilter {
    /// Compile the configured hostname exclusion patterns. Fails on the
    /// first invalid pattern rather than silently dropping it.
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let ignore_hostname_patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            ignore_hostname_patterns,
        })
    }

    /// Whether a classified row belongs in the recovery engine's input.
    /// `NoProblem` rows are never reportable.
    pub fn is_reportable(&self, analysis: &ReplicationAnalysis, include_downtimed: bool) -> bool {
        if analysis.analysis == AnalysisCode::NoProblem {
            return false;
        }
        let hostname = &analysis.analyzed_instance_key.hostname;
        if self
            .ignore_hostname_patterns
            .iter()
            .any(|pattern| pattern.is_match(hostname))
        {
            debug!(
                key = %analysis.analyzed_instance_key,
                analysis = %analysis.analysis,
                "Problem suppressed by hostname filter"
            );
            return false;
        }
        if analysis.is_downtimed && !include_downtimed {
            debug!(
                key = %analysis.analyzed_instance_key,
                analysis = %analysis.analysis,
                "Problem suppressed by active downtime"
            );
            return false;
        }
        true
    }
}
