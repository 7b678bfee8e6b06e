use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Aggregation and classification settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Audit changelog settings
    #[serde(default)]
    pub changelog: ChangelogConfig,
}

// ============================================================================
// Analysis Configuration
// ============================================================================

/// Settings consumed by the snapshot aggregator and suppression filter
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Cadence of the external poller (seconds). A node's monitoring is
    /// considered stale once a check attempt is outstanding for more than
    /// twice this interval.
    #[serde(default = "default_instance_poll_seconds")]
    pub instance_poll_seconds: u64,
    /// Restrict the aggregated row set to "interesting" nodes (stale,
    /// partially-valid, or any-replica-present). Volume knob only; never
    /// changes classification outcomes for rows it retains.
    #[serde(default)]
    pub reduce_analysis_count: bool,
    /// Hostname regex patterns whose problems are hidden from the
    /// actionable result set (but never from the changelog)
    #[serde(default)]
    pub recovery_ignore_hostname_filters: Vec<String>,
}

fn default_instance_poll_seconds() -> u64 {
    60
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            instance_poll_seconds: default_instance_poll_seconds(),
            reduce_analysis_count: false,
            recovery_ignore_hostname_filters: Vec::new(),
        }
    }
}

// ============================================================================
// Changelog Configuration
// ============================================================================

/// Settings for the audit changelog recorder
#[derive(Debug, Clone, Deserialize)]
pub struct ChangelogConfig {
    /// Retention window for changelog entries (hours)
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u32,
}

fn default_retention_hours() -> u32 {
    240
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
        }
    }
}
