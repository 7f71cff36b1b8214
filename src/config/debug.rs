//! Debugging feature flags.

pub struct LogFlags {
    /// Activate trace_time macro (for cool scope-level timing)
    pub log_performance: bool,

    /// Per-detector factor dumps (very noisy on long series)
    pub log_factors: bool,

    /// Cluster boundaries as the greedy walk opens new zones
    pub log_clustering: bool,
}

pub const DF: LogFlags = LogFlags {
    log_performance: false,
    log_factors: false,
    log_clustering: false,
};

pub const LOG_PERFORMANCE: bool = DF.log_performance;
