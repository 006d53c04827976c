use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AnalysisTuning {
    /// Total summarizer attempts per unit, including the first.
    pub max_attempts: usize,
    pub backoff_factor_ms: u64,
    pub max_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub unit_concurrency: usize,
}

impl Default for AnalysisTuning {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_factor_ms: 250,
            max_backoff_ms: 8_000,
            request_timeout_secs: 120,
            unit_concurrency: 1,
        }
    }
}

impl AnalysisTuning {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub tuning: AnalysisTuning,
    pub max_file_bytes: u64,
    pub extra_ignore_patterns: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tuning: AnalysisTuning::default(),
            max_file_bytes: 100 * 1024,
            extra_ignore_patterns: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            tuning: AnalysisTuning {
                max_attempts: config.analysis_max_attempts.max(1),
                backoff_factor_ms: config.analysis_backoff_factor_ms,
                max_backoff_ms: config.analysis_max_backoff_ms,
                request_timeout_secs: config.analysis_request_timeout_secs,
                unit_concurrency: config.analysis_concurrency.max(1),
            },
            max_file_bytes: config.max_file_bytes,
            extra_ignore_patterns: config.extra_ignore_patterns.clone(),
        }
    }
}
