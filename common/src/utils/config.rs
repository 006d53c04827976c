use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Memory,
}

fn default_storage_kind() -> StorageKind {
    StorageKind::Local
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub openai_model: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Parent directory for per-job working trees; the system temp dir when unset.
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default = "default_storage_kind")]
    pub storage: StorageKind,
    #[serde(default = "default_git_binary")]
    pub git_binary: String,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default)]
    pub extra_ignore_patterns: Vec<String>,
    #[serde(default = "default_analysis_max_attempts")]
    pub analysis_max_attempts: usize,
    #[serde(default = "default_analysis_backoff_factor_ms")]
    pub analysis_backoff_factor_ms: u64,
    #[serde(default = "default_analysis_max_backoff_ms")]
    pub analysis_max_backoff_ms: u64,
    #[serde(default = "default_analysis_concurrency")]
    pub analysis_concurrency: usize,
    #[serde(default = "default_analysis_request_timeout_secs")]
    pub analysis_request_timeout_secs: u64,
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            openai_model: default_model(),
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            work_dir: None,
            storage: default_storage_kind(),
            git_binary: default_git_binary(),
            max_file_bytes: default_max_file_bytes(),
            extra_ignore_patterns: Vec::new(),
            analysis_max_attempts: default_analysis_max_attempts(),
            analysis_backoff_factor_ms: default_analysis_backoff_factor_ms(),
            analysis_max_backoff_ms: default_analysis_max_backoff_ms(),
            analysis_concurrency: default_analysis_concurrency(),
            analysis_request_timeout_secs: default_analysis_request_timeout_secs(),
            job_timeout_secs: default_job_timeout_secs(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_git_binary() -> String {
    "git".to_string()
}

fn default_max_file_bytes() -> u64 {
    100 * 1024
}

fn default_analysis_max_attempts() -> usize {
    4
}

fn default_analysis_backoff_factor_ms() -> u64 {
    250
}

fn default_analysis_max_backoff_ms() -> u64 {
    8_000
}

fn default_analysis_concurrency() -> usize {
    1
}

fn default_analysis_request_timeout_secs() -> u64 {
    120
}

fn default_job_timeout_secs() -> u64 {
    15 * 60
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_missing_optional_keys_fall_back_to_defaults() {
        let config = Config::builder()
            .add_source(File::from_str(
                r#"openai_api_key = "sk-test""#,
                FileFormat::Toml,
            ))
            .build()
            .expect("config builds");
        let parsed: AppConfig = config.try_deserialize().expect("deserializes");

        assert_eq!(parsed.openai_api_key, "sk-test");
        assert_eq!(parsed.http_port, 3000);
        assert_eq!(parsed.storage, StorageKind::Local);
        assert_eq!(parsed.max_file_bytes, 102_400);
        assert_eq!(parsed.analysis_max_attempts, 4);
        assert!(parsed.extra_ignore_patterns.is_empty());
        assert!(parsed.work_dir.is_none());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config = Config::builder()
            .add_source(File::from_str(
                r#"
                openai_api_key = "sk-test"
                storage = "memory"
                job_timeout_secs = 60
                extra_ignore_patterns = ["**/*.min.js", "vendor/**"]
                "#,
                FileFormat::Toml,
            ))
            .build()
            .expect("config builds");
        let parsed: AppConfig = config.try_deserialize().expect("deserializes");

        assert_eq!(parsed.storage, StorageKind::Memory);
        assert_eq!(parsed.job_timeout_secs, 60);
        assert_eq!(parsed.extra_ignore_patterns.len(), 2);
    }
}
