use std::{future::Future, time::Duration};

use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};
use tracing::{debug, warn};

use super::config::AnalysisTuning;
use crate::{
    filter::AnalyzableUnit,
    summarizer::{SummarizeError, Summarizer},
};

/// Generated documentation for one unit, in unit order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub path: String,
    pub text: String,
    pub placeholder: bool,
}

impl Fragment {
    pub fn documented(path: &str, body: &str) -> Self {
        Self {
            path: path.to_string(),
            text: format!("# Explanation for `{path}`\n\n{}\n", body.trim_end()),
            placeholder: false,
        }
    }

    pub fn placeholder(path: &str, reason: &str) -> Self {
        Self {
            path: path.to_string(),
            text: format!(
                "# Explanation for `{path}`\n\n> Documentation for this file could not be generated: {reason}.\n"
            ),
            placeholder: true,
        }
    }

    /// First line of prose, skipping headings.
    pub fn summary_line(&self) -> Option<&str> {
        self.text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty() && !line.starts_with('#'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Documented(Fragment),
    /// Transient failures outlasted the retry budget.
    Placeholder { fragment: Fragment, reason: String },
    /// Not retried; the unit gets no fragment.
    Skipped { path: String, reason: String },
}

/// Delays between attempts: `2^n * factor` milliseconds, capped and jittered.
pub fn retry_strategy(tuning: &AnalysisTuning) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(tuning.backoff_factor_ms)
        .max_delay(tuning.max_backoff())
        .map(jitter)
        .take(tuning.max_attempts.saturating_sub(1))
}

async fn call_with_retry<F, Fut>(
    tuning: &AnalysisTuning,
    label: &str,
    mut call: F,
) -> Result<String, SummarizeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, SummarizeError>>,
{
    let request_timeout = tuning.request_timeout();
    let mut attempt: usize = 0;

    RetryIf::spawn(
        retry_strategy(tuning),
        || {
            let request = call();
            async move {
                tokio::time::timeout(request_timeout, request)
                    .await
                    .unwrap_or_else(|_| Err(SummarizeError::Unavailable("request timed out".into())))
            }
        },
        |err: &SummarizeError| {
            attempt = attempt.saturating_add(1);
            let transient = err.is_transient();
            if transient {
                warn!(unit = label, attempt, error = %err, "summarizer call failed");
            }
            transient
        },
    )
    .await
}

/// Runs the summarizer for one unit. Never fails: every error is folded into
/// the outcome so the stage can decide what the job does with it.
pub async fn analyze_unit(
    summarizer: &dyn Summarizer,
    unit: &AnalyzableUnit,
    tuning: &AnalysisTuning,
) -> UnitOutcome {
    let path = unit.path.as_str();
    let content = match tokio::fs::read(&unit.location).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            return UnitOutcome::Skipped {
                path: path.to_string(),
                reason: format!("unreadable file: {err}"),
            }
        }
    };
    let content = content.as_str();

    match call_with_retry(tuning, path, || summarizer.summarize(path, content)).await {
        Ok(body) => {
            debug!(unit = path, "unit documented");
            UnitOutcome::Documented(Fragment::documented(path, &body))
        }
        Err(err) if err.is_transient() => {
            let reason = format!("{err} (gave up after {} attempts)", tuning.max_attempts);
            UnitOutcome::Placeholder {
                fragment: Fragment::placeholder(path, &reason),
                reason,
            }
        }
        Err(err) => UnitOutcome::Skipped {
            path: path.to_string(),
            reason: err.to_string(),
        },
    }
}

/// Asks for a project overview built from the documented tree.
pub async fn project_overview(
    summarizer: &dyn Summarizer,
    fragments: &[Fragment],
    tuning: &AnalysisTuning,
) -> Result<String, SummarizeError> {
    let tree = file_tree(fragments);
    let summaries = fragments
        .iter()
        .filter(|fragment| !fragment.placeholder)
        .map(|fragment| {
            format!(
                "- `{}`: {}",
                fragment.path,
                fragment.summary_line().unwrap_or("no summary available")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    call_with_retry(tuning, "project overview", || {
        summarizer.summarize_project(&tree, &summaries)
    })
    .await
}

/// Indented listing of fragment paths; expects path order.
pub fn file_tree(fragments: &[Fragment]) -> String {
    let mut lines = Vec::new();
    let mut previous: Vec<&str> = Vec::new();

    for fragment in fragments {
        let parts: Vec<&str> = fragment.path.split('/').collect();
        let Some((file, dirs)) = parts.split_last() else {
            continue;
        };
        let shared = previous
            .iter()
            .zip(dirs)
            .take_while(|(a, b)| a == b)
            .count();
        for (depth, dir) in dirs.iter().enumerate().skip(shared) {
            lines.push(format!("{}{dir}/", "  ".repeat(depth)));
        }
        lines.push(format!("{}{file}", "  ".repeat(dirs.len())));
        previous = dirs.to_vec();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedSummarizer {
        failures_before_success: usize,
        error: SummarizeError,
        calls: AtomicUsize,
    }

    impl ScriptedSummarizer {
        fn new(failures_before_success: usize, error: SummarizeError) -> Self {
            Self {
                failures_before_success,
                error,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Summarizer for ScriptedSummarizer {
        async fn summarize(&self, path: &str, _content: &str) -> Result<String, SummarizeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(self.error.clone())
            } else {
                Ok(format!("Docs for {path}."))
            }
        }

        async fn summarize_project(
            &self,
            file_tree: &str,
            _summaries: &str,
        ) -> Result<String, SummarizeError> {
            Ok(format!("Overview of:\n{file_tree}"))
        }
    }

    fn fast_tuning(max_attempts: usize) -> AnalysisTuning {
        AnalysisTuning {
            max_attempts,
            backoff_factor_ms: 0,
            max_backoff_ms: 0,
            request_timeout_secs: 5,
            unit_concurrency: 1,
        }
    }

    fn unit_in(dir: &tempfile::TempDir, path: &str) -> AnalyzableUnit {
        let location = dir.path().join(path);
        std::fs::write(&location, "fn demo() {}\n").expect("write unit");
        AnalyzableUnit {
            path: path.to_string(),
            location,
            size: 13,
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = unit_in(&dir, "demo.rs");
        let summarizer = ScriptedSummarizer::new(2, SummarizeError::RateLimited);

        let outcome = analyze_unit(&summarizer, &unit, &fast_tuning(4)).await;

        assert_eq!(summarizer.calls(), 3);
        let UnitOutcome::Documented(fragment) = outcome else {
            panic!("expected documented unit, got {outcome:?}");
        };
        assert!(fragment.text.starts_with("# Explanation for `demo.rs`"));
        assert_eq!(fragment.summary_line(), Some("Docs for demo.rs."));
        assert!(!fragment.placeholder);
    }

    #[tokio::test]
    async fn test_exhausted_retries_produce_placeholder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = unit_in(&dir, "demo.rs");
        let summarizer =
            ScriptedSummarizer::new(usize::MAX, SummarizeError::Unavailable("503".into()));

        let outcome = analyze_unit(&summarizer, &unit, &fast_tuning(3)).await;

        assert_eq!(summarizer.calls(), 3);
        let UnitOutcome::Placeholder { fragment, reason } = outcome else {
            panic!("expected placeholder, got {outcome:?}");
        };
        assert!(fragment.placeholder);
        assert!(reason.contains("3 attempts"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_not_retried() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = unit_in(&dir, "demo.rs");
        let summarizer = ScriptedSummarizer::new(
            usize::MAX,
            SummarizeError::InvalidInput("too long".into()),
        );

        let outcome = analyze_unit(&summarizer, &unit, &fast_tuning(4)).await;

        assert_eq!(summarizer.calls(), 1);
        assert!(matches!(outcome, UnitOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_unit_is_skipped_without_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let unit = AnalyzableUnit {
            path: "gone.rs".into(),
            location: dir.path().join("gone.rs"),
            size: 0,
        };
        let summarizer = ScriptedSummarizer::new(0, SummarizeError::RateLimited);

        let outcome = analyze_unit(&summarizer, &unit, &fast_tuning(4)).await;

        assert_eq!(summarizer.calls(), 0);
        let UnitOutcome::Skipped { path, reason } = outcome else {
            panic!("expected skipped unit");
        };
        assert_eq!(path, "gone.rs");
        assert!(reason.contains("unreadable"));
    }

    #[test]
    fn test_retry_strategy_is_bounded_and_capped() {
        let tuning = AnalysisTuning {
            max_attempts: 6,
            backoff_factor_ms: 1_000,
            max_backoff_ms: 3_000,
            ..AnalysisTuning::default()
        };
        let delays: Vec<Duration> = retry_strategy(&tuning).collect();
        assert_eq!(delays.len(), 5);
        assert!(delays.iter().all(|d| *d <= Duration::from_millis(3_000)));

        let single = AnalysisTuning {
            max_attempts: 1,
            ..AnalysisTuning::default()
        };
        assert_eq!(retry_strategy(&single).count(), 0);
    }

    #[test]
    fn test_file_tree_rendering() {
        let fragments: Vec<Fragment> = ["README.md", "src/lib.rs", "src/net/http.rs", "src/net/tcp.rs"]
            .iter()
            .map(|path| Fragment::documented(path, "body"))
            .collect();

        assert_eq!(
            file_tree(&fragments),
            "README.md\nsrc/\n  lib.rs\n  net/\n    http.rs\n    tcp.rs"
        );
        assert_eq!(file_tree(&[]), "");
    }

    #[tokio::test]
    async fn test_project_overview_uses_tree() {
        let summarizer = ScriptedSummarizer::new(0, SummarizeError::RateLimited);
        let fragments = vec![Fragment::documented("src/lib.rs", "Library root.")];

        let overview = project_overview(&summarizer, &fragments, &fast_tuning(2))
            .await
            .expect("overview");
        assert!(overview.contains("src/\n  lib.rs"));
    }
}
