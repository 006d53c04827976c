use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use common::error::AppError;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

/// Remote transports only; `file://` would let submitters read repositories on the host.
const ALLOWED_SCHEMES: [&str; 4] = ["https", "http", "ssh", "git"];

#[derive(Debug, Error)]
#[error("{reason}")]
pub struct FetchError {
    pub reason: String,
}

impl FetchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        AppError::Fetch(err.reason)
    }
}

/// Local copy of a fetched repository.
///
/// The directory is removed when the tree is dropped, including when the
/// owning job is cancelled mid-flight.
#[derive(Debug)]
pub struct WorkingTree {
    dir: TempDir,
    root: PathBuf,
}

impl WorkingTree {
    /// Wraps a temporary directory whose contents are the repository itself.
    pub fn new(dir: TempDir) -> Self {
        let root = dir.path().to_path_buf();
        Self { dir, root }
    }

    /// Wraps a temporary directory that holds the repository at `root`.
    pub fn with_root(dir: TempDir, root: PathBuf) -> Self {
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes the tree now and reports failures instead of swallowing them.
    pub fn remove(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<WorkingTree, FetchError>;
}

/// Validates a user supplied locator and turns it into something `git clone` accepts.
///
/// Bare `host/owner/repo` forms are treated as https. scp-style `user@host:path`
/// locators pass through untouched.
pub fn normalize_locator(raw: &str) -> Result<String, FetchError> {
    let locator = raw.trim();
    if locator.is_empty() {
        return Err(FetchError::new("repository locator is empty"));
    }
    if locator.starts_with('-') || locator.chars().any(char::is_whitespace) {
        return Err(FetchError::new(format!(
            "malformed repository locator: {locator}"
        )));
    }

    if !locator.contains("://") && is_scp_like(locator) {
        return Ok(locator.to_string());
    }

    let candidate = if locator.contains("://") {
        locator.to_string()
    } else {
        format!("https://{locator}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| FetchError::new(format!("malformed repository locator {locator}: {e}")))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(FetchError::new(format!(
            "unsupported locator scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::new(format!(
            "repository locator has no host: {locator}"
        )));
    }

    Ok(url.to_string())
}

fn is_scp_like(locator: &str) -> bool {
    let Some((user_host, path)) = locator.split_once(':') else {
        return false;
    };
    user_host.contains('@') && !user_host.contains('/') && !path.is_empty()
}

/// Shallow clones repositories with the system `git` binary.
pub struct GitFetcher {
    git_binary: String,
    work_dir: Option<PathBuf>,
}

impl GitFetcher {
    pub fn new(git_binary: impl Into<String>, work_dir: Option<PathBuf>) -> Self {
        Self {
            git_binary: git_binary.into(),
            work_dir,
        }
    }

    async fn create_tempdir(&self) -> Result<TempDir, FetchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("repo-doc-");
        let dir = match &self.work_dir {
            Some(parent) => {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    FetchError::new(format!("could not prepare working directory: {e}"))
                })?;
                builder.tempdir_in(parent)
            }
            None => builder.tempdir(),
        };
        dir.map_err(|e| FetchError::new(format!("could not create working directory: {e}")))
    }
}

#[async_trait]
impl RepositoryFetcher for GitFetcher {
    #[tracing::instrument(skip_all, fields(locator = %locator))]
    async fn fetch(&self, locator: &str) -> Result<WorkingTree, FetchError> {
        let normalized = normalize_locator(locator)?;
        let dir = self.create_tempdir().await?;
        let target = dir.path().join("repo");

        debug!(locator = %normalized, target = %target.display(), "cloning repository");

        let output = Command::new(&self.git_binary)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg("--")
            .arg(&normalized)
            .arg(&target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| FetchError::new(format!("could not run {}: {e}", self.git_binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::new(clone_failure_reason(&stderr)));
        }

        info!(locator = %normalized, "repository cloned");
        Ok(WorkingTree::with_root(dir, target))
    }
}

fn clone_failure_reason(stderr: &str) -> String {
    stderr
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("fatal:").trim().to_string())
        .unwrap_or_else(|| "git clone failed".to_string())
}
