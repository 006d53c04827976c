use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use common::error::AppError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

const SNIFF_BYTES: u64 = 1024;

const IGNORED_DIRS: [&str; 11] = [
    ".git",
    "node_modules",
    "venv",
    "__pycache__",
    "dist",
    "build",
    ".idea",
    ".vscode",
    "target",
    "logs",
    "docs",
];

const IGNORED_DIR_SUFFIXES: [&str; 1] = [".egg-info"];

const IGNORED_EXTENSIONS: [&str; 17] = [
    "lock",
    "log",
    "svg",
    "png",
    "jpg",
    "ico",
    "gif",
    "pdf",
    "zip",
    "exe",
    "dll",
    "so",
    "pyc",
    "env",
    "db",
    "safetensors",
    "pt",
];

const IGNORED_FILE_NAMES: [&str; 9] = [
    "__init__.py",
    "setup.py",
    "manage.py",
    "config.py",
    "requirements.txt",
    "package.json",
    "Dockerfile",
    ".gitignore",
    "LICENSE",
];

/// One file selected for documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzableUnit {
    /// Forward-slash path relative to the working tree root.
    pub path: String,
    /// Absolute location on disk.
    pub location: PathBuf,
    pub size: u64,
}

/// Rules deciding which files of a working tree get documented.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    max_file_bytes: u64,
    extra_ignores: GlobSet,
}

impl FilterPolicy {
    pub fn new(max_file_bytes: u64, extra_patterns: &[String]) -> Result<Self, AppError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in extra_patterns {
            let glob = Glob::new(pattern).map_err(|e| {
                AppError::Validation(format!("invalid ignore pattern {pattern}: {e}"))
            })?;
            builder.add(glob);
        }
        let extra_ignores = builder
            .build()
            .map_err(|e| AppError::Validation(format!("invalid ignore patterns: {e}")))?;

        Ok(Self {
            max_file_bytes,
            extra_ignores,
        })
    }

    fn skips_dir(&self, name: &str, relative: &str) -> bool {
        IGNORED_DIRS.contains(&name)
            || IGNORED_DIR_SUFFIXES
                .iter()
                .any(|suffix| name.ends_with(suffix))
            || self.extra_ignores.is_match(relative)
    }

    fn skips_file_name(&self, name: &str, relative: &str) -> bool {
        if IGNORED_FILE_NAMES.contains(&name) || name.starts_with('.') {
            return true;
        }
        if name.starts_with("test_") || name.ends_with("_test.py") {
            return true;
        }
        let ignored_extension = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        ignored_extension || self.extra_ignores.is_match(relative)
    }
}

impl Default for FilterPolicy {
    fn default() -> Self {
        Self {
            max_file_bytes: 100 * 1024,
            extra_ignores: GlobSet::empty(),
        }
    }
}

/// Walks a working tree and returns the files worth documenting, ordered by path.
///
/// Blocking; run it on the blocking pool.
pub fn filter_units(root: &Path, policy: &FilterPolicy) -> Result<Vec<AnalyzableUnit>, AppError> {
    let metadata = std::fs::metadata(root)
        .map_err(|e| AppError::Filter(format!("cannot read working tree: {e}")))?;
    if !metadata.is_dir() {
        return Err(AppError::Filter(format!(
            "working tree root is not a directory: {}",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let relative = relative_path(root, entry.path());
            !policy.skips_dir(&entry.file_name().to_string_lossy(), &relative)
        });

    let mut units = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(AppError::Filter(format!("cannot read working tree: {err}")));
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if let Some(unit) = inspect_entry(root, &entry, policy) {
            units.push(unit);
        }
    }

    units.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(units)
}

fn inspect_entry(root: &Path, entry: &DirEntry, policy: &FilterPolicy) -> Option<AnalyzableUnit> {
    // Symlinks report their own type since links are not followed.
    if !entry.file_type().is_file() {
        return None;
    }

    let relative = relative_path(root, entry.path());
    let name = entry.file_name().to_string_lossy();
    if policy.skips_file_name(&name, &relative) {
        trace!(path = %relative, "excluded by name");
        return None;
    }

    let size = entry.metadata().ok()?.len();
    if size > policy.max_file_bytes {
        debug!(path = %relative, size, "skipping large file");
        return None;
    }

    if !looks_like_text(entry.path()) {
        trace!(path = %relative, "skipping binary file");
        return None;
    }

    Some(AnalyzableUnit {
        path: relative,
        location: entry.path().to_path_buf(),
        size,
    })
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// NUL bytes or invalid UTF-8 in the leading bytes mark a file as binary.
fn looks_like_text(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut chunk = Vec::new();
    if file.take(SNIFF_BYTES).read_to_end(&mut chunk).is_err() {
        return false;
    }
    if chunk.contains(&0) {
        return false;
    }
    match std::str::from_utf8(&chunk) {
        Ok(_) => true,
        // A multi-byte character cut off by the sniff window is still text.
        Err(err) => err.error_len().is_none(),
    }
}
