use std::io::{Cursor, Write};

use bytes::Bytes;
use common::{
    error::AppError,
    storage::{
        store::StorageManager,
        types::job::{ArtifactRef, JobId},
    },
};
use tracing::info;
use zip::{
    write::{SimpleFileOptions, ZipWriter},
    CompressionMethod, DateTime,
};

use crate::pipeline::Fragment;

pub const OVERVIEW_ENTRY: &str = "_PROJECT_OVERVIEW.md";
pub const INDEX_ENTRY: &str = "_INDEX.md";
/// Per-file docs live under this directory so repository paths never shadow
/// the top-level entries.
pub const FILES_DIR: &str = "files";

const EMPTY_INDEX_LINE: &str = "No files were selected for documentation.";

/// Archive path of the Markdown file documenting `unit_path`.
pub fn doc_path(unit_path: &str) -> String {
    format!("{FILES_DIR}/{unit_path}.md")
}

/// Builds the documentation archive in memory.
///
/// Output depends only on the inputs: entries follow fragment order and carry a
/// fixed timestamp and mode.
pub fn build_archive(fragments: &[Fragment], overview: Option<&str>) -> Result<Vec<u8>, AppError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    add_entry(&mut writer, INDEX_ENTRY, &render_index(fragments), options)?;
    if let Some(overview) = overview {
        add_entry(&mut writer, OVERVIEW_ENTRY, overview, options)?;
    }
    for fragment in fragments {
        add_entry(&mut writer, &doc_path(&fragment.path), &fragment.text, options)?;
    }

    let cursor = writer.finish().map_err(packaging_error)?;
    Ok(cursor.into_inner())
}

fn add_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    name: &str,
    contents: &str,
    options: SimpleFileOptions,
) -> Result<(), AppError> {
    writer.start_file(name, options).map_err(packaging_error)?;
    writer
        .write_all(contents.as_bytes())
        .map_err(packaging_error)
}

fn render_index(fragments: &[Fragment]) -> String {
    let mut index = String::from("# Documentation Index\n\n");
    if fragments.is_empty() {
        index.push_str(EMPTY_INDEX_LINE);
        index.push('\n');
        return index;
    }
    for fragment in fragments {
        let marker = if fragment.placeholder {
            " (not generated)"
        } else {
            ""
        };
        index.push_str(&format!(
            "- [{}]({}){marker}\n",
            fragment.path,
            doc_path(&fragment.path)
        ));
    }
    index
}

fn packaging_error(err: impl std::fmt::Display) -> AppError {
    AppError::Packaging(err.to_string())
}

/// Writes finished archives to artifact storage.
#[derive(Clone)]
pub struct Packager {
    storage: StorageManager,
}

impl Packager {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }

    pub async fn package(
        &self,
        job_id: JobId,
        fragments: Vec<Fragment>,
        overview: Option<String>,
    ) -> Result<ArtifactRef, AppError> {
        let fragment_count = fragments.len();
        let archive =
            tokio::task::spawn_blocking(move || build_archive(&fragments, overview.as_deref()))
                .await??;
        let size = archive.len();

        let artifact = ArtifactRef::for_job(job_id);
        self.storage
            .put(&artifact.location, Bytes::from(archive))
            .await
            .map_err(packaging_error)?;

        info!(
            %job_id,
            artifact = %artifact.name,
            fragment_count,
            size_bytes = size,
            "documentation archive stored"
        );
        Ok(artifact)
    }

    /// Removes whatever archive was stored for `job_id`, if any.
    pub async fn discard(&self, job_id: JobId) -> Result<(), AppError> {
        let artifact = ArtifactRef::for_job(job_id);
        self.storage.delete(&artifact.location).await?;
        Ok(())
    }
}
