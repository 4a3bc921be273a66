//! Storage backend the document store talks to
//!
//! The store never touches the disk itself. Everything that reads, writes,
//! exports or archives files goes through [`Backend`]; errors come back
//! unchanged.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::archive;
use super::document::Frontmatter;
use super::error::BackendError;
use super::frontmatter;
use super::spreadsheet;

/// Extension of the files the local backend picks up
pub const MARKDOWN_EXTENSION: &str = "md";

/// Outcome of restoring a backup archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreSummary {
    pub success_count: usize,
    pub failed_count: usize,
    pub failed_paths: Vec<String>,
}

/// Operations provided by the native side of the application
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Absolute paths of every markdown file below `directory`
    async fn list_files_under(&self, directory: &str) -> Result<Vec<String>, BackendError>;

    async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter, BackendError>;

    /// Batched read keyed by absolute path
    async fn read_many_frontmatter(
        &self,
        paths: &[String],
    ) -> Result<BTreeMap<String, Frontmatter>, BackendError>;

    /// Write frontmatter blocks, reporting success per absolute path
    async fn write_frontmatter(
        &self,
        data: &BTreeMap<String, Frontmatter>,
    ) -> Result<BTreeMap<String, bool>, BackendError>;

    /// Export relative path -> frontmatter; returns the destination
    async fn export_to_spreadsheet(
        &self,
        data: &BTreeMap<String, Frontmatter>,
        destination: &str,
    ) -> Result<String, BackendError>;

    /// Import a sheet into files under `base_directory`; returns a status message
    async fn import_from_spreadsheet(
        &self,
        source: &str,
        base_directory: &str,
    ) -> Result<String, BackendError>;

    /// Archive `paths` (relative to `base_directory`); returns the destination
    async fn archive_files(
        &self,
        paths: &[String],
        base_directory: &str,
        destination: &str,
        compression_level: u32,
    ) -> Result<String, BackendError>;

    async fn restore_archive(
        &self,
        archive: &str,
        restore_base: &str,
    ) -> Result<RestoreSummary, BackendError>;
}

/// Backend working directly on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }
}

fn list_markdown_files(directory: &str) -> Vec<String> {
    WalkDir::new(directory)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == MARKDOWN_EXTENSION)
                .unwrap_or(false)
        })
        .map(|e| e.path().to_string_lossy().to_string())
        .collect()
}

impl Backend for LocalBackend {
    async fn list_files_under(&self, directory: &str) -> Result<Vec<String>, BackendError> {
        let directory = directory.to_string();
        Ok(tokio::task::spawn_blocking(move || list_markdown_files(&directory)).await?)
    }

    async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter, BackendError> {
        let path = PathBuf::from(path);
        tokio::task::spawn_blocking(move || frontmatter::read_file(&path)).await?
    }

    async fn read_many_frontmatter(
        &self,
        paths: &[String],
    ) -> Result<BTreeMap<String, Frontmatter>, BackendError> {
        let paths = paths.to_vec();
        let parsed = tokio::task::spawn_blocking(move || {
            let mut parsed = BTreeMap::new();
            for path in paths {
                match frontmatter::read_file(path.as_ref()) {
                    Ok(fm) => {
                        parsed.insert(path, fm);
                    }
                    Err(err) => tracing::warn!("Skipping {}: {}", path, err),
                }
            }
            parsed
        })
        .await?;
        Ok(parsed)
    }

    async fn write_frontmatter(
        &self,
        data: &BTreeMap<String, Frontmatter>,
    ) -> Result<BTreeMap<String, bool>, BackendError> {
        let data = data.clone();
        let results: BTreeMap<String, bool> = tokio::task::spawn_blocking(move || {
            data.iter()
                .map(|(path, fm)| {
                    let result = frontmatter::write_file(path.as_ref(), fm);
                    if let Err(ref err) = result {
                        tracing::warn!("Failed to write frontmatter to {}: {}", path, err);
                    }
                    (path.clone(), result.is_ok())
                })
                .collect()
        })
        .await?;
        Ok(results)
    }

    async fn export_to_spreadsheet(
        &self,
        data: &BTreeMap<String, Frontmatter>,
        destination: &str,
    ) -> Result<String, BackendError> {
        let data = data.clone();
        let destination = destination.to_string();
        tokio::task::spawn_blocking(move || -> Result<String, BackendError> {
            spreadsheet::export(&data, destination.as_ref())?;
            tracing::info!("Exported {} documents to {}", data.len(), destination);
            Ok(destination)
        })
        .await?
    }

    async fn import_from_spreadsheet(
        &self,
        source: &str,
        base_directory: &str,
    ) -> Result<String, BackendError> {
        let source = PathBuf::from(source);
        let base = PathBuf::from(base_directory);
        tokio::task::spawn_blocking(move || spreadsheet::import(&source, &base)).await?
    }

    async fn archive_files(
        &self,
        paths: &[String],
        base_directory: &str,
        destination: &str,
        compression_level: u32,
    ) -> Result<String, BackendError> {
        let paths = paths.to_vec();
        let base = PathBuf::from(base_directory);
        let destination = destination.to_string();
        tokio::task::spawn_blocking(move || -> Result<String, BackendError> {
            archive::create(&paths, &base, destination.as_ref(), compression_level)?;
            tracing::info!("Archived {} files to {}", paths.len(), destination);
            Ok(destination)
        })
        .await?
    }

    async fn restore_archive(
        &self,
        archive: &str,
        restore_base: &str,
    ) -> Result<RestoreSummary, BackendError> {
        let archive_path = PathBuf::from(archive);
        let base = PathBuf::from(restore_base);
        tokio::task::spawn_blocking(move || archive::restore(&archive_path, &base)).await?
    }
}
