//! In-memory collection of documents with bulk frontmatter editing
//!
//! The store is rebuilt wholesale whenever a base directory is opened. Bulk
//! edits scan the whole collection, keep only documents whose relative path
//! matches a pattern, and mark every document they change as modified. The
//! `modified` flag is only cleared once the backend confirms a write.

use std::collections::BTreeMap;

use regex_lite::Regex;
use serde_json::Value;

use super::backend::{Backend, RestoreSummary};
use super::document::{Document, Frontmatter};
use super::error::{CoreError, StoreError};
use super::file_tree::{build_file_tree, TreeNode};
use super::relative_path::{normalize_separators, resolve};

/// Progress of the load pipeline, flipped forward once per load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadyFlags {
    pub selected_file: bool,
    pub file_list: bool,
    pub file_tree: bool,
    pub file_content: bool,
    pub exporting: bool,
}

/// Result of writing modified documents back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub written: usize,
    /// Absolute paths the backend failed to write; they stay modified
    pub failed: Vec<String>,
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern).map_err(|e| CoreError::InvalidPattern(e.to_string()))
}

/// The document collection keyed by absolute path, plus derived state
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    base_path: String,
    documents: BTreeMap<String, Document>,
    tree: Vec<TreeNode>,
    ready: ReadyFlags,
    selection: Option<String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn documents(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.documents.iter()
    }

    pub fn document(&self, absolute_path: &str) -> Option<&Document> {
        self.documents.get(absolute_path)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn ready(&self) -> ReadyFlags {
        self.ready
    }

    /// Flag an export as running; cleared again by [`Self::export_spreadsheet`]
    pub fn set_exporting(&mut self, exporting: bool) {
        self.ready.exporting = exporting;
    }

    pub fn list_absolute_paths(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Relative paths in the collection's key order
    pub fn list_relative_paths(&self) -> Vec<String> {
        self.documents
            .values()
            .map(|doc| doc.relative_path.clone())
            .collect()
    }

    pub fn modified_count(&self) -> usize {
        self.documents.values().filter(|doc| doc.modified).count()
    }

    pub fn modified_paths(&self) -> Vec<String> {
        self.documents
            .iter()
            .filter(|(_, doc)| doc.modified)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Select a document by relative path; existence is not checked
    pub fn set_selection(&mut self, relative_path: impl Into<String>) {
        self.selection = Some(relative_path.into());
        self.ready.selected_file = true;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.ready.selected_file = false;
    }

    pub fn selected_relative_path(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Base directory joined with the selected relative path
    pub fn selected_absolute_path(&self) -> Option<String> {
        let base = normalize_separators(&self.base_path);
        self.selection
            .as_ref()
            .map(|relative| format!("{}{}", base.trim_end_matches('/'), relative))
    }

    /// Absolute path and document of the current selection, if loaded
    pub fn selected_entry(&self) -> Option<(&String, &Document)> {
        let selected = self.selection.as_deref()?;
        self.documents
            .iter()
            .find(|(_, doc)| doc.relative_path == selected)
    }

    pub fn selected_document(&self) -> Option<&Document> {
        self.selected_entry().map(|(_, doc)| doc)
    }

    /// Take over the state of a copy that ran a background job.
    ///
    /// A selection made meanwhile survives when the base path is unchanged.
    pub fn adopt(&mut self, finished: DocumentStore) {
        let selection = if finished.base_path == self.base_path {
            self.selection.take()
        } else {
            None
        };
        *self = finished;
        if let Some(relative) = selection {
            self.set_selection(relative);
        }
    }

    /// Drop every document and start over at `base_path`
    fn reset(&mut self, base_path: &str) {
        self.base_path = base_path.to_string();
        self.documents.clear();
        self.tree.clear();
        self.ready = ReadyFlags::default();
        self.selection = None;
    }

    /// Rebuild the collection from frontmatter read under `base_path`.
    ///
    /// Nothing changes if any path lies outside the base directory.
    pub fn replace_documents(
        &mut self,
        base_path: &str,
        frontmatter: BTreeMap<String, Frontmatter>,
    ) -> Result<usize, CoreError> {
        let mut documents = BTreeMap::new();
        for (absolute, fm) in frontmatter {
            let relative = resolve(&absolute, base_path)?;
            documents.insert(absolute, Document::new(relative, fm));
        }

        self.reset(base_path);
        self.documents = documents;
        self.tree = build_file_tree(&self.list_relative_paths());
        self.ready.file_list = true;
        self.ready.file_tree = true;
        self.ready.file_content = true;
        Ok(self.documents.len())
    }

    /// Load every markdown file under `base_path` through `backend`
    pub async fn open_directory<B: Backend>(
        &mut self,
        backend: &B,
        base_path: &str,
    ) -> Result<usize, StoreError> {
        self.reset(base_path);

        let files = backend.list_files_under(base_path).await?;
        self.ready.file_list = true;
        tracing::info!("Found {} markdown files under {}", files.len(), base_path);

        let frontmatter = backend.read_many_frontmatter(&files).await?;
        let count = self.replace_documents(base_path, frontmatter)?;
        tracing::info!("Loaded {} documents", count);
        Ok(count)
    }

    /// Re-read one document from the backend, discarding unsaved changes
    pub async fn reload_document<B: Backend>(
        &mut self,
        backend: &B,
        absolute_path: &str,
    ) -> Result<(), StoreError> {
        let relative = resolve(absolute_path, &self.base_path)?;
        let frontmatter = backend.read_frontmatter(absolute_path).await?;
        let is_new = self
            .documents
            .insert(absolute_path.to_string(), Document::new(relative, frontmatter))
            .is_none();
        if is_new {
            self.tree = build_file_tree(&self.list_relative_paths());
        }
        Ok(())
    }

    /// Insert each absent key with `value` into matching documents.
    ///
    /// Existing keys are never overwritten. Returns the number of keys inserted.
    pub fn add_frontmatter_keys<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        value: &Value,
        pattern: &str,
    ) -> Result<usize, CoreError> {
        let regex = compile(pattern)?;
        let mut count = 0;

        for doc in self.documents.values_mut() {
            if !regex.is_match(&doc.relative_path) {
                continue;
            }
            for key in keys {
                let key = key.as_ref();
                if !doc.frontmatter.contains(key) {
                    doc.frontmatter.set(key, value.clone());
                    doc.modified = true;
                    count += 1;
                }
            }
        }

        tracing::debug!("Added {} keys for pattern {}", count, pattern);
        Ok(count)
    }

    /// Delete each present key from matching documents.
    ///
    /// Returns the number of keys removed.
    pub fn remove_frontmatter_keys<K: AsRef<str>>(
        &mut self,
        keys: &[K],
        pattern: &str,
    ) -> Result<usize, CoreError> {
        let regex = compile(pattern)?;
        let mut count = 0;

        for doc in self.documents.values_mut() {
            if !regex.is_match(&doc.relative_path) {
                continue;
            }
            for key in keys {
                if doc.frontmatter.remove(key.as_ref()).is_some() {
                    doc.modified = true;
                    count += 1;
                }
            }
        }

        tracing::debug!("Removed {} keys for pattern {}", count, pattern);
        Ok(count)
    }

    /// Fold `source_keys` into `target_key` on matching documents.
    ///
    /// The first present source fills an unset target; every source other
    /// than the target is deleted. An unset target ends up as `""`. Every
    /// matching document is counted and marked modified, changed or not.
    pub fn normalize_frontmatter_key<K: AsRef<str>>(
        &mut self,
        source_keys: &[K],
        target_key: &str,
        pattern: &str,
    ) -> Result<usize, CoreError> {
        let regex = compile(pattern)?;
        let mut count = 0;

        for doc in self.documents.values_mut() {
            if !regex.is_match(&doc.relative_path) {
                continue;
            }
            let fm = &mut doc.frontmatter;
            for key in source_keys {
                let key = key.as_ref();
                if key == target_key {
                    continue;
                }
                if let Some(value) = fm.remove(key) {
                    if !fm.contains(target_key) {
                        fm.set(target_key, value);
                    }
                }
            }
            if !fm.contains(target_key) {
                fm.set(target_key, Value::String(String::new()));
            }
            doc.modified = true;
            count += 1;
        }

        tracing::debug!("Normalized {} documents into {}", count, target_key);
        Ok(count)
    }

    /// Write every modified document back and clear the flag on success
    pub async fn save_modified<B: Backend>(&mut self, backend: &B) -> Result<SaveSummary, StoreError> {
        let pending: BTreeMap<String, Frontmatter> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.modified)
            .map(|(path, doc)| (path.clone(), doc.frontmatter.clone()))
            .collect();
        if pending.is_empty() {
            return Ok(SaveSummary::default());
        }

        let results = backend.write_frontmatter(&pending).await?;
        let mut summary = SaveSummary::default();
        for path in pending.keys() {
            let succeeded = results.get(path).copied().unwrap_or(false);
            match self.documents.get_mut(path) {
                Some(doc) if succeeded => {
                    doc.modified = false;
                    summary.written += 1;
                }
                _ => summary.failed.push(path.clone()),
            }
        }

        tracing::info!(
            "Saved {} documents, {} failed",
            summary.written,
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Frontmatter keyed by relative path, as handed to exports
    pub fn frontmatter_by_relative_path(&self) -> BTreeMap<String, Frontmatter> {
        self.documents
            .values()
            .map(|doc| (doc.relative_path.clone(), doc.frontmatter.clone()))
            .collect()
    }

    /// Export all frontmatter to a spreadsheet at `destination`
    pub async fn export_spreadsheet<B: Backend>(
        &mut self,
        backend: &B,
        destination: &str,
    ) -> Result<String, StoreError> {
        let data = self.frontmatter_by_relative_path();
        self.set_exporting(true);
        let result = backend.export_to_spreadsheet(&data, destination).await;
        self.set_exporting(false);
        Ok(result?)
    }

    /// Import a spreadsheet into the base directory and reload the collection
    pub async fn import_spreadsheet<B: Backend>(
        &mut self,
        backend: &B,
        source: &str,
    ) -> Result<String, StoreError> {
        let base_path = self.base_path.clone();
        let message = backend.import_from_spreadsheet(source, &base_path).await?;
        self.open_directory(backend, &base_path).await?;
        Ok(message)
    }

    /// Archive every document of the collection into `destination`
    pub async fn backup<B: Backend>(
        &self,
        backend: &B,
        destination: &str,
        compression_level: u32,
    ) -> Result<String, StoreError> {
        let paths = self.list_relative_paths();
        Ok(backend
            .archive_files(&paths, &self.base_path, destination, compression_level)
            .await?)
    }

    /// Restore an archive below `restore_base`
    pub async fn restore<B: Backend>(
        &self,
        backend: &B,
        archive: &str,
        restore_base: &str,
    ) -> Result<RestoreSummary, StoreError> {
        Ok(backend.restore_archive(archive, restore_base).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::BackendError;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Backend holding files in memory
    #[derive(Default)]
    struct MemoryBackend {
        files: Mutex<BTreeMap<String, Frontmatter>>,
        failing_writes: HashSet<String>,
        archived: Mutex<Vec<(Vec<String>, String, u32)>>,
    }

    impl MemoryBackend {
        fn with_files(files: &[(&str, Value)]) -> Self {
            let files = files
                .iter()
                .map(|(path, fm)| {
                    let fm = match fm {
                        Value::Object(map) => Frontmatter::from(map.clone()),
                        _ => Frontmatter::new(),
                    };
                    (path.to_string(), fm)
                })
                .collect();
            Self {
                files: Mutex::new(files),
                ..Default::default()
            }
        }
    }

    impl Backend for MemoryBackend {
        async fn list_files_under(&self, directory: &str) -> Result<Vec<String>, BackendError> {
            let files = self.files.lock().unwrap();
            Ok(files
                .keys()
                .filter(|path| path.starts_with(directory))
                .cloned()
                .collect())
        }

        async fn read_frontmatter(&self, path: &str) -> Result<Frontmatter, BackendError> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound).into())
        }

        async fn read_many_frontmatter(
            &self,
            paths: &[String],
        ) -> Result<BTreeMap<String, Frontmatter>, BackendError> {
            let files = self.files.lock().unwrap();
            Ok(paths
                .iter()
                .filter_map(|path| files.get(path).map(|fm| (path.clone(), fm.clone())))
                .collect())
        }

        async fn write_frontmatter(
            &self,
            data: &BTreeMap<String, Frontmatter>,
        ) -> Result<BTreeMap<String, bool>, BackendError> {
            let mut files = self.files.lock().unwrap();
            Ok(data
                .iter()
                .map(|(path, fm)| {
                    if self.failing_writes.contains(path) {
                        return (path.clone(), false);
                    }
                    files.insert(path.clone(), fm.clone());
                    (path.clone(), true)
                })
                .collect())
        }

        async fn export_to_spreadsheet(
            &self,
            _data: &BTreeMap<String, Frontmatter>,
            destination: &str,
        ) -> Result<String, BackendError> {
            if destination.is_empty() {
                return Err(BackendError::Format("no destination".to_string()));
            }
            Ok(destination.to_string())
        }

        async fn import_from_spreadsheet(
            &self,
            _source: &str,
            base_directory: &str,
        ) -> Result<String, BackendError> {
            let path = format!("{base_directory}/imported.md");
            let fm: Frontmatter = [("title".to_string(), json!("Imported"))].into_iter().collect();
            self.files.lock().unwrap().insert(path, fm);
            Ok("imported 1".to_string())
        }

        async fn archive_files(
            &self,
            paths: &[String],
            base_directory: &str,
            destination: &str,
            compression_level: u32,
        ) -> Result<String, BackendError> {
            self.archived.lock().unwrap().push((
                paths.to_vec(),
                base_directory.to_string(),
                compression_level,
            ));
            Ok(destination.to_string())
        }

        async fn restore_archive(
            &self,
            _archive: &str,
            _restore_base: &str,
        ) -> Result<RestoreSummary, BackendError> {
            Ok(RestoreSummary {
                success_count: 1,
                failed_count: 1,
                failed_paths: vec!["broken.md".to_string()],
            })
        }
    }

    fn store_with(docs: &[(&str, Value)]) -> DocumentStore {
        let mut store = DocumentStore::new();
        let frontmatter = docs
            .iter()
            .map(|(relative, fm)| {
                let fm = match fm {
                    Value::Object(map) => Frontmatter::from(map.clone()),
                    _ => Frontmatter::new(),
                };
                (format!("/blog{relative}"), fm)
            })
            .collect();
        store.replace_documents("/blog", frontmatter).unwrap();
        store
    }

    fn doc<'a>(store: &'a DocumentStore, relative: &str) -> &'a Document {
        store.document(&format!("/blog{relative}")).unwrap()
    }

    #[test]
    fn replace_documents_resolves_relative_paths_and_builds_tree() {
        let store = store_with(&[
            ("/posts/a.md", json!({})),
            ("/about.md", json!({})),
        ]);

        assert_eq!(store.list_absolute_paths(), ["/blog/about.md", "/blog/posts/a.md"]);
        assert_eq!(store.list_relative_paths(), ["/about.md", "/posts/a.md"]);
        assert_eq!(store.tree().len(), 2);
        assert!(store.tree()[0].is_file());
        assert!(store.ready().file_tree);
        assert!(!store.ready().selected_file);
    }

    #[test]
    fn replace_documents_rejects_paths_outside_base() {
        let mut store = store_with(&[("/a.md", json!({}))]);
        let mut outside = BTreeMap::new();
        outside.insert("/elsewhere/b.md".to_string(), Frontmatter::new());

        let err = store.replace_documents("/blog", outside).unwrap_err();
        assert!(matches!(err, CoreError::PathMismatch { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_keys_is_additive_and_idempotent() {
        let mut store = store_with(&[
            ("/a.md", json!({ "title": "A" })),
            ("/b.md", json!({ "draft": true })),
        ]);

        let first = store.add_frontmatter_keys(&["draft"], &json!(false), ".*").unwrap();
        assert_eq!(first, 1);
        assert_eq!(doc(&store, "/a.md").frontmatter.get("draft"), Some(&json!(false)));
        assert_eq!(doc(&store, "/b.md").frontmatter.get("draft"), Some(&json!(true)));
        assert!(doc(&store, "/a.md").modified);
        assert!(!doc(&store, "/b.md").modified);

        let snapshot = store.frontmatter_by_relative_path();
        let second = store.add_frontmatter_keys(&["draft"], &json!(false), ".*").unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.frontmatter_by_relative_path(), snapshot);
    }

    #[test]
    fn add_keys_counts_each_inserted_key() {
        let mut store = store_with(&[("/a.md", json!({})), ("/b.md", json!({ "tags": [] }))]);
        let count = store
            .add_frontmatter_keys(&["tags", "categories"], &json!([]), ".*")
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn remove_keys_is_idempotent_and_keeps_dirty_flags() {
        let mut store = store_with(&[
            ("/a.md", json!({ "draft": true, "title": "A" })),
            ("/b.md", json!({ "title": "B" })),
        ]);

        assert_eq!(store.remove_frontmatter_keys(&["draft"], ".*").unwrap(), 1);
        assert!(doc(&store, "/a.md").modified);
        assert!(!doc(&store, "/b.md").modified);

        assert_eq!(store.remove_frontmatter_keys(&["draft"], ".*").unwrap(), 0);
        assert!(doc(&store, "/a.md").modified);
        assert!(!doc(&store, "/b.md").modified);
    }

    #[test]
    fn normalize_keeps_first_source_value_and_removes_sources() {
        let mut store = store_with(&[("/a.md", json!({ "title": "A", "name": "A2" }))]);
        let count = store
            .normalize_frontmatter_key(&["title", "name"], "title", ".*")
            .unwrap();

        assert_eq!(count, 1);
        let expected: Frontmatter = [("title".to_string(), json!("A"))].into_iter().collect();
        assert_eq!(doc(&store, "/a.md").frontmatter, expected);
        assert!(doc(&store, "/a.md").modified);
    }

    #[test]
    fn normalize_moves_first_present_source_into_unset_target() {
        let mut store = store_with(&[("/a.md", json!({ "name": "N", "label": "L" }))]);
        store
            .normalize_frontmatter_key(&["name", "label"], "title", ".*")
            .unwrap();

        let expected: Frontmatter = [("title".to_string(), json!("N"))].into_iter().collect();
        assert_eq!(doc(&store, "/a.md").frontmatter, expected);
    }

    #[test]
    fn normalize_fills_missing_target_with_empty_string() {
        let mut store = store_with(&[("/a.md", json!({ "other": 1 }))]);
        let count = store
            .normalize_frontmatter_key(&["title", "name"], "title", ".*")
            .unwrap();

        assert_eq!(count, 1);
        let fm = &doc(&store, "/a.md").frontmatter;
        assert_eq!(fm.get("other"), Some(&json!(1)));
        assert_eq!(fm.get("title"), Some(&json!("")));
        assert_eq!(fm.len(), 2);
    }

    #[test]
    fn normalize_keeps_null_target_as_set() {
        let mut store = store_with(&[("/a.md", json!({ "title": null, "name": "N" }))]);
        store
            .normalize_frontmatter_key(&["name"], "title", ".*")
            .unwrap();

        let fm = &doc(&store, "/a.md").frontmatter;
        assert_eq!(fm.get("title"), Some(&Value::Null));
        assert!(!fm.contains("name"));
    }

    #[test]
    fn normalize_counts_matched_documents_even_when_unchanged() {
        let mut store = store_with(&[("/a.md", json!({ "title": "A" }))]);
        store
            .normalize_frontmatter_key(&["name"], "title", ".*")
            .unwrap();
        let before = store.frontmatter_by_relative_path();

        let count = store
            .normalize_frontmatter_key(&["name"], "title", ".*")
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.frontmatter_by_relative_path(), before);
    }

    #[test]
    fn pattern_limits_which_documents_are_touched() {
        let mut store = store_with(&[
            ("/posts/a.md", json!({})),
            ("/pages/b.md", json!({})),
        ]);

        assert_eq!(store.add_frontmatter_keys(&["draft"], &json!(true), "^/posts/").unwrap(), 1);
        assert!(doc(&store, "/posts/a.md").frontmatter.contains("draft"));
        assert!(!doc(&store, "/pages/b.md").frontmatter.contains("draft"));

        assert_eq!(store.add_frontmatter_keys(&["x"], &json!(1), "^/nothing").unwrap(), 0);
        assert_eq!(store.normalize_frontmatter_key(&["x"], "y", "^/nothing").unwrap(), 0);
        assert_eq!(store.remove_frontmatter_keys(&["draft"], "^/nothing").unwrap(), 0);
        assert!(!doc(&store, "/pages/b.md").modified);
    }

    #[test]
    fn invalid_pattern_fails_before_touching_documents() {
        let mut store = store_with(&[("/a.md", json!({}))]);
        let before = store.frontmatter_by_relative_path();

        for result in [
            store.add_frontmatter_keys(&["draft"], &json!(true), "(unclosed"),
            store.remove_frontmatter_keys(&["draft"], "(unclosed"),
            store.normalize_frontmatter_key(&["name"], "title", "(unclosed"),
        ] {
            assert!(matches!(result, Err(CoreError::InvalidPattern(_))));
        }
        assert_eq!(store.frontmatter_by_relative_path(), before);
        assert_eq!(store.modified_count(), 0);
    }

    #[test]
    fn selection_is_plain_assignment() {
        let mut store = store_with(&[("/posts/a.md", json!({ "title": "A" }))]);
        store.set_selection("/missing.md");
        assert_eq!(store.selected_relative_path(), Some("/missing.md"));
        assert!(store.selected_document().is_none());
        assert!(store.ready().selected_file);

        store.set_selection("/posts/a.md");
        assert_eq!(store.selected_absolute_path().as_deref(), Some("/blog/posts/a.md"));
        assert_eq!(store.selected_document().unwrap().relative_path, "/posts/a.md");

        store.clear_selection();
        assert_eq!(store.selected_relative_path(), None);
    }

    #[tokio::test]
    async fn open_directory_loads_documents_through_backend() {
        let backend = MemoryBackend::with_files(&[
            ("/site/posts/a.md", json!({ "title": "A" })),
            ("/site/b.md", json!({})),
            ("/other/c.md", json!({})),
        ]);
        let mut store = store_with(&[("/stale.md", json!({}))]);
        store.set_selection("/stale.md");

        let count = store.open_directory(&backend, "/site").await.unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.base_path(), "/site");
        assert_eq!(store.list_relative_paths(), ["/b.md", "/posts/a.md"]);
        assert_eq!(store.selected_relative_path(), None);
        let ready = store.ready();
        assert!(ready.file_list && ready.file_tree && ready.file_content);
        assert!(!ready.selected_file);
    }

    #[tokio::test]
    async fn save_clears_modified_only_for_successful_writes() {
        let mut backend = MemoryBackend::with_files(&[
            ("/site/a.md", json!({})),
            ("/site/b.md", json!({})),
            ("/site/c.md", json!({ "draft": true })),
        ]);
        backend.failing_writes.insert("/site/b.md".to_string());

        let mut store = DocumentStore::new();
        store.open_directory(&backend, "/site").await.unwrap();
        store.add_frontmatter_keys(&["draft"], &json!(false), ".*").unwrap();
        assert_eq!(store.modified_paths(), ["/site/a.md", "/site/b.md"]);

        let summary = store.save_modified(&backend).await.unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, ["/site/b.md"]);
        assert_eq!(store.modified_paths(), ["/site/b.md"]);

        let written = backend.read_frontmatter("/site/a.md").await.unwrap();
        assert_eq!(written.get("draft"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn copy_loads_in_background_while_the_shown_store_stays_readable() {
        let backend = MemoryBackend::with_files(&[("/site/a.md", json!({ "title": "A" }))]);
        let mut shown = DocumentStore::new();
        shown.open_directory(&backend, "/site").await.unwrap();
        shown.set_selection("/a.md");

        let job = tokio::spawn({
            let mut store = shown.clone();
            async move {
                let result = store.open_directory(&backend, "/site").await;
                (store, result)
            }
        });
        assert_eq!(shown.len(), 1);
        assert_eq!(shown.list_absolute_paths(), ["/site/a.md"]);

        let (loaded, result) = job.await.unwrap();
        assert_eq!(result.unwrap(), 1);
        assert_eq!(loaded.selected_relative_path(), None);

        shown.adopt(loaded);
        assert_eq!(shown.selected_relative_path(), Some("/a.md"));
        assert!(shown.ready().selected_file);

        let mut other = DocumentStore::new();
        other.replace_documents("/elsewhere", BTreeMap::new()).unwrap();
        shown.adopt(other);
        assert_eq!(shown.base_path(), "/elsewhere");
        assert_eq!(shown.selected_relative_path(), None);
    }

    #[tokio::test]
    async fn reload_document_discards_unsaved_changes() {
        let backend = MemoryBackend::with_files(&[("/site/a.md", json!({ "title": "A" }))]);
        let mut store = DocumentStore::new();
        store.open_directory(&backend, "/site").await.unwrap();
        store.remove_frontmatter_keys(&["title"], ".*").unwrap();
        store.set_selection("/a.md");
        assert_eq!(store.selected_entry().unwrap().0, "/site/a.md");

        store.reload_document(&backend, "/site/a.md").await.unwrap();
        let doc = store.document("/site/a.md").unwrap();
        assert!(!doc.modified);
        assert_eq!(doc.frontmatter.get("title"), Some(&json!("A")));

        let err = store.reload_document(&backend, "/other/b.md").await.unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::PathMismatch { .. })));
    }

    #[tokio::test]
    async fn save_without_changes_does_not_call_backend() {
        let backend = MemoryBackend::with_files(&[("/site/a.md", json!({}))]);
        let mut store = DocumentStore::new();
        store.open_directory(&backend, "/site").await.unwrap();

        assert_eq!(store.save_modified(&backend).await.unwrap(), SaveSummary::default());
    }

    #[tokio::test]
    async fn export_clears_exporting_flag_on_failure() {
        let backend = MemoryBackend::default();
        let mut store = store_with(&[("/a.md", json!({}))]);

        let err = store.export_spreadsheet(&backend, "").await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(BackendError::Format(_))));
        assert!(!store.ready().exporting);

        let destination = store.export_spreadsheet(&backend, "/tmp/out.xlsx").await.unwrap();
        assert_eq!(destination, "/tmp/out.xlsx");
        assert!(!store.ready().exporting);
    }

    #[tokio::test]
    async fn import_reloads_the_collection() {
        let backend = MemoryBackend::with_files(&[("/site/a.md", json!({}))]);
        let mut store = DocumentStore::new();
        store.open_directory(&backend, "/site").await.unwrap();

        let message = store.import_spreadsheet(&backend, "/tmp/in.xlsx").await.unwrap();
        assert_eq!(message, "imported 1");
        assert_eq!(store.list_relative_paths(), ["/a.md", "/imported.md"]);
    }

    #[tokio::test]
    async fn backup_archives_relative_paths_under_base() {
        let backend = MemoryBackend::with_files(&[("/site/posts/a.md", json!({}))]);
        let mut store = DocumentStore::new();
        store.open_directory(&backend, "/site").await.unwrap();

        let destination = store.backup(&backend, "/tmp/b.tar.gz", 6).await.unwrap();
        assert_eq!(destination, "/tmp/b.tar.gz");
        let archived = backend.archived.lock().unwrap();
        assert_eq!(
            archived[0],
            (vec!["/posts/a.md".to_string()], "/site".to_string(), 6)
        );

        let summary = store.restore(&backend, "/tmp/b.tar.gz", "/restore").await.unwrap();
        assert_eq!(summary.failed_paths, ["broken.md"]);
    }
}
