//! Scenario Store: reads the scenarios file and fixtures relative to a base
//! directory through a [`FileAccess`] collaborator.
//!
//! Nothing is cached. Every [`ScenarioStore::load`] re-reads the file so an
//! edit is visible on the very next request.

use async_trait::async_trait;
use bytes::Bytes;
use local_proxy_lint::{parse_scenario_file, ScenarioFile, ValidationError};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Read-only view of the filesystem used by the store.
#[async_trait]
pub trait FileAccess: Send + Sync {
    /// `Ok(false)` only when the path is known to be absent. A failed stat
    /// is an error, not a missing file.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    async fn read(&self, path: &Path) -> io::Result<Bytes>;
}

/// [`FileAccess`] over the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

#[async_trait]
impl FileAccess for LocalFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn read(&self, path: &Path) -> io::Result<Bytes> {
        tokio::fs::read(path).await.map(Bytes::from)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid JSON in {}: {source}", .path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid scenarios config in {}: {source}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone)]
pub struct ScenarioStore {
    fs: Arc<dyn FileAccess>,
    base_dir: PathBuf,
}

impl std::fmt::Debug for ScenarioStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioStore")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl ScenarioStore {
    pub fn new(fs: Arc<dyn FileAccess>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            base_dir: base_dir.into(),
        }
    }

    /// Store backed by the local disk.
    pub fn local(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(LocalFs), base_dir)
    }

    /// Resolve a path against the base directory. Absolute paths are kept.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Load and validate the scenarios file.
    ///
    /// A missing or blank file is not an error: it yields an empty
    /// [`ScenarioFile`], meaning nothing is mocked.
    pub async fn load(&self, relative: impl AsRef<Path>) -> Result<ScenarioFile, StoreError> {
        let path = self.resolve(relative);
        let Some(bytes) = self.read_if_present(&path).await? else {
            debug!("No scenarios file at {}, nothing is mocked", path.display());
            return Ok(ScenarioFile::default());
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ScenarioFile::default());
        }

        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(source) => return Err(StoreError::MalformedConfig { path, source }),
        };

        parse_scenario_file(&value).map_err(|source| StoreError::InvalidConfig { path, source })
    }

    /// Raw bytes of a fixture file, or `None` when it does not exist.
    pub async fn fixture(&self, relative: impl AsRef<Path>) -> Result<Option<Bytes>, StoreError> {
        let path = self.resolve(relative);
        self.read_if_present(&path).await
    }

    async fn read_if_present(&self, path: &Path) -> Result<Option<Bytes>, StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if !self.fs.exists(path).await.map_err(io_error)? {
            return Ok(None);
        }
        match self.fs.read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            // Removed between the existence check and the read.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(source)),
        }
    }
}

/// In-memory [`FileAccess`] for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryFs {
    files: std::sync::Mutex<std::collections::HashMap<PathBuf, Bytes>>,
}

#[cfg(test)]
impl MemoryFs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Bytes>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.into());
    }

    pub(crate) fn remove(&self, path: impl AsRef<Path>) {
        self.files.lock().unwrap().remove(path.as_ref());
    }
}

#[cfg(test)]
#[async_trait]
impl FileAccess for MemoryFs {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &Path) -> io::Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "/project";

    fn memory_store() -> (Arc<MemoryFs>, ScenarioStore) {
        let fs = Arc::new(MemoryFs::new());
        let store = ScenarioStore::new(fs.clone(), BASE);
        (fs, store)
    }

    const ONE_RULE: &str = r#"{
        "rules": [{
            "method": "GET",
            "match": "/test",
            "enabled": true,
            "active_scenario": "success",
            "scenarios": { "success": { "status": 200, "json": { "ok": true } } }
        }]
    }"#;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let (_fs, store) = memory_store();
        let file = store.load("scenarios.json").await.unwrap();
        assert!(file.is_empty());
    }

    #[tokio::test]
    async fn test_blank_file_is_empty() {
        let (fs, store) = memory_store();
        fs.insert("/project/scenarios.json", " \n\t");
        assert!(store.load("scenarios.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rules_key_absent_is_empty() {
        let (fs, store) = memory_store();
        fs.insert("/project/scenarios.json", "{}");
        assert!(store.load("scenarios.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_valid_file() {
        let (fs, store) = memory_store();
        fs.insert("/project/scenarios.json", ONE_RULE);

        let file = store.load("scenarios.json").await.unwrap();
        assert_eq!(file.rules.len(), 1);
        assert_eq!(file.rules[0].active_scenario, "success");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (fs, store) = memory_store();
        fs.insert("/project/scenarios.json", "{ not json");

        let err = store.load("scenarios.json").await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedConfig { .. }));
        assert!(err
            .to_string()
            .starts_with("Invalid JSON in /project/scenarios.json"));
    }

    #[tokio::test]
    async fn test_invalid_config_lists_every_violation() {
        let (fs, store) = memory_store();
        fs.insert(
            "/project/scenarios.json",
            r#"{"rules": [{
                "method": "FETCH",
                "match": "/a",
                "enabled": true,
                "active_scenario": "ok",
                "scenarios": { "ok": { "status": 700, "json": {} } }
            }]}"#,
        );

        let err = store.load("scenarios.json").await.unwrap_err();
        let StoreError::InvalidConfig { source, .. } = &err else {
            panic!("expected InvalidConfig, got {err:?}");
        };
        assert_eq!(source.violations.len(), 2);
        assert!(source.has_violation_at("rules.0.method"));
        assert!(source.has_violation_at("rules.0.scenarios.ok.status"));
        assert!(err.to_string().contains("rules.0.method"));
    }

    #[tokio::test]
    async fn test_reload_sees_edits() {
        let (fs, store) = memory_store();
        fs.insert("/project/scenarios.json", ONE_RULE);
        assert_eq!(store.load("scenarios.json").await.unwrap().rules.len(), 1);

        fs.remove("/project/scenarios.json");
        assert!(store.load("scenarios.json").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_present_and_absent() {
        let (fs, store) = memory_store();
        fs.insert("/project/fixtures/data.json", r#"{"id": 1}"#);

        let bytes = store.fixture("fixtures/data.json").await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&br#"{"id": 1}"#[..]));
        assert!(store.fixture("fixtures/other.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_fs_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("fixtures")).unwrap();
        std::fs::write(dir.path().join("scenarios.json"), ONE_RULE).unwrap();
        std::fs::write(dir.path().join("fixtures/user.json"), "[1,2]").unwrap();

        let store = ScenarioStore::local(dir.path());
        assert_eq!(store.load("scenarios.json").await.unwrap().rules.len(), 1);
        assert_eq!(
            store.fixture("fixtures/user.json").await.unwrap().as_deref(),
            Some(&b"[1,2]"[..])
        );
        assert!(store.fixture("fixtures/none.json").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_path_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file.
        std::fs::create_dir(dir.path().join("scenarios.json")).unwrap();

        let store = ScenarioStore::local(dir.path());
        let err = store.load("scenarios.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_loop_is_not_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let looped = dir.path().join("scenarios.json");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();

        let store = ScenarioStore::local(dir.path());
        let err = store.load("scenarios.json").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        std::os::unix::fs::symlink("loop.json", dir.path().join("loop.json")).unwrap();
        let err = store.fixture("loop.json").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
