//! Scoped access to the configured search directory.
//!
//! A `PersistedBookmark` is what the preferences store keeps between runs.
//! `SecureDirectoryAccessor::resolve` turns it into a `DirectoryHandle`,
//! repairing and re-persisting it when it has gone stale. Read access is
//! granted per search through `AccessGuard`, which releases on drop so every
//! exit path of a search ends the access it began.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::preferences::PreferencesStore;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Search directory bookmark is empty")]
    EmptyBookmark,

    #[error("Could not resolve search directory '{path}': {source}")]
    Unresolvable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is not a readable directory")]
    Invalid(PathBuf),

    #[error("Access to '{0}' was denied")]
    Denied(PathBuf),
}

/// Persistable reference to a directory.
///
/// `path` is what the user picked; `resolved` is the canonical location it
/// pointed to when the bookmark was last refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBookmark {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<PathBuf>,
}

impl PersistedBookmark {
    /// Create a bookmark for a directory the user just picked.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, AccessError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(AccessError::EmptyBookmark);
        }
        let resolved = fs::canonicalize(&path).map_err(|source| AccessError::Unresolvable {
            path: path.clone(),
            source,
        })?;
        if !resolved.is_dir() {
            return Err(AccessError::Invalid(resolved));
        }
        Ok(Self {
            path,
            resolved: Some(resolved),
        })
    }
}

/// A resolved, usable directory reference. Only the accessor creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryHandle {
    path: PathBuf,
}

impl DirectoryHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Grants and releases read permission on a directory.
pub trait ScopeProvider {
    /// Returns false when access is denied.
    fn begin(&self, path: &Path) -> bool;
    fn end(&self, path: &Path);
}

/// Filesystem permissions are the only scope on platforms without sandbox
/// bookmarks: access is granted when the directory can be listed.
#[derive(Debug, Default)]
pub struct FsScope;

impl ScopeProvider for FsScope {
    fn begin(&self, path: &Path) -> bool {
        match fs::read_dir(path) {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Directory access denied");
                false
            }
        }
    }

    fn end(&self, path: &Path) {
        debug!(path = %path.display(), "Directory access released");
    }
}

pub struct SecureDirectoryAccessor {
    scope: Box<dyn ScopeProvider>,
}

impl Default for SecureDirectoryAccessor {
    fn default() -> Self {
        Self::new(Box::new(FsScope))
    }
}

impl SecureDirectoryAccessor {
    pub fn new(scope: Box<dyn ScopeProvider>) -> Self {
        Self { scope }
    }

    /// Resolve a persisted bookmark, re-persisting it through `store` if stale.
    pub fn resolve(
        &self,
        bookmark: &PersistedBookmark,
        store: &mut dyn PreferencesStore,
    ) -> Result<DirectoryHandle, AccessError> {
        if bookmark.path.as_os_str().is_empty() {
            return Err(AccessError::EmptyBookmark);
        }

        let (current, refreshed) = match fs::canonicalize(&bookmark.path) {
            Ok(canonical) => {
                let stale = bookmark.resolved.as_deref() != Some(canonical.as_path());
                let refreshed = stale.then(|| PersistedBookmark {
                    path: bookmark.path.clone(),
                    resolved: Some(canonical.clone()),
                });
                (canonical, refreshed)
            }
            Err(source) => {
                // The picked path is gone; fall back to where it last pointed.
                let fallback = bookmark
                    .resolved
                    .as_deref()
                    .and_then(|r| fs::canonicalize(r).ok());
                match fallback {
                    Some(canonical) => {
                        let refreshed = PersistedBookmark {
                            path: canonical.clone(),
                            resolved: Some(canonical.clone()),
                        };
                        (canonical, Some(refreshed))
                    }
                    None => {
                        return Err(AccessError::Unresolvable {
                            path: bookmark.path.clone(),
                            source,
                        })
                    }
                }
            }
        };

        if let Some(refreshed) = refreshed {
            info!(
                old = %bookmark.path.display(),
                new = %current.display(),
                "Search directory bookmark was stale, re-persisting"
            );
            store.save_search_directory_bookmark(refreshed);
        }

        Ok(DirectoryHandle { path: current })
    }

    /// The path exists, is a directory and can be listed.
    pub fn validate(&self, handle: &DirectoryHandle) -> bool {
        let path = handle.path();
        let is_dir = fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        is_dir && fs::read_dir(path).is_ok()
    }

    pub fn begin_access(&self, handle: &DirectoryHandle) -> bool {
        self.scope.begin(handle.path())
    }

    pub fn end_access(&self, handle: &DirectoryHandle) {
        self.scope.end(handle.path())
    }

    /// Begin access and return a guard that ends it when dropped.
    pub fn open<'a>(&'a self, handle: &'a DirectoryHandle) -> Result<AccessGuard<'a>, AccessError> {
        if !self.begin_access(handle) {
            return Err(AccessError::Denied(handle.path().to_path_buf()));
        }
        Ok(AccessGuard {
            accessor: self,
            handle,
        })
    }
}

/// Live read access to a directory; released on drop.
pub struct AccessGuard<'a> {
    accessor: &'a SecureDirectoryAccessor,
    handle: &'a DirectoryHandle,
}

impl AccessGuard<'_> {
    pub fn handle(&self) -> &DirectoryHandle {
        self.handle
    }
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.accessor.end_access(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::test_support::MemoryPreferences;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct CountingScope {
        begins: Arc<AtomicUsize>,
        ends: Arc<AtomicUsize>,
        deny: bool,
    }

    impl ScopeProvider for CountingScope {
        fn begin(&self, _path: &Path) -> bool {
            self.begins.fetch_add(1, Ordering::SeqCst);
            !self.deny
        }

        fn end(&self, _path: &Path) {
            self.ends.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn create_requires_existing_directory() {
        let dir = tempdir().unwrap();
        let bookmark = PersistedBookmark::create(dir.path()).unwrap();
        assert_eq!(bookmark.path, dir.path());
        assert!(bookmark.resolved.is_some());

        let missing = dir.path().join("missing");
        assert!(matches!(
            PersistedBookmark::create(&missing),
            Err(AccessError::Unresolvable { .. })
        ));

        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            PersistedBookmark::create(&file),
            Err(AccessError::Invalid(_))
        ));

        assert!(matches!(
            PersistedBookmark::create(""),
            Err(AccessError::EmptyBookmark)
        ));
    }

    #[test]
    fn fresh_bookmark_resolves_without_repersisting() {
        let dir = tempdir().unwrap();
        let bookmark = PersistedBookmark::create(dir.path()).unwrap();
        let mut store = MemoryPreferences::default();

        let handle = SecureDirectoryAccessor::default()
            .resolve(&bookmark, &mut store)
            .unwrap();
        assert_eq!(handle.path(), fs::canonicalize(dir.path()).unwrap());
        assert_eq!(store.saves, 0);
    }

    #[test]
    fn stale_bookmark_is_repersisted() {
        let dir = tempdir().unwrap();
        let bookmark = PersistedBookmark {
            path: dir.path().to_path_buf(),
            resolved: None,
        };
        let mut store = MemoryPreferences::default();

        let handle = SecureDirectoryAccessor::default()
            .resolve(&bookmark, &mut store)
            .unwrap();
        assert_eq!(store.saves, 1);
        let saved = store.bookmark.clone().unwrap();
        assert_eq!(saved.resolved.as_deref(), Some(handle.path()));
    }

    #[cfg(unix)]
    #[test]
    fn removed_link_falls_back_to_last_resolved() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let bookmark = PersistedBookmark::create(&link).unwrap();
        fs::remove_file(&link).unwrap();

        let mut store = MemoryPreferences::default();
        let handle = SecureDirectoryAccessor::default()
            .resolve(&bookmark, &mut store)
            .unwrap();
        let canonical_target = fs::canonicalize(&target).unwrap();
        assert_eq!(handle.path(), canonical_target);
        assert_eq!(store.bookmark.unwrap().path, canonical_target);
    }

    #[test]
    fn unresolvable_bookmark_is_an_error() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");
        let bookmark = PersistedBookmark {
            path: gone.clone(),
            resolved: Some(gone),
        };
        let mut store = MemoryPreferences::default();
        let result = SecureDirectoryAccessor::default().resolve(&bookmark, &mut store);
        assert!(matches!(result, Err(AccessError::Unresolvable { .. })));
        assert_eq!(store.saves, 0);
    }

    #[test]
    fn validate_rejects_removed_directory() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        let mut store = MemoryPreferences::default();
        let accessor = SecureDirectoryAccessor::default();
        let handle = accessor
            .resolve(&PersistedBookmark::create(&sub).unwrap(), &mut store)
            .unwrap();

        assert!(accessor.validate(&handle));
        fs::remove_dir(&sub).unwrap();
        assert!(!accessor.validate(&handle));
    }

    #[test]
    fn guard_ends_access_exactly_once() {
        let dir = tempdir().unwrap();
        let scope = CountingScope::default();
        let accessor = SecureDirectoryAccessor::new(Box::new(scope.clone()));
        let mut store = MemoryPreferences::default();
        let handle = accessor
            .resolve(&PersistedBookmark::create(dir.path()).unwrap(), &mut store)
            .unwrap();

        {
            let guard = accessor.open(&handle).unwrap();
            assert_eq!(guard.handle(), &handle);
            assert_eq!(scope.ends.load(Ordering::SeqCst), 0);
        }
        assert_eq!(scope.begins.load(Ordering::SeqCst), 1);
        assert_eq!(scope.ends.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_access_returns_error_without_end() {
        let dir = tempdir().unwrap();
        let scope = CountingScope {
            deny: true,
            ..Default::default()
        };
        let accessor = SecureDirectoryAccessor::new(Box::new(scope.clone()));
        let mut store = MemoryPreferences::default();
        let handle = accessor
            .resolve(&PersistedBookmark::create(dir.path()).unwrap(), &mut store)
            .unwrap();

        assert!(matches!(accessor.open(&handle), Err(AccessError::Denied(_))));
        assert_eq!(scope.ends.load(Ordering::SeqCst), 0);
    }
}
