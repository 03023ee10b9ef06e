//! Workspace allocation and release.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use audiodrop_shared::WorkspaceId;
use tracing::{debug, info, warn};

use super::error::WorkspaceError;

/// Attempts before giving up on finding an unused directory name.
const MAX_ACQUIRE_ATTEMPTS: usize = 3;

/// Allocates request workspaces under a common root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    prefix: String,
}

impl WorkspaceManager {
    /// Directory name prefix for workspaces.
    pub const DEFAULT_PREFIX: &'static str = "audiodrop";

    /// Create a manager that allocates workspaces under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    /// Get the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, exclusively owned workspace directory.
    ///
    /// The directory is created with `create_dir`, which fails on an existing
    /// path, so two live workspaces never share a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or the workspace directory cannot be created.
    pub async fn acquire(&self) -> Result<Workspace, WorkspaceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| WorkspaceError::acquire(&self.root, e))?;

        let mut last_err = None;
        for _ in 0..MAX_ACQUIRE_ATTEMPTS {
            let id = WorkspaceId::new();
            let path = self.root.join(format!("{}-{id}", self.prefix));

            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(workspace = %path.display(), "Workspace acquired");
                    return Ok(Workspace::new(id, path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    last_err = Some(WorkspaceError::acquire(&path, e));
                }
                Err(e) => return Err(WorkspaceError::acquire(&path, e)),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            WorkspaceError::acquire(&self.root, ErrorKind::AlreadyExists.into())
        }))
    }

    /// Remove workspaces left behind by a previous process.
    ///
    /// Only directories carrying this manager's prefix and last modified at
    /// least `max_age` ago are removed. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed.
    pub async fn sweep_stale(&self, max_age: Duration) -> Result<usize, WorkspaceError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(WorkspaceError::cleanup(&self.root, e)),
        };

        let marker = format!("{}-", self.prefix);
        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WorkspaceError::cleanup(&self.root, e))?
        {
            if !entry.file_name().to_string_lossy().starts_with(&marker) {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_dir() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }

            let path = entry.path();
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(workspace = %path.display(), error = %e, "Failed to sweep stale workspace");
                }
            }
        }

        if removed > 0 {
            info!(removed, root = %self.root.display(), "Swept stale workspaces");
        }
        Ok(removed)
    }
}

/// An exclusively owned temporary directory for one request.
///
/// Release is attempted at most once. Explicit [`release`](Self::release)
/// calls after the first are no-ops, and dropping a released workspace does
/// nothing.
#[derive(Debug)]
pub struct Workspace {
    id: WorkspaceId,
    path: PathBuf,
    released: bool,
}

impl Workspace {
    fn new(id: WorkspaceId, path: PathBuf) -> Self {
        Self {
            id,
            path,
            released: false,
        }
    }

    /// Get the workspace ID.
    #[must_use]
    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    /// Get the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether release has already run.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the directory and everything in it.
    ///
    /// A directory that is already gone counts as released.
    ///
    /// # Errors
    ///
    /// Returns a cleanup error if the directory exists but cannot be removed.
    pub async fn release(&mut self) -> Result<(), WorkspaceError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!(workspace = %self.path.display(), "Workspace released");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::cleanup(&self.path, e)),
        }
    }

    /// Release without waiting, from a context that cannot `.await`.
    ///
    /// Removal runs on the blocking thread pool when a Tokio runtime is
    /// available, inline otherwise. The `released` flag still travels with
    /// the workspace, so removal happens at most once.
    pub fn release_in_background(self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || drop(self));
            }
            Err(_) => drop(self),
        }
    }

    fn release_blocking(&mut self) -> Result<(), WorkspaceError> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!(workspace = %self.path.display(), "Workspace released on drop");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkspaceError::cleanup(&self.path, e)),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.release_blocking() {
            warn!(error = %e, "Workspace cleanup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_acquire_creates_directory_under_root() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let workspace = manager.acquire().await.unwrap();

        assert!(workspace.path().is_dir());
        assert!(workspace.path().starts_with(root.path()));
        let name = workspace.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("audiodrop-"));
        assert!(name.ends_with(&workspace.id().to_string()));
    }

    #[tokio::test]
    async fn test_release_removes_directory_and_contents() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let mut workspace = manager.acquire().await.unwrap();
        let path = workspace.path().to_path_buf();
        tokio::fs::write(path.join("partial.webm.part"), b"partial")
            .await
            .unwrap();

        workspace.release().await.unwrap();

        assert!(!path.exists());
        assert!(workspace.is_released());
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let mut first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();

        first.release().await.unwrap();
        first.release().await.unwrap();
        drop(first);

        // Another request's workspace is untouched.
        assert!(second.path().is_dir());
    }

    #[tokio::test]
    async fn test_release_tolerates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let mut workspace = manager.acquire().await.unwrap();

        std::fs::remove_dir_all(workspace.path()).unwrap();

        assert!(workspace.release().await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_releases_workspace() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let workspace = manager.acquire().await.unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("abc123.mp3"), b"ID3").unwrap();

        drop(workspace);

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_in_background_removes_directory() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let workspace = manager.acquire().await.unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(path.join("abc123.mp3"), b"ID3").unwrap();

        workspace.release_in_background();

        assert!(crate::workspace::removed_eventually(&path).await);
    }

    #[test]
    fn test_release_in_background_without_runtime_is_inline() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let workspace = runtime.block_on(manager.acquire()).unwrap();
        let path = workspace.path().to_path_buf();

        workspace.release_in_background();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_acquire_yields_distinct_paths() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.acquire().await.unwrap() })
            })
            .collect();

        let mut workspaces = Vec::new();
        for handle in handles {
            workspaces.push(handle.await.unwrap());
        }

        let paths: HashSet<_> = workspaces.iter().map(|w| w.path().to_path_buf()).collect();
        assert_eq!(paths.len(), 16);
    }

    #[tokio::test]
    async fn test_acquire_creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("nested").join("work");
        let manager = WorkspaceManager::new(&nested);

        let workspace = manager.acquire().await.unwrap();

        assert!(workspace.path().starts_with(&nested));
    }

    #[tokio::test]
    async fn test_sweep_stale_only_removes_prefixed_directories() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let stale = root.path().join("audiodrop-leftover");
        let unrelated = root.path().join("someone-else");
        std::fs::create_dir(&stale).unwrap();
        std::fs::create_dir(&unrelated).unwrap();

        let removed = manager.sweep_stale(Duration::ZERO).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[tokio::test]
    async fn test_sweep_stale_keeps_fresh_directories() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path());
        let fresh = manager.acquire().await.unwrap();

        let removed = manager
            .sweep_stale(Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(removed, 0);
        assert!(fresh.path().is_dir());
    }

    #[tokio::test]
    async fn test_sweep_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let manager = WorkspaceManager::new(root.path().join("absent"));

        assert_eq!(manager.sweep_stale(Duration::ZERO).await.unwrap(), 0);
    }
}
