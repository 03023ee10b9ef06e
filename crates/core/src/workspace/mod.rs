//! Request-scoped temporary workspaces.
//!
//! Every request gets its own directory under the configured root. The
//! directory is removed exactly once: either by an explicit
//! [`Workspace::release`] or, on any other exit path (error, panic, client
//! disconnect), when the [`Workspace`] is dropped.

mod error;
mod manager;

pub use error::WorkspaceError;
pub use manager::{Workspace, WorkspaceManager};

/// Wait up to two seconds for a background release to remove `path`.
#[cfg(test)]
pub(crate) async fn removed_eventually(path: &std::path::Path) -> bool {
    for _ in 0..200 {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    !path.exists()
}
