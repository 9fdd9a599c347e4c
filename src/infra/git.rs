//! Git operations
//!
//! Reads the current revision and origin remote of the source tree using the
//! gix crate.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::context::GitInfo;

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Repository could not be opened
    #[error("Invalid repository at '{path}': {error}")]
    InvalidRepository { path: PathBuf, error: String },

    /// HEAD does not point at a commit
    #[error("Failed to resolve HEAD in '{path}': {error}")]
    HeadUnresolved { path: PathBuf, error: String },
}

/// Source of version control metadata
///
/// Returns `Ok(None)` when the directory is not under version control.
pub trait OriginProvider: Send + Sync + Debug {
    /// Current revision and origin remote for `directory`
    fn origin(&self, directory: &Path) -> Result<Option<GitInfo>, GitError>;
}

/// Origin provider backed by a local git repository
#[derive(Debug, Default, Clone, Copy)]
pub struct GitRepository;

impl GitRepository {
    /// Create a new git-backed origin provider
    pub fn new() -> Self {
        Self
    }
}

impl OriginProvider for GitRepository {
    fn origin(&self, directory: &Path) -> Result<Option<GitInfo>, GitError> {
        let repo = match gix::discover(directory) {
            Ok(repo) => repo,
            Err(gix::discover::Error::Discover(e)) => {
                tracing::debug!("No git repository at '{}': {e}", directory.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(GitError::InvalidRepository {
                    path: directory.to_path_buf(),
                    error: e.to_string(),
                })
            }
        };

        let head = repo.head_id().map_err(|e| GitError::HeadUnresolved {
            path: directory.to_path_buf(),
            error: e.to_string(),
        })?;

        let origin_url = repo
            .find_remote("origin")
            .ok()
            .and_then(|remote| {
                remote
                    .url(gix::remote::Direction::Fetch)
                    .map(|url| url.to_bstring().to_string())
            });

        Ok(Some(GitInfo {
            sha: head.to_hex().to_string(),
            origin_url,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) -> bool {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("GIT_AUTHOR_NAME", "galley")
            .env("GIT_AUTHOR_EMAIL", "galley@example.com")
            .env("GIT_COMMITTER_NAME", "galley")
            .env("GIT_COMMITTER_EMAIL", "galley@example.com")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_not_a_repository_is_absent() {
        let temp = TempDir::new().unwrap();
        // Only meaningful when the temp dir is not itself inside a repository
        if gix::discover(temp.path()).is_ok() {
            return;
        }
        let result = GitRepository::new().origin(temp.path()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_reads_head_and_origin() {
        if which::which("git").is_err() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert!(git(dir, &["init", "-q"]));
        std::fs::write(dir.join("README.md"), "# tool\n").unwrap();
        assert!(git(dir, &["add", "."]));
        assert!(git(dir, &["commit", "-q", "-m", "initial"]));
        assert!(git(
            dir,
            &["remote", "add", "origin", "https://github.com/acme/tool.git"]
        ));

        let info = GitRepository::new().origin(dir).unwrap().unwrap();
        assert_eq!(info.sha.len(), 40);
        assert!(info.sha.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            info.origin_url.as_deref(),
            Some("https://github.com/acme/tool.git")
        );
    }

    #[test]
    fn test_repository_without_commits_fails() {
        if which::which("git").is_err() {
            return;
        }
        let temp = TempDir::new().unwrap();
        assert!(git(temp.path(), &["init", "-q"]));

        let result = GitRepository::new().origin(temp.path());
        assert!(matches!(result, Err(GitError::HeadUnresolved { .. })));
    }
}
