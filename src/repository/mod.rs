mod github;
#[cfg(test)]
pub mod memory;

pub use github::{GitHubClient, GitHubConfig};

use async_trait::async_trait;

use crate::{document_path::DocumentPath, error::RepositoryError};

/// One persisted revision of a file, as loaded for a single edit session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevision {
    pub path: DocumentPath,
    pub content: String,
    /// Opaque revision id; echoed unchanged on the write that replaces it.
    pub version_token: String,
}

/// What the server reports about an accepted write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    pub version_token: Option<String>,
    pub commit_sha: Option<String>,
    pub html_url: Option<String>,
}

/// The two file operations the editor needs, plus the identity probe.
///
/// Implementations read the bearer credential at call time on every call.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// `false` on any failure: bad status, no credential, unreachable host.
    async fn check_identity(&self) -> bool;

    async fn read_file(&self, path: &DocumentPath) -> Result<FileRevision, RepositoryError>;

    /// Replace the revision identified by `version_token`. Fails with
    /// [`RepositoryError::Conflict`] when that revision is no longer current.
    async fn write_file(
        &self,
        path: &DocumentPath,
        content: &str,
        version_token: &str,
        message: &str,
    ) -> Result<CommitResult, RepositoryError>;
}
