//! In-memory repository with the same optimistic-concurrency rules as the
//! real API. Records every call so tests can assert on traffic.

use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

use super::{CommitResult, ContentRepository, FileRevision};
use crate::{document_path::DocumentPath, error::RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Identity,
    Read(String),
    Write {
        path: String,
        content: String,
        version_token: String,
        message: String,
    },
}

#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, (String, String)>,
    revision: u64,
    identity_ok: bool,
    calls: Vec<Call>,
}

impl MemoryRepository {
    pub fn new(identity_ok: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                identity_ok,
                ..Inner::default()
            }),
        }
    }

    /// Seed a file at a fixed version token.
    pub fn insert(&self, path: &str, content: &str, version_token: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .files
            .insert(path.to_string(), (content.to_string(), version_token.to_string()));
    }

    /// Change a file behind the editor's back, as another client would.
    pub fn touch(&self, path: &str, content: &str) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.revision += 1;
        let token = format!("rev{}", inner.revision);
        inner
            .files
            .insert(path.to_string(), (content.to_string(), token.clone()));
        token
    }

    pub fn content(&self, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|(c, _)| c.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Write { .. }))
            .collect()
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn check_identity(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Identity);
        inner.identity_ok
    }

    async fn read_file(&self, path: &DocumentPath) -> Result<FileRevision, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Read(path.to_string()));
        let (content, token) = inner
            .files
            .get(path.as_str())
            .cloned()
            .ok_or(RepositoryError::Status {
                status: 404,
                message: Some("Not Found".into()),
            })?;
        Ok(FileRevision {
            path: path.clone(),
            content,
            version_token: token,
        })
    }

    async fn write_file(
        &self,
        path: &DocumentPath,
        content: &str,
        version_token: &str,
        message: &str,
    ) -> Result<CommitResult, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Write {
            path: path.to_string(),
            content: content.to_string(),
            version_token: version_token.to_string(),
            message: message.to_string(),
        });

        let current = inner.files.get(path.as_str()).map(|(_, t)| t.clone());
        if current.as_deref() != Some(version_token) {
            return Err(RepositoryError::Conflict {
                status: 409,
                message: Some(format!("{path} does not match {version_token}")),
            });
        }

        inner.revision += 1;
        let token = format!("rev{}", inner.revision);
        inner
            .files
            .insert(path.to_string(), (content.to_string(), token.clone()));
        Ok(CommitResult {
            version_token: Some(token),
            commit_sha: Some(format!("commit{}", inner.revision)),
            html_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_returns_identical_content() {
        let repo = MemoryRepository::new(true);
        repo.insert("_posts/a.md", "old", "sha0");
        let path = DocumentPath::from_raw("_posts/a.md");

        let text = "héllo\r\n\tworld ✓\n";
        repo.write_file(&path, text, "sha0", "m").await.unwrap();
        let rev = repo.read_file(&path).await.unwrap();
        assert_eq!(rev.content.as_bytes(), text.as_bytes());
        assert_ne!(rev.version_token, "sha0");
    }

    #[tokio::test]
    async fn stale_token_conflicts() {
        let repo = MemoryRepository::new(true);
        repo.insert("_posts/a.md", "old", "sha0");
        repo.touch("_posts/a.md", "changed elsewhere");
        let err = repo
            .write_file(&DocumentPath::from_raw("_posts/a.md"), "mine", "sha0", "m")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.content("_posts/a.md").as_deref(), Some("changed elsewhere"));
    }
}
