use anyhow::Context;
use std::{path::PathBuf, sync::Arc};

use crate::{
    credential::{self, CredentialStore, FileCredentialStore},
    repository::{ContentRepository, GitHubClient, GitHubConfig},
    session::SessionSettings,
};

/// Services shared by every subcommand, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub repository: Arc<dyn ContentRepository>,
    pub settings: SessionSettings,
}

impl AppState {
    pub fn build(
        github: GitHubConfig,
        store_path: Option<PathBuf>,
        settings: SessionSettings,
    ) -> anyhow::Result<Self> {
        let store_path = match store_path {
            Some(p) => p,
            None => credential::default_store_path()?,
        };
        let store = FileCredentialStore::new(store_path);
        tracing::debug!(store = %store.path().display(), "Credential store");

        let credentials: Arc<dyn CredentialStore> = Arc::new(store);
        let repository = GitHubClient::new(github, Arc::clone(&credentials))
            .context("Failed to build HTTP client")?;

        Ok(Self {
            credentials,
            repository: Arc::new(repository),
            settings,
        })
    }
}
