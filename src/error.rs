/// Failures of the remote content API.
#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("no GitHub token stored")]
    MissingCredential,
    /// The write's precondition failed: the file changed since it was read.
    #[error("GitHub API error {status}: {}", .message.as_deref().unwrap_or("version conflict"))]
    Conflict { status: u16, message: Option<String> },
    #[error("GitHub API error {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepositoryError::Conflict { status, .. } | RepositoryError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }
}

/// Local checks that stop a request before it is issued.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Content cannot be empty")]
    EmptyContent,
    #[error("Could not determine post filename: missing post {field}")]
    MissingMetadata { field: &'static str },
    #[error("Could not determine post filename: unrecognised date '{0}'")]
    InvalidDate(String),
}

#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential store is corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialise credential store: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine a config directory for the credential store")]
    NoConfigDir,
}

#[derive(thiserror::Error, Debug)]
pub enum PageError {
    #[error("could not fetch page: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("page returned HTTP {0}")]
    Status(u16),
    #[error("could not read page: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a post page (no element with class \"post\")")]
    NotAPost,
}
