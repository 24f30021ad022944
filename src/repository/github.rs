//! GitHub contents API client.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{RequestBuilder, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{CommitResult, ContentRepository, FileRevision};
use crate::{
    credential::CredentialStore, document_path::DocumentPath, error::RepositoryError,
};

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("blog-inline-editor/", env!("CARGO_PKG_VERSION"));

/// Characters left unescaped in a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// API root without trailing slash, e.g. `https://api.github.com`.
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Branch to read from and commit to. `None` means the default branch.
    pub branch: Option<String>,
}

pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl GitHubClient {
    pub fn new(
        config: GitHubConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, RepositoryError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    fn contents_url(&self, path: &DocumentPath) -> String {
        let encoded: Vec<String> = path
            .as_str()
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| utf8_percent_encode(seg, SEGMENT).to_string())
            .collect();
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            utf8_percent_encode(&self.config.owner, SEGMENT),
            utf8_percent_encode(&self.config.repo, SEGMENT),
            encoded.join("/")
        )
    }

    fn identity_url(&self) -> String {
        format!("{}/user", self.config.api_base.trim_end_matches('/'))
    }

    /// Attach the bearer credential, read fresh from the store.
    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder, RepositoryError> {
        let credential = self
            .credentials
            .get()
            .ok_or(RepositoryError::MissingCredential)?;
        Ok(req
            .header(header::AUTHORIZATION, format!("token {}", credential.expose()))
            .header(header::ACCEPT, ACCEPT))
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: String,
    encoding: Option<String>,
    sha: String,
}

#[derive(Serialize)]
struct UpdateRequest<'a> {
    message: &'a str,
    content: String,
    sha: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Deserialize, Default)]
struct UpdateResponse {
    content: Option<ShaRef>,
    commit: Option<CommitRef>,
}

#[derive(Deserialize)]
struct ShaRef {
    sha: Option<String>,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: Option<String>,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

// ── Blob encoding ─────────────────────────────────────────────────────────────

/// Decode the API's base64 blob (which arrives wrapped at 60 columns) to text.
pub(crate) fn decode_blob(blob: &str) -> Result<String, RepositoryError> {
    let compact: String = blob.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| RepositoryError::Decode(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|_| RepositoryError::Decode("file is not valid UTF-8 text".into()))
}

pub(crate) fn encode_blob(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Turn a non-success response into the matching error, keeping the API's
/// own message when it sent one.
async fn error_from_response(response: reqwest::Response) -> RepositoryError {
    let status = response.status();
    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message);
    match status {
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => RepositoryError::Conflict {
            status: status.as_u16(),
            message,
        },
        _ => RepositoryError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ContentRepository for GitHubClient {
    async fn check_identity(&self) -> bool {
        let req = match self.authorized(self.http.get(self.identity_url())) {
            Ok(r) => r,
            Err(_) => {
                tracing::debug!("No stored token, skipping identity check");
                return false;
            }
        };

        match req.send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                tracing::info!(status = resp.status().as_u16(), valid = ok, "Identity check");
                ok
            }
            Err(e) => {
                tracing::warn!("Identity check failed: {}", e);
                false
            }
        }
    }

    async fn read_file(&self, path: &DocumentPath) -> Result<FileRevision, RepositoryError> {
        let mut req = self.http.get(self.contents_url(path));
        if let Some(branch) = &self.config.branch {
            req = req.query(&[("ref", branch)]);
        }
        let response = self.authorized(req)?.send().await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(path = %path, "Read failed: {}", err);
            return Err(err);
        }

        let body = response.bytes().await?;
        let data: ContentsResponse = serde_json::from_slice(&body)
            .map_err(|_| RepositoryError::Decode(format!("{path} is not a file")))?;

        if data.kind.as_deref().is_some_and(|k| k != "file") {
            return Err(RepositoryError::Decode(format!("{path} is not a file")));
        }
        if data.encoding.as_deref().is_some_and(|e| e != "base64") {
            return Err(RepositoryError::Decode(format!(
                "{path} is too large for the contents API"
            )));
        }

        let content = decode_blob(&data.content)?;
        tracing::info!(path = %path, sha = %data.sha, bytes = content.len(), "Loaded file");
        Ok(FileRevision {
            path: path.clone(),
            content,
            version_token: data.sha,
        })
    }

    async fn write_file(
        &self,
        path: &DocumentPath,
        content: &str,
        version_token: &str,
        message: &str,
    ) -> Result<CommitResult, RepositoryError> {
        let body = UpdateRequest {
            message,
            content: encode_blob(content),
            sha: version_token,
            branch: self.config.branch.as_deref(),
        };
        let req = self.http.put(self.contents_url(path)).json(&body);
        let response = self.authorized(req)?.send().await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            tracing::warn!(path = %path, sha = %version_token, "Write rejected: {}", err);
            return Err(err);
        }

        let parsed: UpdateResponse = response.json().await.unwrap_or_else(|e| {
            tracing::debug!("Unreadable commit payload: {}", e);
            UpdateResponse::default()
        });
        let result = CommitResult {
            version_token: parsed.content.and_then(|c| c.sha),
            commit_sha: parsed.commit.as_ref().and_then(|c| c.sha.clone()),
            html_url: parsed.commit.and_then(|c| c.html_url),
        };
        tracing::info!(
            path = %path,
            commit = result.commit_sha.as_deref().unwrap_or("?"),
            "Committed update"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, store: MemoryCredentialStore) -> GitHubClient {
        GitHubClient::new(
            GitHubConfig {
                api_base: server.uri(),
                owner: "gcol33".into(),
                repo: "blog".into(),
                branch: None,
            },
            Arc::new(store),
        )
        .unwrap()
    }

    fn post() -> DocumentPath {
        DocumentPath::from_raw("_posts/2024-01-05-hello-world.md")
    }

    #[test]
    fn blob_encoding_is_lossless_for_utf8() {
        let text = "---\ntitle: Ünïcødé ✓\n---\r\nline one\nline two\n";
        let blob = encode_blob(text);
        // The API wraps its base64 output; decoding must tolerate that.
        let wrapped: String = blob
            .as_bytes()
            .chunks(8)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(decode_blob(&wrapped).unwrap(), text);
    }

    #[test]
    fn non_utf8_blob_is_a_decode_error() {
        let blob = STANDARD.encode([0xff, 0xfe, 0x00]);
        assert!(matches!(decode_blob(&blob), Err(RepositoryError::Decode(_))));
    }

    #[test]
    fn path_segments_are_escaped() {
        let store = MemoryCredentialStore::default();
        let c = GitHubClient::new(
            GitHubConfig {
                api_base: "https://api.github.com/".into(),
                owner: "o".into(),
                repo: "r".into(),
                branch: None,
            },
            Arc::new(store),
        )
        .unwrap();
        let url = c.contents_url(&DocumentPath::from_raw("_posts/2024-01-05-a b#c.md"));
        assert_eq!(
            url,
            "https://api.github.com/repos/o/r/contents/_posts/2024-01-05-a%20b%23c.md"
        );
    }

    #[tokio::test]
    async fn identity_check_reports_validity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "token good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "gcol33"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(client(&server, MemoryCredentialStore::with("good")).check_identity().await);
        assert!(!client(&server, MemoryCredentialStore::with("bad")).check_identity().await);
    }

    #[tokio::test]
    async fn identity_check_without_token_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(!client(&server, MemoryCredentialStore::default()).check_identity().await);
    }

    #[tokio::test]
    async fn identity_check_on_unreachable_host_is_false() {
        let c = GitHubClient::new(
            GitHubConfig {
                api_base: "http://127.0.0.1:1".into(),
                owner: "o".into(),
                repo: "r".into(),
                branch: None,
            },
            Arc::new(MemoryCredentialStore::with("tok")),
        )
        .unwrap();
        assert!(!c.check_identity().await);
    }

    #[tokio::test]
    async fn read_decodes_content_and_sha() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/gcol33/blog/contents/_posts/2024-01-05-hello-world.md"))
            .and(header("accept", ACCEPT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "encoding": "base64",
                "sha": "abc123",
                "content": "bGluZSBv\nbmUKbGlu\nZSB0d28=\n",
            })))
            .mount(&server)
            .await;

        let rev = client(&server, MemoryCredentialStore::with("t"))
            .read_file(&post())
            .await
            .unwrap();
        assert_eq!(rev.content, "line one\nline two");
        assert_eq!(rev.version_token, "abc123");
        assert_eq!(rev.path, post());
    }

    #[tokio::test]
    async fn read_passes_branch_as_ref() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("ref", "drafts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file", "encoding": "base64", "sha": "s1", "content": "",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut c = client(&server, MemoryCredentialStore::with("t"));
        c.config.branch = Some("drafts".into());
        let rev = c.read_file(&post()).await.unwrap();
        assert_eq!(rev.content, "");
    }

    #[tokio::test]
    async fn read_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let err = client(&server, MemoryCredentialStore::with("t"))
            .read_file(&post())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_conflict());
    }

    #[tokio::test]
    async fn read_of_directory_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "a.md"}])))
            .mount(&server)
            .await;

        let err = client(&server, MemoryCredentialStore::with("t"))
            .read_file(&post())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Decode(_)));
    }

    #[tokio::test]
    async fn read_without_token_is_refused_locally() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server, MemoryCredentialStore::default())
            .read_file(&post())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::MissingCredential));
    }

    #[tokio::test]
    async fn write_sends_message_blob_and_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/gcol33/blog/contents/_posts/2024-01-05-hello-world.md"))
            .and(header("authorization", "token t"))
            .and(body_partial_json(json!({
                "message": "Fix typo",
                "content": encode_blob("new text ✓"),
                "sha": "abc123",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": {"sha": "def456"},
                "commit": {"sha": "c0ffee", "html_url": "https://github.com/gcol33/blog/commit/c0ffee"},
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server, MemoryCredentialStore::with("t"))
            .write_file(&post(), "new text ✓", "abc123", "Fix typo")
            .await
            .unwrap();
        assert_eq!(result.version_token.as_deref(), Some("def456"));
        assert_eq!(result.commit_sha.as_deref(), Some("c0ffee"));
    }

    #[tokio::test]
    async fn stale_sha_is_a_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "_posts/x.md does not match abc123",
            })))
            .mount(&server)
            .await;

        let err = client(&server, MemoryCredentialStore::with("t"))
            .write_file(&post(), "text", "abc123", "m")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().contains("does not match"));
    }

    #[tokio::test]
    async fn other_write_failures_keep_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Resource not accessible"})),
            )
            .mount(&server)
            .await;

        let err = client(&server, MemoryCredentialStore::with("t"))
            .write_file(&post(), "text", "abc123", "m")
            .await
            .unwrap_err();
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "GitHub API error 403: Resource not accessible");
    }
}
