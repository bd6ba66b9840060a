use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Backend, Blob, Result, StoreError};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Documents stored in a GitHub repository through the contents API.
///
/// The version token is the blob `sha` the API reports.
pub struct GitHubBackend {
    client: Client,
    api_url: String,
    repo: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHubBackend {
    /// `repo` is `owner/name`.
    pub fn new(client: Client, repo: &str, token: &str) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            self.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn put(&self, path: &str, content: &str, message: &str, sha: Option<&str>) -> Result<String> {
        let body = PutRequest {
            message,
            content: STANDARD.encode(content),
            sha,
        };
        let response = self
            .authorize(self.client.put(self.contents_url(path)))
            .json(&body)
            .send()?;
        let response = check(response, path)?;
        let created: PutResponse = response.json()?;
        Ok(created.content.sha)
    }
}

/// Maps a non-2xx response onto the store's error classes.
fn check(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or(text);
    Err(match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(path.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            StoreError::Forbidden(message)
        }
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Conflict(path.to_string())
        }
        _ => StoreError::Api {
            status: status.as_u16(),
            message,
        },
    })
}

impl Backend for GitHubBackend {
    fn location(&self) -> &str {
        &self.repo
    }

    fn fetch(&self, path: &str) -> Result<Option<Blob>> {
        let response = self
            .authorize(self.client.get(self.contents_url(path)))
            .send()?;
        let response = match check(response, path) {
            Ok(response) => response,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let body: ContentsResponse = response.json()?;
        // The API wraps base64 at 60 columns.
        let packed: String = body.content.split_whitespace().collect();
        let content = String::from_utf8(STANDARD.decode(packed)?)?;
        debug!(repo = %self.repo, path, sha = %body.sha, "fetched document");
        Ok(Some(Blob {
            content,
            version: body.sha,
        }))
    }

    fn create(&self, path: &str, content: &str, message: &str) -> Result<String> {
        self.put(path, content, message, None)
    }

    fn update(&self, path: &str, content: &str, message: &str, version: &str) -> Result<String> {
        self.put(path, content, message, Some(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DocumentStore;
    use httpmock::prelude::*;
    use serde_json::json;

    const CONTENTS: &str = "/repos/owner/repo/contents/data/stats.json";

    fn backend(server: &MockServer) -> GitHubBackend {
        GitHubBackend::new(Client::new(), "owner/repo", "secret").with_api_url(&server.base_url())
    }

    #[test]
    fn test_fetch_decodes_wrapped_base64() {
        let server = MockServer::start();
        let encoded = STANDARD.encode("{\"visits\": 7, \"last_updated\": \"\"}");
        let (head, tail) = encoded.split_at(20);
        server.mock(|when, then| {
            when.method(GET)
                .path(CONTENTS)
                .header("authorization", "Bearer secret");
            then.status(200).json_body(json!({
                "content": format!("{head}\n{tail}\n"),
                "sha": "abc123",
                "encoding": "base64",
            }));
        });

        let blob = backend(&server).fetch("data/stats.json").unwrap().unwrap();
        assert_eq!(blob.content, "{\"visits\": 7, \"last_updated\": \"\"}");
        assert_eq!(blob.version, "abc123");
    }

    #[test]
    fn test_fetch_missing_is_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(CONTENTS);
            then.status(404).json_body(json!({"message": "Not Found"}));
        });

        assert_eq!(backend(&server).fetch("data/stats.json").unwrap(), None);
    }

    #[test]
    fn test_fetch_forbidden() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(CONTENTS);
            then.status(403)
                .json_body(json!({"message": "API rate limit exceeded"}));
        });

        let err = backend(&server).fetch("data/stats.json").unwrap_err();
        assert!(err.is_forbidden());
        assert!(err.to_string().contains("API rate limit exceeded"));
    }

    #[test]
    fn test_update_conflict() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(PUT).path(CONTENTS);
            then.status(409)
                .json_body(json!({"message": "data/stats.json does not match abc"}));
        });

        let err = backend(&server)
            .update("data/stats.json", "{}", "Update stats", "abc")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn test_store_creates_missing_document() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(CONTENTS);
            then.status(404).json_body(json!({"message": "Not Found"}));
        });
        let expected = serde_json::to_string_pretty(&json!({"visits": 1})).unwrap();
        let create = server.mock(|when, then| {
            when.method(PUT).path(CONTENTS).json_body(json!({
                "message": "Update stats",
                "content": STANDARD.encode(&expected),
            }));
            then.status(201).json_body(json!({"content": {"sha": "new1"}}));
        });

        let mut store = DocumentStore::new(backend(&server));
        store
            .write("data/stats.json", &json!({"visits": 1}), "Update stats")
            .unwrap();
        create.assert();
    }

    #[test]
    fn test_store_updates_with_current_sha() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(CONTENTS);
            then.status(200).json_body(json!({
                "content": STANDARD.encode("{\"visits\": 1}"),
                "sha": "old1",
            }));
        });
        let expected = serde_json::to_string_pretty(&json!({"visits": 2})).unwrap();
        let update = server.mock(|when, then| {
            when.method(PUT).path(CONTENTS).json_body(json!({
                "message": "Update stats",
                "content": STANDARD.encode(&expected),
                "sha": "old1",
            }));
            then.status(200).json_body(json!({"content": {"sha": "new2"}}));
        });

        let mut store = DocumentStore::new(backend(&server));
        store
            .write("data/stats.json", &json!({"visits": 2}), "Update stats")
            .unwrap();
        update.assert();
    }

    #[test]
    fn test_store_write_rate_limited() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(CONTENTS);
            then.status(404);
        });
        let create = server.mock(|when, then| {
            when.method(PUT).path(CONTENTS);
            then.status(403)
                .json_body(json!({"message": "API rate limit exceeded"}));
        });

        let mut store = DocumentStore::new(backend(&server));
        let err = store
            .write("data/stats.json", &json!({"visits": 2}), "Update stats")
            .unwrap_err();
        assert!(err.is_forbidden());
        create.assert();
    }
}
