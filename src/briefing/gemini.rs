use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ModelError, TextModel};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelInfo {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Google's Generative Language REST API.
pub struct Gemini {
    client: Client,
    api_key: String,
    base_url: String,
}

impl Gemini {
    pub fn new(client: Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn error_message(text: String) -> String {
    serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|e| e.error.message)
        .unwrap_or(text)
}

fn check(response: Response, model: &str) -> Result<Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = error_message(response.text().unwrap_or_default());
    let lowered = message.to_lowercase();
    let unavailable = status == StatusCode::NOT_FOUND
        || (status == StatusCode::BAD_REQUEST
            && (lowered.contains("not found") || lowered.contains("not supported")));
    if unavailable {
        Err(ModelError::Unavailable {
            model: model.to_string(),
            message,
        })
    } else {
        Err(ModelError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl TextModel for Gemini {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()?;
        let body: GenerateResponse = check(response, model)?.json()?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }

    fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let response = self
            .client
            .get(format!("{}/v1beta/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()?;
        let body: ModelList = check(response, "*")?.json()?;

        Ok(body
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|g| g == "generateContent")
            })
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .unwrap_or(&m.name)
                    .to_string()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gemini(server: &MockServer) -> Gemini {
        Gemini::new(Client::new(), "key").with_base_url(&server.base_url())
    }

    #[test]
    fn test_generate_joins_parts() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1beta/models/gemini-2.5-flash:generateContent")
                .header("x-goog-api-key", "key")
                .json_body(json!({"contents": [{"parts": [{"text": "prompt"}]}]}));
            then.status(200).json_body(json!({
                "candidates": [{"content": {"parts": [{"text": "Hello "}, {"text": "world"}]}}]
            }));
        });

        let text = gemini(&server).generate("gemini-2.5-flash", "prompt").unwrap();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_generate_not_found_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/gone:generateContent");
            then.status(404).json_body(json!({
                "error": {"code": 404, "message": "models/gone is not found for API version v1beta"}
            }));
        });

        let err = gemini(&server).generate("gone", "prompt").unwrap_err();
        match err {
            ModelError::Unavailable { model, message } => {
                assert_eq!(model, "gone");
                assert_eq!(message, "models/gone is not found for API version v1beta");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_generate_unsupported_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/embed:generateContent");
            then.status(400).json_body(json!({
                "error": {"message": "generateContent is not supported for this model"}
            }));
        });

        let err = gemini(&server).generate("embed", "prompt").unwrap_err();
        assert!(matches!(err, ModelError::Unavailable { .. }));
    }

    #[test]
    fn test_generate_quota_is_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/m:generateContent");
            then.status(429)
                .json_body(json!({"error": {"message": "Resource has been exhausted"}}));
        });

        let err = gemini(&server).generate("m", "prompt").unwrap_err();
        assert!(matches!(err, ModelError::Api { status: 429, .. }));
        assert!(err.to_string().contains("Resource has been exhausted"));
    }

    #[test]
    fn test_generate_blocked_response_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/m:generateContent");
            then.status(200)
                .json_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        });

        let err = gemini(&server).generate("m", "prompt").unwrap_err();
        assert!(matches!(err, ModelError::EmptyResponse));
    }

    #[test]
    fn test_list_models_filters_generators() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1beta/models");
            then.status(200).json_body(json!({
                "models": [
                    {"name": "models/gemini-2.5-flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                    {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]},
                    {"name": "models/gemini-pro-latest", "supportedGenerationMethods": ["generateContent"]}
                ]
            }));
        });

        let models = gemini(&server).list_models().unwrap();
        assert_eq!(models, vec!["gemini-2.5-flash", "gemini-pro-latest"]);
    }
}
