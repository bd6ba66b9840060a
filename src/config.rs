use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use docstore::{Backend, DocumentStore, GitBackend, GitHubBackend};

use crate::briefing::{DEFAULT_MODELS, Gemini};
use crate::image::{DEFAULT_TEMPLATE, HttpRenderer, ImageRenderer, TemplateRenderer};

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub(crate) enum StoreKind {
    /// A local git repository
    Git,
    /// A GitHub repository, through the contents API
    Github,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub(crate) enum ImageKind {
    None,
    /// Build a keyless generator URL, no request is made
    Template,
    /// POST to an authenticated image endpoint
    Http,
}

/// Settings shared by every command. Each one can come from the environment.
#[derive(Args, Debug)]
pub(crate) struct Config {
    /// Where documents are kept
    #[arg(long, global = true, env = "NEWSROOM_BACKEND", value_enum, default_value_t = StoreKind::Git)]
    backend: StoreKind,

    /// Path of the git repository holding the documents
    #[arg(long, global = true, env = "NEWSROOM_STORE")]
    store: Option<PathBuf>,

    /// GitHub repository as owner/name
    #[arg(long, global = true, env = "NEWSROOM_REPO")]
    repo: Option<String>,

    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    #[arg(long, global = true, env = "GITHUB_API_URL", default_value = docstore::DEFAULT_GITHUB_API_URL)]
    github_api_url: String,

    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    #[arg(long, global = true, env = "GEMINI_API_URL", default_value = crate::briefing::gemini::DEFAULT_API_URL)]
    gemini_api_url: String,

    /// Candidate models, tried in order until one answers
    #[arg(long, global = true, env = "NEWSROOM_MODELS", value_delimiter = ',')]
    models: Vec<String>,

    /// How infographics are produced
    #[arg(long, global = true, env = "NEWSROOM_IMAGE", value_enum, default_value_t = ImageKind::Template)]
    image: ImageKind,

    /// URL template for the template image backend
    #[arg(long, global = true, env = "NEWSROOM_IMAGE_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    image_template: String,

    #[arg(long, global = true, env = "NEWSROOM_IMAGE_ENDPOINT")]
    image_endpoint: Option<String>,

    #[arg(long, global = true, env = "NEWSROOM_IMAGE_TOKEN", hide_env_values = true)]
    image_token: Option<String>,

    #[arg(long, global = true, env = "NEWSROOM_IMAGE_MODEL", default_value = "flux")]
    image_model: String,
}

fn required<'a>(value: &'a Option<String>, what: &str) -> anyhow::Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{what} is not configured"))
}

impl Config {
    fn store_dir(&self) -> PathBuf {
        self.store.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("newsroom")
        })
    }

    pub fn open_store(&self) -> anyhow::Result<DocumentStore<Box<dyn Backend>>> {
        let backend: Box<dyn Backend> = match self.backend {
            StoreKind::Git => {
                let dir = self.store_dir();
                let backend = GitBackend::open_or_init(&dir)
                    .with_context(|| format!("failed to open store at {}", dir.display()))?;
                Box::new(backend)
            }
            StoreKind::Github => {
                let repo = required(&self.repo, "NEWSROOM_REPO (--repo)")?;
                let token = required(&self.github_token, "GITHUB_TOKEN (--github-token)")?;
                let client = crate::http::http_client()?;
                Box::new(GitHubBackend::new(client, repo, token).with_api_url(&self.github_api_url))
            }
        };
        Ok(DocumentStore::new(backend))
    }

    pub fn text_model(&self) -> anyhow::Result<Gemini> {
        let key = required(&self.google_api_key, "GOOGLE_API_KEY (--google-api-key)")?;
        let client = crate::http::http_client()?;
        Ok(Gemini::new(client, key).with_base_url(&self.gemini_api_url))
    }

    pub fn candidate_models(&self) -> Vec<String> {
        let configured: Vec<String> = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if configured.is_empty() {
            DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
        } else {
            configured
        }
    }

    pub fn image_renderer(&self) -> anyhow::Result<Option<Box<dyn ImageRenderer>>> {
        let renderer: Option<Box<dyn ImageRenderer>> = match self.image {
            ImageKind::None => None,
            ImageKind::Template => Some(Box::new(TemplateRenderer::new(&self.image_template))),
            ImageKind::Http => {
                let endpoint = required(&self.image_endpoint, "NEWSROOM_IMAGE_ENDPOINT (--image-endpoint)")?;
                let token = required(&self.image_token, "NEWSROOM_IMAGE_TOKEN (--image-token)")?;
                let client = crate::http::http_client()?;
                Some(Box::new(HttpRenderer::new(client, endpoint, token, &self.image_model)))
            }
        };
        Ok(renderer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestArgs {
        #[command(flatten)]
        config: Config,
    }

    fn parse(args: &[&str]) -> Config {
        TestArgs::try_parse_from(std::iter::once("newsroom").chain(args.iter().copied()))
            .unwrap()
            .config
    }

    #[test]
    fn test_default_models_in_order() {
        let config = parse(&["--models", ""]);
        let models = config.candidate_models();
        assert_eq!(models.first().map(String::as_str), Some("gemini-2.5-flash"));
        assert_eq!(models.len(), DEFAULT_MODELS.len());
    }

    #[test]
    fn test_models_override() {
        let config = parse(&["--models", "b-model, a-model"]);
        assert_eq!(config.candidate_models(), vec!["b-model", "a-model"]);
    }

    #[test]
    fn test_missing_key_is_reported() {
        let config = parse(&["--google-api-key", "  "]);
        let err = config.text_model().unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_github_backend_needs_repo_and_token() {
        let config = parse(&["--backend", "github", "--repo", "", "--github-token", "t"]);
        let err = config.open_store().err().unwrap();
        assert!(err.to_string().contains("NEWSROOM_REPO"));
    }

    #[test]
    fn test_http_images_need_endpoint() {
        let config = parse(&["--image", "http", "--image-endpoint", ""]);
        let err = config.image_renderer().err().unwrap();
        assert!(err.to_string().contains("NEWSROOM_IMAGE_ENDPOINT"));
    }

    #[test]
    fn test_no_images() {
        let config = parse(&["--image", "none"]);
        assert!(config.image_renderer().unwrap().is_none());
    }
}
