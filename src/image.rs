use rand::Rng;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TEMPLATE: &str = "https://image.pollinations.ai/prompt/{prompt}?width={width}&height={height}&seed={seed}&nologo=true";
pub const PLACEHOLDER_URL: &str = "https://placehold.co/1024x576?text=Daily+Briefing";
pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 576;

const STYLE_PREFIX: &str = "minimalist flat infographic, clean vector illustration, news dashboard style";
const NEGATIVE_PROMPT: &str = "text, letters, watermark, blurry, distorted, low quality";

/// Turns an image description into the URL of a rendered image.
pub trait ImageRenderer {
    /// `None` when no image could be produced.
    fn render(&self, directive: &str) -> Option<String>;
}

/// Builds a URL for a keyless generator that renders on first request.
pub struct TemplateRenderer {
    template: String,
    width: u32,
    height: u32,
}

impl TemplateRenderer {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    pub fn render_with_seed(&self, directive: &str, seed: u32) -> String {
        let prompt = format!("{STYLE_PREFIX}, {directive}");
        let built = self
            .template
            .replace("{prompt}", &urlencoding::encode(&prompt))
            .replace("{width}", &self.width.to_string())
            .replace("{height}", &self.height.to_string())
            .replace("{seed}", &seed.to_string());
        match Url::parse(&built) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(template = %self.template, error = %e, "image template did not produce a URL");
                PLACEHOLDER_URL.to_string()
            }
        }
    }
}

impl ImageRenderer for TemplateRenderer {
    fn render(&self, directive: &str) -> Option<String> {
        let seed = rand::rng().random_range(0..1_000_000);
        Some(self.render_with_seed(directive, seed))
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    width: u32,
    height: u32,
    negative_prompt: &'a str,
}

/// Posts the description to an authenticated image generation endpoint.
pub struct HttpRenderer {
    client: Client,
    endpoint: String,
    token: String,
    model: String,
}

impl HttpRenderer {
    pub fn new(client: Client, endpoint: &str, token: &str, model: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
            model: model.to_string(),
        }
    }

    fn request(&self, directive: &str) -> anyhow::Result<Option<String>> {
        let body = ImageRequest {
            prompt: directive,
            model: &self.model,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            negative_prompt: NEGATIVE_PROMPT,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()?
            .error_for_status()?;
        let value: serde_json::Value = response.json()?;
        let url = value
            .get("url")
            .or_else(|| value.pointer("/data/0/url"))
            .and_then(|u| u.as_str())
            .map(str::to_string);
        Ok(url)
    }
}

impl ImageRenderer for HttpRenderer {
    fn render(&self, directive: &str) -> Option<String> {
        match self.request(directive) {
            Ok(Some(url)) => {
                debug!(url, "image rendered");
                Some(url)
            }
            Ok(None) => {
                warn!(endpoint = %self.endpoint, "image response carried no URL");
                None
            }
            Err(e) => {
                warn!(endpoint = %self.endpoint, error = %e, "image generation failed");
                None
            }
        }
    }
}
