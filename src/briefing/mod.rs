pub mod gemini;

use itertools::Itertools;
use thiserror::Error;
use tracing::{info, warn};

use crate::collector::Article;
use crate::fallback::first_success;
use crate::image::ImageRenderer;

pub use gemini::Gemini;

/// Separates the briefing from the image description in a model response.
pub const IMAGE_SEPARATOR: &str = "---IMAGE_PROMPT---";

pub const DEFAULT_MODELS: [&str; 9] = [
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash",
    "gemini-2.0-flash-001",
    "gemini-2.0-flash-exp",
    "gemini-flash-latest",
    "gemini-pro-latest",
    "gemini-2.5-flash-lite",
    "gemini-2.0-flash-lite",
];

const PROBE_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The model does not exist or cannot generate content.
    #[error("model {model} is unavailable: {message}")]
    Unavailable { model: String, message: String },

    #[error("model API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model returned no text")]
    EmptyResponse,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("there are no articles to analyze")]
    NothingToAnalyze,

    #[error("every candidate model failed; last error: {last_error}")]
    AllModelsFailed {
        last_error: String,
        /// Models the credentials can use, from a live probe. Empty when the
        /// probe itself failed.
        available: Vec<String>,
    },
}

/// A text generation service addressed by model id.
pub trait TextModel {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError>;

    /// Model ids usable for content generation.
    fn list_models(&self) -> Result<Vec<String>, ModelError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub text: String,
    pub image_url: Option<String>,
    /// The candidate that produced the text.
    pub model: String,
}

pub fn build_prompt(articles: &[Article]) -> String {
    let mut listing = String::new();
    for (i, article) in articles.iter().enumerate() {
        listing.push_str(&format!(
            "{}. [{}] {} : {}\n   {}\n",
            i + 1,
            article.source,
            article.title,
            article.summary,
            article.link
        ));
    }

    format!(
        "You are an editor covering the technology industry. Write a daily IT news briefing from the stories below.

[Requirements]
1. Headline: \"Today's key trends\" as a three-line summary
2. Group the stories by category (AI, semiconductors, mobile, ...)
3. Give every story a one-line summary and its original link
4. Format the briefing as markdown

After the briefing, write a line containing only {IMAGE_SEPARATOR}
and then one line of English describing an infographic that captures the day's news.

[Stories]
{listing}"
    )
}

/// Splits a model response into the briefing and the optional image directive.
pub fn split_response(raw: &str) -> (String, Option<String>) {
    let mut parts = raw.split(IMAGE_SEPARATOR);
    let text = parts.next().unwrap_or_default().trim().to_string();
    let directive = parts
        .next()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    (text, directive)
}

/// Summarizes `articles` with the first candidate model that answers.
pub fn generate<M: TextModel + ?Sized>(
    model: &M,
    candidates: &[String],
    images: Option<&dyn ImageRenderer>,
    articles: &[Article],
) -> Result<Briefing, BriefingError> {
    if articles.is_empty() {
        return Err(BriefingError::NothingToAnalyze);
    }
    let prompt = build_prompt(articles);

    let attempt = first_success(candidates, |candidate| {
        info!(model = %candidate, "requesting briefing");
        model.generate(candidate, &prompt).inspect_err(|e| {
            warn!(model = %candidate, error = %e, "model failed; trying the next one");
        })
    });

    let (chosen, raw) = match attempt {
        Ok(found) => found,
        Err(exhausted) => {
            warn!(attempts = exhausted.attempts, "no candidate model answered");
            let last_error = exhausted
                .last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candidate models configured".to_string());
            return Err(BriefingError::AllModelsFailed {
                last_error,
                available: probe(model),
            });
        }
    };

    let (text, directive) = split_response(&raw);
    let image_url = match (directive, images) {
        (Some(directive), Some(renderer)) => renderer.render(&directive),
        _ => None,
    };

    Ok(Briefing {
        text,
        image_url,
        model: chosen.clone(),
    })
}

fn probe<M: TextModel + ?Sized>(model: &M) -> Vec<String> {
    match model.list_models() {
        Ok(models) => models.into_iter().take(PROBE_LIMIT).collect(),
        Err(e) => {
            warn!(error = %e, "could not list available models");
            Vec::new()
        }
    }
}

impl BriefingError {
    /// A multi-line explanation for the operator.
    pub fn report(&self) -> String {
        match self {
            BriefingError::AllModelsFailed {
                last_error,
                available,
            } => {
                let available = if available.is_empty() {
                    "could not be determined (check the API key)".to_string()
                } else {
                    available.iter().join(", ")
                };
                format!(
                    "every candidate model failed\n\nlast error: {last_error}\n\nmodels available to this key: {available}\n\nadd one of them to --models (NEWSROOM_MODELS)"
                )
            }
            other => other.to_string(),
        }
    }
}
