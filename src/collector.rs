use chrono::Local;
use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::feed::{self, FeedEntry};
use crate::feed_source::FeedDescriptor;

pub const ENTRIES_PER_FEED: usize = 5;
pub const SUMMARY_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: String,
}

/// Fetches every feed in order and flattens their first entries into articles.
///
/// A feed that cannot be fetched or parsed is logged and skipped.
pub fn collect(client: &reqwest::blocking::Client, feeds: &[FeedDescriptor]) -> Vec<Article> {
    let mut articles = Vec::new();
    for source in feeds {
        if source.url.trim().is_empty() {
            continue;
        }
        let entries = match feed::fetch(client, &source.url) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(feed = %source.name, url = %source.url, error = %e, "skipping feed");
                continue;
            }
        };
        let before = articles.len();
        articles.extend(articles_from(source, entries));
        debug!(feed = %source.name, count = articles.len() - before, "collected feed");
    }
    articles
}

fn articles_from(source: &FeedDescriptor, entries: Vec<FeedEntry>) -> Vec<Article> {
    let source_name = if source.name.trim().is_empty() {
        "Unknown Source".to_string()
    } else {
        source.name.clone()
    };

    entries
        .into_iter()
        .take(ENTRIES_PER_FEED)
        .filter(|e| !e.title.is_empty() && !e.link.is_empty())
        .map(|e| Article {
            source: source_name.clone(),
            title: e.title,
            link: e.link,
            summary: clean_summary(&e.summary),
            published: e
                .published
                .unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        })
        .collect()
}

fn strip_html(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Plain text of `raw`, cut to [`SUMMARY_CHARS`] characters.
pub fn clean_summary(raw: &str) -> String {
    truncate_chars(&strip_html(raw), SUMMARY_CHARS)
}
