use serde::{Deserialize, Serialize};

/// A named syndication source. The name is what removal matches on; nothing
/// keeps it unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl FeedDescriptor {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn default_feeds() -> Vec<FeedDescriptor> {
    vec![FeedDescriptor::new(
        "Google News IT",
        "https://news.google.com/rss/search?q=IT&hl=ko&gl=KR&ceid=KR%3Ako",
    )]
}
