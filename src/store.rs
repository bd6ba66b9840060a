use std::collections::BTreeMap;

use anyhow::{Context, bail, ensure};
use chrono::Local;
use docstore::{Backend, DocumentStore};
use serde::{Deserialize, Serialize};

use crate::briefing::Briefing;
use crate::feed_source::{FeedDescriptor, default_feeds};

pub const FEEDS_PATH: &str = "data/feeds.json";
pub const BRIEFINGS_PATH: &str = "data/news_data.json";
pub const STATS_PATH: &str = "data/stats.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingRecord {
    pub updated_at: String,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub article_count: usize,
}

/// Briefings keyed by `YYYY-MM-DD`.
pub type Briefings = BTreeMap<String, BriefingRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub visits: u64,
    #[serde(default)]
    pub last_updated: String,
}

pub fn now_string() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Everything a session works with, loaded once and saved on every change.
pub(crate) struct Newsroom<B: Backend> {
    docs: DocumentStore<B>,
    pub feeds: Vec<FeedDescriptor>,
    pub briefings: Briefings,
    pub stats: Stats,
}

impl<B: Backend> Newsroom<B> {
    pub fn open(mut docs: DocumentStore<B>) -> Self {
        let feeds: Vec<FeedDescriptor> = docs.read(FEEDS_PATH).unwrap_or_else(default_feeds);
        let briefings: Briefings = docs.read(BRIEFINGS_PATH).unwrap_or_default();
        let stats: Stats = docs.read(STATS_PATH).unwrap_or_default();
        Self {
            docs,
            feeds,
            briefings,
            stats,
        }
    }

    fn save_feeds(&mut self, message: &str) -> anyhow::Result<()> {
        self.docs
            .write(FEEDS_PATH, &self.feeds, message)
            .with_context(|| format!("failed to save {FEEDS_PATH}"))
    }

    pub fn add_feed(&mut self, name: &str, url: &str) -> anyhow::Result<()> {
        let (name, url) = (name.trim(), url.trim());
        ensure!(!name.is_empty(), "feed name must not be empty");
        ensure!(!url.is_empty(), "feed URL must not be empty");
        self.feeds.push(FeedDescriptor::new(name, url));
        self.save_feeds("Add RSS Feed")
    }

    /// Drops every feed called `name`.
    pub fn remove_feed(&mut self, name: &str) -> anyhow::Result<usize> {
        let before = self.feeds.len();
        self.feeds.retain(|f| f.name != name);
        let removed = before - self.feeds.len();
        if removed == 0 {
            bail!("Feed not found: {}", name);
        }
        self.save_feeds("Remove RSS Feed")?;
        Ok(removed)
    }

    pub fn record_briefing(
        &mut self,
        date: &str,
        briefing: &Briefing,
        article_count: usize,
    ) -> anyhow::Result<()> {
        self.briefings.insert(
            date.to_string(),
            BriefingRecord {
                updated_at: now_string(),
                content: briefing.text.clone(),
                image_url: briefing.image_url.clone(),
                article_count,
            },
        );
        self.docs
            .write(BRIEFINGS_PATH, &self.briefings, &format!("Update News {date}"))
            .with_context(|| format!("failed to save {BRIEFINGS_PATH}"))
    }

    pub fn record_visit(&mut self) -> anyhow::Result<()> {
        self.stats.visits += 1;
        self.stats.last_updated = now_string();
        self.docs
            .write(STATS_PATH, &self.stats, "Update stats")
            .with_context(|| format!("failed to save {STATS_PATH}"))
    }

    /// The most recent briefing, if any.
    pub fn latest_briefing(&self) -> Option<(&String, &BriefingRecord)> {
        self.briefings.iter().next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docstore::GitBackend;
    use tempfile::TempDir;

    fn newsroom(dir: &TempDir) -> Newsroom<GitBackend> {
        let backend = GitBackend::open_or_init(dir.path()).unwrap();
        Newsroom::open(DocumentStore::new(backend))
    }

    fn briefing(text: &str) -> Briefing {
        Briefing {
            text: text.to_string(),
            image_url: Some("https://img/1.png".to_string()),
            model: "gemini-2.5-flash".to_string(),
        }
    }

    #[test]
    fn test_open_empty_store_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let room = newsroom(&dir);
        assert_eq!(room.feeds, default_feeds());
        assert!(room.briefings.is_empty());
        assert_eq!(room.stats, Stats::default());
    }

    #[test]
    fn test_add_feed_persists() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        room.add_feed("Hacker News", "https://news.ycombinator.com/rss")
            .unwrap();

        let reopened = newsroom(&dir);
        assert_eq!(reopened.feeds.len(), 2);
        assert_eq!(reopened.feeds[1].name, "Hacker News");
    }

    #[test]
    fn test_add_feed_rejects_blank() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        assert!(room.add_feed(" ", "https://x/rss").is_err());
        assert!(room.add_feed("X", "").is_err());
        assert_eq!(room.feeds.len(), 1);
    }

    #[test]
    fn test_remove_feed_by_name_removes_all_matches() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        room.add_feed("Dup", "https://a/rss").unwrap();
        room.add_feed("Dup", "https://b/rss").unwrap();

        assert_eq!(room.remove_feed("Dup").unwrap(), 2);
        let reopened = newsroom(&dir);
        assert_eq!(reopened.feeds, default_feeds());
    }

    #[test]
    fn test_remove_unknown_feed() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        let err = room.remove_feed("Nope").unwrap_err();
        assert!(err.to_string().contains("Feed not found"));
    }

    #[test]
    fn test_record_briefing_overwrites_same_day() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        room.record_briefing("2024-01-15", &briefing("first"), 3)
            .unwrap();
        room.record_briefing("2024-01-15", &briefing("second"), 4)
            .unwrap();

        let reopened = newsroom(&dir);
        assert_eq!(reopened.briefings.len(), 1);
        let record = &reopened.briefings["2024-01-15"];
        assert_eq!(record.content, "second");
        assert_eq!(record.article_count, 4);
        assert_eq!(record.image_url.as_deref(), Some("https://img/1.png"));
    }

    #[test]
    fn test_latest_briefing() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        room.record_briefing("2024-01-14", &briefing("older"), 1)
            .unwrap();
        room.record_briefing("2024-01-15", &briefing("newer"), 1)
            .unwrap();

        let (date, record) = room.latest_briefing().unwrap();
        assert_eq!(date, "2024-01-15");
        assert_eq!(record.content, "newer");
    }

    #[test]
    fn test_record_visit() {
        let dir = TempDir::new().unwrap();
        let mut room = newsroom(&dir);
        room.record_visit().unwrap();
        room.record_visit().unwrap();

        let reopened = newsroom(&dir);
        assert_eq!(reopened.stats.visits, 2);
        assert!(!reopened.stats.last_updated.is_empty());
    }

    #[test]
    fn test_concurrent_briefing_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let mut first = newsroom(&dir);
        let mut second = newsroom(&dir);

        second
            .record_briefing("2024-01-14", &briefing("kept"), 2)
            .unwrap();
        let err = first
            .record_briefing("2024-01-15", &briefing("stale"), 3)
            .unwrap_err();
        assert!(err.to_string().contains(BRIEFINGS_PATH));

        let reopened = newsroom(&dir);
        assert_eq!(reopened.briefings.len(), 1);
        assert_eq!(reopened.briefings["2024-01-14"].content, "kept");
    }

    #[test]
    fn test_briefing_without_image_field_loads() {
        let json = r#"{"2024-01-15": {"updated_at": "2024-01-15 09:00:00", "content": "x", "article_count": 2}}"#;
        let briefings: Briefings = serde_json::from_str(json).unwrap();
        assert_eq!(briefings["2024-01-15"].image_url, None);
    }
}
