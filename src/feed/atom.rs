use std::io::{BufReader, Read};

use atom_syndication::Feed;

use super::FeedEntry;

pub fn parse<R: Read>(reader: R) -> anyhow::Result<Vec<FeedEntry>> {
    let feed = Feed::read_from(BufReader::new(reader))?;

    Ok(feed
        .entries()
        .iter()
        .map(|entry| FeedEntry {
            title: entry.title().as_str().trim().to_string(),
            link: entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or(entry.links().first())
                .map(|l| l.href().trim().to_string())
                .unwrap_or_default(),
            summary: entry
                .summary()
                .map(|s| s.as_str().to_string())
                .or_else(|| entry.content().and_then(|c| c.value()).map(str::to_string))
                .unwrap_or_default(),
            published: Some(entry.published().unwrap_or(entry.updated()).to_rfc3339()),
        })
        .collect())
}
