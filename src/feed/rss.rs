use std::io::{BufReader, Read};

use rss::Channel;

use super::FeedEntry;

pub fn parse<R: Read>(reader: R) -> anyhow::Result<Vec<FeedEntry>> {
    let channel = Channel::read_from(BufReader::new(reader))?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedEntry {
            title: item.title().unwrap_or_default().trim().to_string(),
            link: item.link().unwrap_or_default().trim().to_string(),
            summary: item
                .description()
                .or(item.content())
                .unwrap_or_default()
                .to_string(),
            published: item.pub_date().map(str::to_string),
        })
        .collect())
}
