use anyhow::ensure;

use crate::feed_source::FeedDescriptor;

pub(crate) fn format_feeds(feeds: &[FeedDescriptor]) -> String {
    feeds
        .iter()
        .map(|f| format!("{}\t{}\n", f.name, f.url))
        .collect()
}

pub(crate) fn cmd_feed_ls(feeds: &[FeedDescriptor]) -> anyhow::Result<()> {
    ensure!(!feeds.is_empty(), "No feeds registered");
    print!("{}", format_feeds(feeds));
    Ok(())
}
