pub mod atom;
pub mod rss;

/// One entry as the feed published it. Missing text fields are empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<String>,
}

pub fn fetch(client: &reqwest::blocking::Client, url: &str) -> anyhow::Result<Vec<FeedEntry>> {
    let response = client.get(url).send()?.error_for_status()?;
    let bytes = response.bytes()?;
    let text = String::from_utf8_lossy(&bytes);

    if text.contains("<rss") || text.contains("<rdf:RDF") {
        rss::parse(&bytes[..])
    } else {
        // unmarked documents are tried as Atom first; the Atom error is kept
        atom::parse(&bytes[..]).or_else(|e| rss::parse(&bytes[..]).map_err(|_| e))
    }
}
