use anyhow::{anyhow, ensure};
use docstore::Backend;
use indicatif::ProgressBar;
use reqwest::blocking::Client;
use tracing::info;

use crate::briefing::{self, Briefing, TextModel};
use crate::collector;
use crate::config::Config;
use crate::image::ImageRenderer;
use crate::store::{Newsroom, today};

#[derive(Debug)]
pub(crate) struct Generated {
    pub briefing: Briefing,
    pub article_count: usize,
}

/// Collects the feeds, writes the briefing and stores it under `date`.
pub(crate) fn run_generate<B: Backend, M: TextModel + ?Sized>(
    room: &mut Newsroom<B>,
    client: &Client,
    model: &M,
    candidates: &[String],
    images: Option<&dyn ImageRenderer>,
    date: &str,
    pb: &ProgressBar,
) -> anyhow::Result<Generated> {
    ensure!(!room.feeds.is_empty(), "No feeds registered");

    pb.set_message(format!("Collecting news from {} feeds...", room.feeds.len()));
    let articles = collector::collect(client, &room.feeds);
    ensure!(
        !articles.is_empty(),
        "no articles were collected; check the feed URLs"
    );
    info!(count = articles.len(), "articles collected");

    pb.set_message(format!("Writing the briefing from {} articles...", articles.len()));
    let briefing = briefing::generate(model, candidates, images, &articles)
        .map_err(|e| anyhow!(e.report()))?;

    pb.set_message("Saving...");
    room.record_briefing(date, &briefing, articles.len())?;

    Ok(Generated {
        briefing,
        article_count: articles.len(),
    })
}

pub(crate) fn cmd_generate(config: &Config) -> anyhow::Result<()> {
    let model = config.text_model()?;
    let images = config.image_renderer()?;
    let candidates = config.candidate_models();
    let mut room = Newsroom::open(config.open_store()?);
    let client = crate::http::http_client()?;
    let date = today();

    let sp = super::spinner();
    let result = run_generate(
        &mut room,
        &client,
        &model,
        &candidates,
        images.as_deref(),
        &date,
        &sp,
    );
    sp.finish_and_clear();

    let generated = result?;
    eprintln!(
        "Briefing for {date} saved ({} articles, {}).",
        generated.article_count, generated.briefing.model
    );
    if let Some(url) = &generated.briefing.image_url {
        eprintln!("Infographic: {url}");
    }
    Ok(())
}
