use anyhow::{Context, ensure};

use crate::briefing::TextModel;

pub(crate) fn cmd_models<M: TextModel + ?Sized>(model: &M) -> anyhow::Result<()> {
    let models = model
        .list_models()
        .context("failed to list models available to this key")?;
    ensure!(!models.is_empty(), "No models available to this key");
    for id in models {
        println!("{id}");
    }
    Ok(())
}
