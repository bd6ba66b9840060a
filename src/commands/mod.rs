pub mod add;
pub mod feed_ls;
pub mod generate;
pub mod models;
pub mod remove;
pub mod show;
pub mod stats;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub(crate) fn spinner() -> ProgressBar {
    let sp = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        sp.set_style(style);
    }
    sp.enable_steady_tick(Duration::from_millis(80));
    sp
}
