use std::fmt::Write;
use std::io::IsTerminal;

use docstore::Backend;

use crate::store::{BriefingRecord, Newsroom, Stats};

struct Palette {
    bold: &'static str,
    dim: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(color: bool) -> Self {
        if color {
            Self {
                bold: "\x1b[1m",
                dim: "\x1b[2m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                bold: "",
                dim: "",
                reset: "",
            }
        }
    }
}

fn render_record(out: &mut String, date: &str, record: &BriefingRecord, p: &Palette) {
    let _ = writeln!(out, "{}Briefing for {date}{}", p.bold, p.reset);
    let _ = writeln!(
        out,
        "{}Updated {} from {} articles{}",
        p.dim, record.updated_at, record.article_count, p.reset
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", record.content.trim_end());
    if let Some(url) = &record.image_url {
        let _ = writeln!(out);
        let _ = writeln!(out, "Infographic: {url}");
    }
}

pub(crate) fn render(
    record: Option<&BriefingRecord>,
    latest: Option<&str>,
    stats: &Stats,
    date: &str,
    color: bool,
) -> String {
    let p = Palette::new(color);
    let mut out = String::new();

    match (record, latest) {
        (Some(record), _) => render_record(&mut out, date, record, &p),
        (None, Some(latest)) => {
            let _ = writeln!(out, "No briefing for {date} yet.");
            let _ = writeln!(out, "Latest briefing: {latest} (newsroom show --date {latest})");
        }
        (None, None) => {
            let _ = writeln!(out, "No briefing for {date} yet.");
            let _ = writeln!(out, "Run `newsroom generate` to create the first one.");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}Total visits: {}{}", p.dim, stats.visits, p.reset);
    out
}

pub(crate) fn cmd_show<B: Backend>(room: &Newsroom<B>, date: &str) -> anyhow::Result<()> {
    let color = std::io::stdout().is_terminal();
    let latest = room.latest_briefing().map(|(d, _)| d.as_str());
    print!(
        "{}",
        render(room.briefings.get(date), latest, &room.stats, date, color)
    );
    Ok(())
}
