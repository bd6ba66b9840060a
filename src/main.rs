mod briefing;
mod collector;
mod commands;
mod config;
mod fallback;
mod feed;
mod feed_source;
mod http;
mod image;
mod store;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Config;
use store::{Newsroom, today};

/// Daily IT news briefings written by a language model from RSS feeds
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stored briefing
    Show {
        /// Day to show as YYYY-MM-DD, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Manage the feeds briefings are written from
    Feed {
        #[command(subcommand)]
        command: FeedCommand,
    },
    /// Collect today's news and write a new briefing
    Generate,
    /// Print the visit counter
    Stats {
        /// Count a visit before printing
        #[arg(long)]
        bump: bool,
    },
    /// List the models the API key can use
    Models,
}

#[derive(Subcommand)]
enum FeedCommand {
    /// List feeds as name and URL
    Ls,
    /// Add a feed
    Add {
        /// Label shown as the source of its articles
        name: String,
        /// RSS or Atom URL
        url: String,
    },
    /// Remove every feed with this name
    Remove { name: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = &args.config;

    match args.command {
        None => {
            let room = Newsroom::open(config.open_store()?);
            commands::show::cmd_show(&room, &today())
        }
        Some(Command::Show { date }) => {
            let room = Newsroom::open(config.open_store()?);
            let date = date.unwrap_or_else(today);
            commands::show::cmd_show(&room, &date)
        }
        Some(Command::Feed { command }) => {
            let mut room = Newsroom::open(config.open_store()?);
            match command {
                FeedCommand::Ls => commands::feed_ls::cmd_feed_ls(&room.feeds),
                FeedCommand::Add { name, url } => commands::add::cmd_add(&mut room, &name, &url),
                FeedCommand::Remove { name } => commands::remove::cmd_remove(&mut room, &name),
            }
        }
        Some(Command::Generate) => commands::generate::cmd_generate(config),
        Some(Command::Stats { bump }) => {
            let mut room = Newsroom::open(config.open_store()?);
            commands::stats::cmd_stats(&mut room, bump)
        }
        Some(Command::Models) => commands::models::cmd_models(&config.text_model()?),
    }
}
