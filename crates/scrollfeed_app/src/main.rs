mod runner;
mod settings;

use std::path::PathBuf;

use clap::Parser;
use feed_logging::LogDestination;
use log::LevelFilter;
use scrollfeed_core::{ConnectionClass, ContentType};

/// Pages through a JSON list endpoint the way an infinite-scroll view would.
#[derive(Debug, Parser)]
#[command(name = "scrollfeed", version, about)]
pub(crate) struct Args {
    /// Endpoint serving pages (`?page=N&page_size=M` is appended).
    #[arg(long)]
    pub url: String,

    /// List type; overrides the settings file.
    #[arg(long)]
    pub content_type: Option<ContentType>,

    /// RON settings file.
    #[arg(long, default_value = settings::DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Resolve paging for a narrow (mobile) viewport.
    #[arg(long)]
    pub narrow: bool,

    /// Effective connection class: slow-2g, 2g, 3g, 4g or unknown.
    #[arg(long, default_value = "unknown")]
    pub connection: ConnectionClass,

    /// Stop after this many pages.
    #[arg(long, default_value_t = 5)]
    pub pages: u32,

    /// Log destination: terminal, file or both.
    #[arg(long, default_value = "terminal")]
    pub log: LogDestination,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    feed_logging::initialize(args.log, LevelFilter::Info);
    runner::run(args).await
}
