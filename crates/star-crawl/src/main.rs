mod cli;
mod color;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use crawler_core::{Crawler, Fetcher, MemoryStore, SystemClock};
use github_backend::GitHubClient;
use output::{output_error, output_summary};
use postgres_store::PostgresStore;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Repositories listed after a dry run
const DRY_RUN_TOP: usize = 10;

fn main() -> ExitCode {
    let cli = Cli::parse();
    color::init(cli.color);
    init_tracing();

    if let Err(e) = run(&cli) {
        output_error(&e, cli.format);
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "star_crawl=info,crawler_core=info,github_backend=info,postgres_store=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.clone())?;
    config.merge_with_cli(cli);
    config.validate()?;

    let token = config.github.token.as_deref().unwrap_or_default();
    let client = GitHubClient::with_timeout(&config.github.endpoint, token, config.request_timeout());
    let clock = SystemClock;
    let fetcher = Fetcher::new(&client, &clock, config.fetch_options());
    let crawler = Crawler::new(fetcher, client.search_query())
        .with_mode(config.crawl.persist_mode)
        .with_resume(config.crawl.resume);

    info!(
        "Starting GitHub repos fetch (max {}, mode {:?})",
        config.crawl.max_repos, config.crawl.persist_mode
    );

    if cli.dry_run {
        let mut store = MemoryStore::new();
        let summary = crawler.run(&mut store)?;
        let top = store.top(DRY_RUN_TOP);
        output_summary(&summary, Some(top.as_slice()), cli.format);
        return Ok(());
    }

    let mut store =
        PostgresStore::new(&config.database).context("Failed to configure database")?;
    if cli.init_schema {
        store.create_schema().context("Failed to create tables")?;
    }
    let summary = crawler.run(&mut store)?;
    store.close().context("Failed to close database connection")?;

    output_summary(&summary, None, cli.format);
    Ok(())
}
