use std::collections::HashSet;
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod dates;
mod download;
mod error;
mod extract;
mod fetch;
mod models;
mod pages;
mod reconcile;
mod sanitize;
mod tagging;
mod titles;

use cli::Cli;
use error::{AppError, DownloadError};
use fetch::HttpFetcher;
use models::Episode;
use pages::{PageScrapeState, PageScraper};
use reconcile::{ReconcileRules, Reconciler};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    if !cli.output_dir.is_dir() {
        return Err(AppError::Config(format!(
            "{} is not a directory",
            cli.output_dir.display()
        )));
    }

    let rules = match &cli.overrides {
        Some(path) => ReconcileRules::from_json_file(path)?,
        None => ReconcileRules::default(),
    };
    let reconciler = Reconciler::new(rules);

    let fetcher = HttpFetcher::new()?;
    let client = fetcher.client().clone();

    if !cli.dry_run {
        if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
            tracing::info!("Logging into my.libsyn.com");
            download::login(&client, username, password).await?;
        }
    }

    let state = PageScrapeState::new(cli.page, cli.offset, cli.limit);
    let mut scraper = PageScraper::new(fetcher, cli.archive_url.clone(), state, cli.dry_run);

    let mut pages_left = cli.page_limit.unwrap_or(u32::MAX);
    let mut seen = HashSet::new();

    while pages_left > 0 && scraper.fetch_next_page().await? {
        tracing::debug!("{} audio episodes accepted", scraper.episodes().len());
        let episodes = reconciler.reconcile_batch(scraper.take_episodes());

        for episode in episodes {
            let path = cli.output_dir.join(&episode.filename);
            if !seen.insert(episode.filename.clone()) || (!cli.dry_run && path.exists()) {
                return Err(AppError::DuplicateFilename(episode.filename));
            }

            if cli.dry_run {
                print_episode(&episode, cli.json)?;
                continue;
            }

            tracing::info!("Downloading {}...", episode.filename);
            match download::download_file(&client, &episode.file_url, &path).await {
                Ok(bytes) => tracing::debug!("Saved {} bytes", bytes),
                Err(DownloadError::NotFound(url)) => {
                    tracing::warn!("Skipping {}: {} returned 404", episode.filename, url);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            tagging::write_tags(&path, &episode)?;
            if cli.json {
                print_episode(&episode, true)?;
            }
        }

        pages_left -= 1;
    }

    Ok(())
}

fn print_episode(episode: &Episode, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(episode)?);
    } else {
        println!("\"{}\", \"{}\"", episode.title, episode.filename);
    }
    Ok(())
}
