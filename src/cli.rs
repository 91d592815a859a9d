use clap::Parser;
use std::path::PathBuf;

use crate::pages::ARCHIVE_URL;

#[derive(Parser, Debug)]
#[command(name = "handa-archiver")]
#[command(author, version, about = "Download and tag the Hamish & Andy podcast archive")]
pub struct Cli {
    /// Page number to begin downloading from
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    /// Maximum number of episodes to download
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of episodes to skip
    #[arg(long, default_value_t = 0)]
    pub offset: usize,

    /// Maximum number of pages to download
    #[arg(long)]
    pub page_limit: Option<u32>,

    /// Username for my.libsyn.com (only required for premium episodes)
    #[arg(long, env = "HANDA_USERNAME")]
    pub username: Option<String>,

    /// Password for my.libsyn.com (only required for premium episodes)
    #[arg(long, env = "HANDA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Parse and reconcile everything, but download nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print episodes as JSON lines
    #[arg(long)]
    pub json: bool,

    /// JSON file replacing the built-in date override tables
    #[arg(long)]
    pub overrides: Option<PathBuf>,

    /// Directory episodes are saved into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Listing page URL; the page number is appended
    #[arg(long, default_value = ARCHIVE_URL)]
    pub archive_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
