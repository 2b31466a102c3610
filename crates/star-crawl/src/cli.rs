use clap::{Parser, ValueEnum};
use crawler_core::PersistMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "star-crawl",
    version,
    about = "Crawl starred GitHub repositories into PostgreSQL"
)]
pub struct Cli {
    /// Output format for the final summary
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to colorize output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a TOML config file
    #[arg(long, env = "STAR_CRAWL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum number of repositories to crawl (overrides CRAWL_MAX_REPOS)
    #[arg(long, value_name = "N")]
    pub max_repos: Option<usize>,

    /// Pause between requests in seconds (overrides CRAWL_REQUEST_DELAY)
    #[arg(long, value_name = "SECONDS")]
    pub request_delay: Option<u64>,

    /// Give up after this many consecutive failed requests (overrides CRAWL_MAX_RETRIES)
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// When fetched repositories are written (overrides CRAWL_PERSIST_MODE)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Start from the first page even if a checkpoint exists
    #[arg(long)]
    pub no_resume: bool,

    /// Crawl into memory and print the top repositories instead of writing to PostgreSQL
    #[arg(long)]
    pub dry_run: bool,

    /// Create the tables before crawling
    #[arg(long, conflicts_with = "dry_run")]
    pub init_schema: bool,
}

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write each page as it arrives and checkpoint the cursor
    #[value(name = "per-page")]
    PerPage,
    /// Write everything once at the end
    Batch,
}

impl From<Mode> for PersistMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::PerPage => PersistMode::PerPage,
            Mode::Batch => PersistMode::Batch,
        }
    }
}

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Debug, Copy, Default)]
pub enum ColorChoice {
    /// Colorize output if stdout is a terminal
    #[default]
    Auto,
    /// Always colorize output
    Always,
    /// Never colorize output
    Never,
}
