use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use bgmafia_scraping::{
    catalog::{select_categories, CategoryKey},
    chrono_util::local_now,
    config::{Granularity, ScraperConfig},
    logging,
    output::{ensure_base_dirs, OutputLayout, CONFIG_DIR, CONFIG_FILE, LOGS_DIR},
    reporter::LogReporter,
    scrape::Scraper,
};
use chrono::NaiveDateTime;
use clap::Parser;
use log::{error, info, warn};

#[derive(Parser)]
struct Opts {
    /// Directory holding `logs/`, `data/`, `config/` and `html/`.
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,
    /// Defaults to `<base-dir>/config/config.yaml`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the granularity written in the configuration file.
    #[arg(long, value_enum)]
    granularity: Option<Granularity>,
    /// Scrape only these categories.  Repeatable.
    #[arg(long = "category")]
    categories: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();
    let started_at = local_now();

    let logs = ensure_base_dirs(&opts.base_dir)
        .and_then(|()| logging::init(&opts.base_dir.join(LOGS_DIR), started_at.date()));
    if let Err(e) = logs {
        eprintln!("Failed to set up logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(&opts, started_at).await {
        Ok(total) => {
            info!("Program finished successfully. Total records extracted: {total}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Critical error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(opts: &Opts, started_at: NaiveDateTime) -> anyhow::Result<usize> {
    info!("Starting data extraction");
    let config_path = opts
        .config
        .clone()
        .unwrap_or_else(|| opts.base_dir.join(CONFIG_DIR).join(CONFIG_FILE));
    let mut config = ScraperConfig::load_or_create(&config_path)
        .with_context(|| format!("Failed to load configuration from {config_path:?}"))?;
    if let Some(granularity) = opts.granularity {
        config.granularity = granularity;
    }
    if config.cookies.is_empty() {
        warn!("No cookies configured in {config_path:?}; the site may refuse ranking pages without a session.");
    }

    let keys = opts
        .categories
        .iter()
        .map(|key| CategoryKey::from(key.as_str()))
        .collect::<Vec<_>>();
    let categories = select_categories(config.catalog()?, &keys)?;

    let scraper = Scraper::new(&config, OutputLayout::new(&opts.base_dir, started_at))?;
    let summary = scraper.run(&categories, &mut LogReporter).await?;
    Ok(summary.total_records())
}
