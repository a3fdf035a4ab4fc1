use std::{path::Path, time::Duration};

use log::{debug, error, info, warn};
use strum::Display;

use crate::{
    catalog::{Category, PageTarget},
    client::FetchError,
    scrape::ScrapeSummary,
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum OutputKind {
    #[strum(serialize = "page HTML")]
    PageHtml,
    #[strum(serialize = "table HTML")]
    TableHtml,
    #[strum(serialize = "records")]
    Records,
    #[strum(serialize = "rankings")]
    Rankings,
}

/// Progress of a run, as seen by a [`Reporter`].
#[derive(Debug)]
pub enum ScrapeEvent<'a> {
    CategoryStarted {
        category: &'a Category,
    },
    /// Taken before every page of a category except the first.
    Pausing {
        category: &'a Category,
        pause: Duration,
    },
    Requesting {
        category: &'a Category,
        page: &'a PageTarget,
    },
    RequestFailed {
        category: &'a Category,
        page: &'a PageTarget,
        error: &'a FetchError,
    },
    PageExtracted {
        category: &'a Category,
        page: &'a PageTarget,
        records: usize,
    },
    FileWritten {
        kind: OutputKind,
        path: &'a Path,
    },
    CategoryFinished {
        category: &'a Category,
        records: usize,
    },
    Finished {
        summary: &'a ScrapeSummary,
    },
}

pub trait Reporter {
    fn report(&mut self, event: ScrapeEvent<'_>);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, event: ScrapeEvent<'_>) {
        (**self).report(event)
    }
}

/// Forwards every event to the `log` facade.
#[derive(Clone, Copy, Default, Debug)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, event: ScrapeEvent<'_>) {
        match event {
            ScrapeEvent::CategoryStarted { category } => {
                info!("Processing category: {} ({})", category.name(), category.key())
            }
            ScrapeEvent::Pausing { pause, .. } => {
                debug!("Waiting {:.2}s before the next page", pause.as_secs_f64())
            }
            ScrapeEvent::Requesting { page, .. } => {
                info!("Sending request to: {}", page.url())
            }
            ScrapeEvent::RequestFailed { page, error, .. } => {
                error!("Request to {} failed: {error}", page.url())
            }
            ScrapeEvent::PageExtracted { page, records, .. } => match records {
                0 => warn!("No table data found on page {}", page.number()),
                n => info!("Extracted {n} records from page {}", page.number()),
            },
            ScrapeEvent::FileWritten { kind, path } => info!("Saved {kind}: {path:?}"),
            ScrapeEvent::CategoryFinished { category, records } => {
                info!("Category {} done: {records} records", category.name())
            }
            ScrapeEvent::Finished { summary } => info!(
                "Scraping finished. Total records: {} ({} failed pages)",
                summary.total_records(),
                summary.failed_pages()
            ),
        }
    }
}
