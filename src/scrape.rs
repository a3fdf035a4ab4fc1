use getset::{CopyGetters, Getters};
use tokio::time::sleep;

use crate::{
    catalog::{Category, CategoryKey},
    client::RankingClient,
    config::{DelayRange, Granularity, ScraperConfig},
    output::{OutputLayout, RecordScope},
    ranking::{parse_entries, CategoryRanking},
    reporter::{OutputKind, Reporter, ScrapeEvent},
    table::{Record, TableExtractor},
};

#[derive(Debug, Getters, CopyGetters)]
pub struct CategorySummary {
    #[getset(get = "pub")]
    key: CategoryKey,
    #[getset(get_copy = "pub")]
    records: usize,
    /// Numbers of the pages whose request failed.
    #[getset(get = "pub")]
    failed: Vec<u32>,
}

#[derive(Debug, Default, Getters)]
pub struct ScrapeSummary {
    #[getset(get = "pub")]
    categories: Vec<CategorySummary>,
}

impl ScrapeSummary {
    pub fn total_records(&self) -> usize {
        self.categories.iter().map(|c| c.records).sum()
    }

    pub fn failed_pages(&self) -> usize {
        self.categories.iter().map(|c| c.failed.len()).sum()
    }
}

/// Walks categories and their pages in order, one request at a time.
pub struct Scraper {
    client: RankingClient,
    extractor: TableExtractor,
    layout: OutputLayout,
    granularity: Granularity,
    delay: DelayRange,
    write_rankings: bool,
}

impl Scraper {
    pub fn new(config: &ScraperConfig, layout: OutputLayout) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            client: RankingClient::new(config)?,
            extractor: TableExtractor::new(&config.table_class)?,
            layout,
            granularity: config.granularity,
            delay: config.delay,
            write_rankings: config.write_rankings,
        })
    }

    /// Failed requests are reported and skipped.  Any other error aborts the run.
    pub async fn run(
        &self,
        categories: &[Category],
        reporter: &mut impl Reporter,
    ) -> anyhow::Result<ScrapeSummary> {
        let mut summary = ScrapeSummary::default();
        for category in categories {
            let result = self.scrape_category(category, reporter).await?;
            summary.categories.push(result);
        }
        reporter.report(ScrapeEvent::Finished { summary: &summary });
        Ok(summary)
    }

    pub async fn scrape_category(
        &self,
        category: &Category,
        reporter: &mut impl Reporter,
    ) -> anyhow::Result<CategorySummary> {
        reporter.report(ScrapeEvent::CategoryStarted { category });
        let key = category.key();
        let mut records = Vec::<Record>::new();
        let mut ranking_rows = vec![];
        let mut failed = vec![];

        for (i, page) in category.pages().iter().enumerate() {
            if i > 0 {
                let pause = self.delay.sample(&mut rand::thread_rng());
                reporter.report(ScrapeEvent::Pausing { category, pause });
                sleep(pause).await;
            }

            reporter.report(ScrapeEvent::Requesting { category, page });
            let html = match self.client.fetch(page).await {
                Ok(html) => html,
                Err(error) => {
                    reporter.report(ScrapeEvent::RequestFailed {
                        category,
                        page,
                        error: &error,
                    });
                    failed.push(page.number());
                    continue;
                }
            };

            let path = self.layout.save_page_html(key, page.number(), &html)?;
            reporter.report(ScrapeEvent::FileWritten {
                kind: OutputKind::PageHtml,
                path: &path,
            });

            let extract = self.extractor.extract_page(&html, page.number());
            if let Some(fragment) = &extract.table_html {
                let path = self.layout.save_table_html(key, page.number(), fragment)?;
                reporter.report(ScrapeEvent::FileWritten {
                    kind: OutputKind::TableHtml,
                    path: &path,
                });
            }
            reporter.report(ScrapeEvent::PageExtracted {
                category,
                page,
                records: extract.records.len(),
            });

            if self.granularity == Granularity::PerPage && !extract.records.is_empty() {
                let path = self.layout.save_records(
                    key,
                    RecordScope::Page(page.number()),
                    &extract.records,
                )?;
                reporter.report(ScrapeEvent::FileWritten {
                    kind: OutputKind::Records,
                    path: &path,
                });
            }
            records.extend(extract.records);
            if self.write_rankings {
                ranking_rows.extend(extract.cells);
            }
        }

        if self.granularity == Granularity::PerCategory && !records.is_empty() {
            let path = self
                .layout
                .save_records(key, RecordScope::AllPages, &records)?;
            reporter.report(ScrapeEvent::FileWritten {
                kind: OutputKind::Records,
                path: &path,
            });
        }
        let entries = parse_entries(&ranking_rows);
        if !entries.is_empty() {
            let ranking = CategoryRanking {
                category: key,
                stat: category.stat(),
                entries,
            };
            let path = self.layout.save_rankings(key, &ranking)?;
            reporter.report(ScrapeEvent::FileWritten {
                kind: OutputKind::Rankings,
                path: &path,
            });
        }

        reporter.report(ScrapeEvent::CategoryFinished {
            category,
            records: records.len(),
        });
        Ok(CategorySummary {
            key: key.clone(),
            records: records.len(),
            failed,
        })
    }
}
