use std::path::{Path, PathBuf};

use bgmafia_scraping_utils::fs_json_util::write_json_pretty;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{catalog::CategoryKey, chrono_util::run_stamp, table::Record};

pub const LOGS_DIR: &str = "logs";
pub const DATA_DIR: &str = "data";
pub const CONFIG_DIR: &str = "config";
pub const HTML_DIR: &str = "html";
pub const CONFIG_FILE: &str = "config.yaml";

/// Creates `logs/`, `data/`, `config/` and `html/` under `base_dir`.
pub fn ensure_base_dirs(base_dir: &Path) -> anyhow::Result<()> {
    for dir in [LOGS_DIR, DATA_DIR, CONFIG_DIR, HTML_DIR] {
        fs_err::create_dir_all(base_dir.join(dir))?;
    }
    Ok(())
}

/// Which pages a records file covers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RecordScope {
    AllPages,
    Page(u32),
}

/// File names of one run, all prefixed with the run's timestamp.
#[derive(Clone, Debug)]
pub struct OutputLayout {
    base_dir: PathBuf,
    stamp: String,
}

impl OutputLayout {
    pub fn new(base_dir: impl Into<PathBuf>, started_at: NaiveDateTime) -> Self {
        Self {
            base_dir: base_dir.into(),
            stamp: run_stamp(started_at),
        }
    }

    pub fn html_path(&self, category: &CategoryKey, page: u32) -> PathBuf {
        self.html_dir(category)
            .join(format!("{}_page{page}.html", self.stamp))
    }

    pub fn table_path(&self, category: &CategoryKey, page: u32) -> PathBuf {
        self.html_dir(category)
            .join(format!("{}_page{page}_table.html", self.stamp))
    }

    pub fn records_path(&self, category: &CategoryKey, scope: RecordScope) -> PathBuf {
        let name = match scope {
            RecordScope::AllPages => format!("{}_all_pages_data.json", self.stamp),
            RecordScope::Page(page) => format!("{}_page{page}_data.json", self.stamp),
        };
        self.data_dir(category).join(name)
    }

    pub fn rankings_path(&self, category: &CategoryKey) -> PathBuf {
        self.data_dir(category)
            .join(format!("{}_rankings.json", self.stamp))
    }

    pub fn save_page_html(
        &self,
        category: &CategoryKey,
        page: u32,
        html: &str,
    ) -> anyhow::Result<PathBuf> {
        fs_err::create_dir_all(self.html_dir(category))?;
        let path = self.html_path(category, page);
        fs_err::write(&path, html)?;
        Ok(path)
    }

    pub fn save_table_html(
        &self,
        category: &CategoryKey,
        page: u32,
        fragment: &str,
    ) -> anyhow::Result<PathBuf> {
        fs_err::create_dir_all(self.html_dir(category))?;
        let path = self.table_path(category, page);
        fs_err::write(&path, fragment)?;
        Ok(path)
    }

    pub fn save_records(
        &self,
        category: &CategoryKey,
        scope: RecordScope,
        records: &[Record],
    ) -> anyhow::Result<PathBuf> {
        self.save_data(self.records_path(category, scope), &records)
    }

    pub fn save_rankings<T: Serialize>(
        &self,
        category: &CategoryKey,
        rankings: &T,
    ) -> anyhow::Result<PathBuf> {
        self.save_data(self.rankings_path(category), rankings)
    }

    fn save_data<T: Serialize>(&self, path: PathBuf, value: &T) -> anyhow::Result<PathBuf> {
        if let Some(dir) = path.parent() {
            fs_err::create_dir_all(dir)?;
        }
        write_json_pretty(&path, value)?;
        Ok(path)
    }

    fn html_dir(&self, category: &CategoryKey) -> PathBuf {
        self.base_dir.join(HTML_DIR).join(category.as_str())
    }

    fn data_dir(&self, category: &CategoryKey) -> PathBuf {
        self.base_dir.join(DATA_DIR).join(category.as_str())
    }
}
