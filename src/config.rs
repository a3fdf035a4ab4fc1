use std::{io, path::Path, time::Duration};

use anyhow::{bail, Context};
use bgmafia_scraping_utils::fs_json_util::{read_yaml, write_yaml};
use indexmap::IndexMap;
use itertools::Itertools;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{
    catalog::{builtin_catalog, Category, CategorySpec},
    table::DEFAULT_TABLE_CLASS,
};

/// Where extracted records of one category are written.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One `_all_pages_data.json` after every page of the category is processed.
    #[default]
    PerCategory,
    /// One `_page<N>_data.json` per fetched page.
    PerPage,
}

/// Uniform courtesy pause between two pages of the same category.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}
impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_secs: 0.5,
            max_secs: 1.0,
        }
    }
}
impl DelayRange {
    /// Both bounds must be durations, and `min_secs <= max_secs`.
    pub fn validate(&self) -> anyhow::Result<()> {
        let Self { min_secs, max_secs } = *self;
        Duration::try_from_secs_f64(min_secs)
            .and(Duration::try_from_secs_f64(max_secs))
            .with_context(|| format!("Invalid delay range: {min_secs}..={max_secs}"))?;
        if min_secs > max_secs {
            bail!("Invalid delay range: {min_secs}..={max_secs}");
        }
        Ok(())
    }

    /// Only call this on a validated range.
    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_secs_f64(rng.gen_range(self.min_secs..=self.max_secs))
    }
}

#[derive(Clone, Debug, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    #[builder(default)]
    pub headers: IndexMap<String, String>,
    #[builder(default)]
    pub cookies: IndexMap<String, String>,
    #[builder(default)]
    pub granularity: Granularity,
    #[builder(default = 10)]
    pub timeout_secs: u64,
    #[builder(default)]
    pub delay: DelayRange,
    #[builder(default = DEFAULT_TABLE_CLASS.to_owned())]
    pub table_class: String,
    #[builder(default)]
    pub write_rankings: bool,
    /// Replaces the built-in catalog when present.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategorySpec>>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

const SAMPLE_HEADERS: [(&str, &str); 16] = [
    ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7"),
    ("accept-language", "en-GB,en-US;q=0.9,en;q=0.8"),
    ("cache-control", "max-age=0"),
    ("priority", "u=0, i"),
    ("sec-ch-ua", r#""Google Chrome";v="131", "Chromium";v="131", "Not_A Brand";v="24""#),
    ("sec-ch-ua-arch", r#""x86""#),
    ("sec-ch-ua-bitness", r#""64""#),
    ("sec-ch-ua-full-version-list", r#""Google Chrome";v="131.0.6778.265", "Chromium";v="131.0.6778.265", "Not_A Brand";v="24.0.0.0""#),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-model", r#""""#),
    ("sec-ch-ua-platform", r#""macOS""#),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-user", "?1"),
    ("upgrade-insecure-requests", "1"),
    ("user-agent", "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36"),
];

impl ScraperConfig {
    /// Browser-like headers and no cookies.  Session cookies must be filled in by the user.
    pub fn sample() -> Self {
        Self::builder()
            .headers(
                SAMPLE_HEADERS
                    .iter()
                    .map(|&(k, v)| (k.to_owned(), v.to_owned()))
                    .collect(),
            )
            .build()
    }

    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        match fs_err::metadata(path) {
            Ok(_) => {
                let config = read_yaml(path)?;
                info!("Loaded configuration from {path:?}.");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::sample();
                write_yaml(path, &config)?;
                info!("Created a sample configuration file: {path:?}");
                Ok(config)
            }
            Err(e) => Err(e).context("Failed to inspect the configuration file"),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.delay.validate()?;
        if self.timeout_secs == 0 {
            bail!("Timeout must be positive");
        }
        if self.table_class.trim().is_empty() {
            bail!("Table class must not be empty");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Value for the `Cookie` header, or `None` when no cookie is configured.
    pub fn cookie_header(&self) -> Option<String> {
        (!self.cookies.is_empty()).then(|| {
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .join("; ")
        })
    }

    pub fn catalog(&self) -> anyhow::Result<Vec<Category>> {
        match &self.categories {
            Some(specs) => Ok(specs.iter().cloned().map(Category::from).collect()),
            None => builtin_catalog(),
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use rand::{rngs::StdRng, SeedableRng};

    use super::{DelayRange, Granularity, ScraperConfig};

    #[test]
    fn missing_file_is_created_with_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let created = ScraperConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert!(created.cookies.is_empty());
        assert!(created.headers.contains_key("user-agent"));

        let loaded = ScraperConfig::load_or_create(&path).unwrap();
        assert_eq!(
            loaded.headers.keys().collect::<Vec<_>>(),
            created.headers.keys().collect::<Vec<_>>()
        );
        assert_eq!(loaded.granularity, Granularity::PerCategory);
        assert_eq!(loaded.timeout_secs, 10);
    }

    #[test]
    fn partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(
            &path,
            "cookies:\n  sess3: abc\n  login: '1'\ngranularity: per_page\n",
        )
        .unwrap();
        let config = ScraperConfig::load_or_create(&path).unwrap();
        assert_eq!(config.granularity, Granularity::PerPage);
        assert_eq!(config.table_class, "default");
        assert_eq!(config.delay, DelayRange::default());
        assert_eq!(config.cookie_header().as_deref(), Some("sess3=abc; login=1"));
        assert!(config.headers.is_empty());
    }

    #[test]
    fn categories_override_catalog() {
        let yaml = r#"
categories:
  - key: strength
    name: Сила
    stat: strength
    urls:
      - https://example.test/strength
      - https://example.test/strength/2
"#;
        let config: ScraperConfig = serde_yaml::from_str(yaml).unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].pages().len(), 2);
        assert!(catalog[0].pages()[0].referer().is_none());
        assert_eq!(ScraperConfig::default().catalog().unwrap().len(), 5);
    }

    #[test]
    fn no_cookies_no_header() {
        assert_eq!(ScraperConfig::default().cookie_header(), None);
        let config = ScraperConfig::builder()
            .cookies(IndexMap::from([
                ("world_id".to_owned(), "4".to_owned()),
                ("my-application-browser-tab".to_owned(), String::new()),
            ]))
            .build();
        assert_eq!(
            config.cookie_header().as_deref(),
            Some("world_id=4; my-application-browser-tab=")
        );
    }

    #[test]
    fn validation() {
        assert!(ScraperConfig::default().validate().is_ok());
        let reversed = ScraperConfig::builder()
            .delay(DelayRange {
                min_secs: 2.0,
                max_secs: 1.0,
            })
            .build();
        assert!(reversed.validate().is_err());
        let no_timeout = ScraperConfig::builder().timeout_secs(0).build();
        assert!(no_timeout.validate().is_err());
    }

    #[test]
    fn delay_must_fit_in_a_duration() {
        for (min_secs, max_secs) in [(1e20, 1e20), (0.5, f64::INFINITY), (f64::NAN, 1.0), (-1.0, 1.0)] {
            let config = ScraperConfig::builder()
                .delay(DelayRange { min_secs, max_secs })
                .build();
            assert!(config.validate().is_err(), "{min_secs}..={max_secs}");
        }
        let long = DelayRange {
            min_secs: 3600.0,
            max_secs: 7200.0,
        };
        assert!(long.validate().is_ok());
    }

    #[test]
    fn delay_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = DelayRange::default();
        for _ in 0..100 {
            let d = range.sample(&mut rng).as_secs_f64();
            assert!((0.5..=1.0).contains(&d), "{d}");
        }
        let zero = DelayRange {
            min_secs: 0.0,
            max_secs: 0.0,
        };
        assert!(zero.sample(&mut rng).is_zero());
    }
}
