use anyhow::{bail, Context};
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

/// Which player statistic a ranking table is sorted by.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatType {
    Experience,
    Victories,
    Strength,
    Intelligence,
    Sex,
}

/// Short name of a category, also used as its output directory name.
#[derive(
    Clone, PartialEq, Eq, Hash, Debug, derive_more::From, derive_more::Display, Serialize, Deserialize,
)]
pub struct CategoryKey(String);
impl CategoryKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl From<&str> for CategoryKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// One page of a category, numbered from 1.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct PageTarget {
    #[getset(get_copy = "pub")]
    number: u32,
    #[getset(get = "pub")]
    url: Url,
    #[getset(get = "pub")]
    referer: Option<Url>,
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Category {
    #[getset(get = "pub")]
    key: CategoryKey,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    stat: StatType,
    #[getset(get = "pub")]
    pages: Vec<PageTarget>,
}

impl Category {
    /// Builds the referer chain: page 1 is referred by `root_referer`,
    /// every later page by the page before it.
    pub fn new(
        key: CategoryKey,
        name: impl Into<String>,
        stat: StatType,
        root_referer: Option<Url>,
        urls: impl IntoIterator<Item = Url>,
    ) -> Self {
        let mut referer = root_referer;
        let pages = (1..)
            .zip(urls)
            .map(|(number, url)| {
                let page = PageTarget {
                    number,
                    referer: referer.take(),
                    url,
                };
                referer = Some(page.url.clone());
                page
            })
            .collect();
        Self {
            key,
            name: name.into(),
            stat,
            pages,
        }
    }
}

/// A category as it is written in the configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategorySpec {
    pub key: CategoryKey,
    pub name: String,
    pub stat: StatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_referer: Option<Url>,
    pub urls: Vec<Url>,
}

impl From<CategorySpec> for Category {
    fn from(spec: CategorySpec) -> Self {
        Category::new(spec.key, spec.name, spec.stat, spec.root_referer, spec.urls)
    }
}

const DAILY_ROOT: &str = "https://bgmafia.com/top10/daily?z=QDo";
const PAGES_PER_CATEGORY: u32 = 3;
const BUILTIN: [(&str, &str, StatType); 5] = [
    ("experience", "Опит", StatType::Experience),
    ("fight_wins", "Победи", StatType::Victories),
    ("strength", "Сила", StatType::Strength),
    ("intelect", "Интелект", StatType::Intelligence),
    ("sexapeal", "Сексапил", StatType::Sex),
];

fn daily_page_url(key: &str, page: u32) -> String {
    match page {
        1 => format!("https://bgmafia.com/top10/daily/{key}?z=9tD"),
        _ => format!("https://bgmafia.com/top10/daily/{key}/{page}?z=9tD"),
    }
}

/// The daily top lists, three pages each.
pub fn builtin_catalog() -> anyhow::Result<Vec<Category>> {
    let root = Url::parse(DAILY_ROOT)?;
    BUILTIN
        .iter()
        .map(|&(key, name, stat)| {
            let urls = (1..=PAGES_PER_CATEGORY)
                .map(|page| {
                    let url = daily_page_url(key, page);
                    Url::parse(&url).with_context(|| format!("Invalid built-in url: {url}"))
                })
                .try_collect::<_, Vec<_>, _>()?;
            anyhow::Ok(Category::new(key.into(), name, stat, Some(root.clone()), urls))
        })
        .collect()
}

/// Keeps only the categories named in `keys`, in catalog order.
/// An empty `keys` keeps everything.
pub fn select_categories(
    catalog: Vec<Category>,
    keys: &[CategoryKey],
) -> anyhow::Result<Vec<Category>> {
    if keys.is_empty() {
        return Ok(catalog);
    }
    if let Some(unknown) = keys
        .iter()
        .find(|key| !catalog.iter().any(|c| &c.key == *key))
    {
        bail!(
            "Unknown category {unknown:?}; available: {}",
            catalog.iter().map(|c| &c.key).join(", ")
        );
    }
    Ok(catalog
        .into_iter()
        .filter(|c| keys.contains(&c.key))
        .collect())
}
