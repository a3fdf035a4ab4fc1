use anyhow::{bail, Context};
use log::debug;
use serde::Serialize;

use crate::catalog::{CategoryKey, StatType};

/// A player's position in a top list.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct RankingEntry {
    pub rank: u32,
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryRanking<'a> {
    pub category: &'a CategoryKey,
    pub stat: StatType,
    pub entries: Vec<RankingEntry>,
}

/// Integer at the start of `text`, with an optional sign.  Whatever follows the digits is ignored.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign = usize::from(text.starts_with(['+', '-']));
    let end = text[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| sign + i);
    text[..end].parse().ok()
}

/// Reads rank, name and value from the first three cells of a row, whatever the headers are.
pub fn parse_entry(cells: &[String]) -> anyhow::Result<RankingEntry> {
    let [rank, name, value, ..] = cells else {
        bail!("Expected at least three cells, found {}", cells.len());
    };
    let rank = leading_int(rank)
        .and_then(|rank| u32::try_from(rank).ok())
        .with_context(|| format!("Invalid rank: {rank:?}"))?;
    if name.is_empty() {
        bail!("Empty player name at rank {rank}");
    }
    let value = leading_int(&value.replace(',', ""))
        .with_context(|| format!("Invalid value: {value:?}"))?;
    Ok(RankingEntry {
        rank,
        name: name.clone(),
        value,
    })
}

/// Converts every row that looks like a ranking row; the rest are skipped.
pub fn parse_entries<'a>(rows: impl IntoIterator<Item = &'a Vec<String>>) -> Vec<RankingEntry> {
    rows.into_iter()
        .filter_map(|cells| match parse_entry(cells) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping non-ranking row {cells:?}: {e:#}");
                None
            }
        })
        .collect()
}
