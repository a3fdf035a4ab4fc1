//! Generic extraction of a classed `<table>` into records keyed by header text.

use anyhow::anyhow;
use bgmafia_scraping_utils::selector;
use getset::{CopyGetters, Getters};
use indexmap::IndexMap;
use itertools::Itertools;
use scraper::{ElementRef, Html, Selector};
use serde::{ser::SerializeMap, Serialize, Serializer};

pub const DEFAULT_TABLE_CLASS: &str = "default";

/// Key under which the page number is written.
pub const PAGE_KEY: &str = "page";

pub type Row = IndexMap<String, String>;

/// One table row keyed by header text, tagged with the page it came from.
#[derive(Clone, PartialEq, Eq, Debug, Getters, CopyGetters)]
pub struct Record {
    #[getset(get = "pub")]
    fields: Row,
    #[getset(get_copy = "pub")]
    page: u32,
}

impl Record {
    pub fn new(fields: Row, page: u32) -> Self {
        Self { fields, page }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }
}

// Flat object: header fields in table order, then `page`.
// A column literally named `page` keeps its position but holds the page number.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (header, value) in &self.fields {
            if header == PAGE_KEY {
                map.serialize_entry(PAGE_KEY, &self.page)?;
            } else {
                map.serialize_entry(header, value)?;
            }
        }
        if !self.fields.contains_key(PAGE_KEY) {
            map.serialize_entry(PAGE_KEY, &self.page)?;
        }
        map.end()
    }
}

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct ExtractedTable {
    headers: Vec<String>,
    rows: Vec<Row>,
    /// `td` texts of every row after the header, including rows too short to be records.
    cells: Vec<Vec<String>>,
    /// Outer HTML of the matched table.
    fragment: String,
}

impl ExtractedTable {
    pub fn into_records(self, page: u32) -> Vec<Record> {
        self.rows
            .into_iter()
            .map(|fields| Record::new(fields, page))
            .collect()
    }
}

/// Result of running the extractor over a whole fetched page.
#[derive(Debug, Default)]
pub struct PageExtract {
    pub records: Vec<Record>,
    /// Positional cell texts, see [`ExtractedTable::cells`].
    pub cells: Vec<Vec<String>>,
    pub table_html: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TableExtractor {
    table: Selector,
}

impl TableExtractor {
    /// Matches the first `<table>` carrying `class`.
    pub fn new(class: &str) -> anyhow::Result<Self> {
        let table = Selector::parse(&format!("table.{class}"))
            .map_err(|e| anyhow!("Invalid table class {class:?}: {e:?}"))?;
        Ok(Self { table })
    }

    /// Returns `None` when no matching table exists or the table has no rows.
    ///
    /// The first row's `th` cells name the columns.  Every later row with at
    /// least that many `td` cells becomes a row; extra cells are ignored and
    /// shorter rows are dropped.
    pub fn extract(&self, html: &Html) -> Option<ExtractedTable> {
        let table = html.select(&self.table).next()?;
        let mut rows = table.select(selector!("tr"));
        let headers = rows
            .next()?
            .select(selector!("th"))
            .map(cell_text)
            .collect_vec();
        let cells = rows
            .map(|row| row.select(selector!("td")).map(cell_text).collect_vec())
            .collect_vec();
        let rows = cells
            .iter()
            .filter(|cells| cells.len() >= headers.len())
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.iter().cloned())
                    .collect::<Row>()
            })
            .collect();
        Some(ExtractedTable {
            headers,
            rows,
            cells,
            fragment: table.html(),
        })
    }

    pub fn extract_page(&self, document: &str, page: u32) -> PageExtract {
        match self.extract(&Html::parse_document(document)) {
            Some(mut table) => {
                let cells = std::mem::take(&mut table.cells);
                let table_html = Some(table.fragment.clone());
                PageExtract {
                    records: table.into_records(page),
                    cells,
                    table_html,
                }
            }
            None => PageExtract::default(),
        }
    }
}

/// Text of a cell with every text node trimmed, then concatenated.
fn cell_text(cell: ElementRef) -> String {
    cell.text().map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;
    use serde_json::json;

    use super::{Record, Row, TableExtractor, DEFAULT_TABLE_CLASS};

    fn extractor() -> TableExtractor {
        TableExtractor::new(DEFAULT_TABLE_CLASS).unwrap()
    }

    fn records(html: &str, page: u32) -> Vec<Record> {
        extractor().extract_page(html, page).records
    }

    fn fields(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    #[test]
    fn rows_follow_header_order() {
        let html = r#"<table class="default">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>a1</td><td>b1</td></tr>
            <tr><td>a2</td><td>b2</td></tr>
        </table>"#;
        let got = records(html, 1);
        assert_eq!(
            got,
            [
                Record::new(fields(&[("A", "a1"), ("B", "b1")]), 1),
                Record::new(fields(&[("A", "a2"), ("B", "b2")]), 1),
            ]
        );
        assert_eq!(
            got[0].fields().keys().map(String::as_str).collect::<Vec<_>>(),
            ["A", "B"]
        );
    }

    #[test]
    fn short_rows_are_dropped() {
        let html = r#"<table class="default">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>a1</td></tr>
            <tr><td>a2</td><td>b2</td></tr>
        </table>"#;
        assert_eq!(
            records(html, 1),
            [Record::new(fields(&[("A", "a2"), ("B", "b2")]), 1)]
        );
    }

    #[test]
    fn extra_cells_are_ignored() {
        let html = r#"<table class="default">
            <tr><th>A</th></tr>
            <tr><td>a1</td><td>b1</td></tr>
        </table>"#;
        assert_eq!(records(html, 1), [Record::new(fields(&[("A", "a1")]), 1)]);
    }

    #[test]
    fn missing_table_yields_nothing() {
        let html = r#"<table class="other"><tr><th>A</th></tr><tr><td>a</td></tr></table>"#;
        let extract = extractor().extract_page(html, 1);
        assert!(extract.records.is_empty());
        assert!(extract.table_html.is_none());
        assert!(records("<p>maintenance</p>", 1).is_empty());
    }

    #[test]
    fn empty_table_has_no_fragment() {
        let extract = extractor().extract_page(r#"<table class="default"></table>"#, 1);
        assert!(extract.records.is_empty());
        assert!(extract.table_html.is_none());
    }

    #[test]
    fn page_is_injected() {
        let html = r#"<table class="default">
            <tr><th>Име</th></tr>
            <tr><td>Иван</td></tr>
            <tr><td>Петър</td></tr>
        </table>"#;
        let got = records(html, 2);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|r| r.page() == 2));
        assert_eq!(
            serde_json::to_value(&got).unwrap(),
            json!([{"Име": "Иван", "page": 2}, {"Име": "Петър", "page": 2}])
        );
    }

    #[test]
    fn text_is_trimmed_per_node() {
        let html = "<table class=\"default\">
            <tr><th>\n  Играч </th><th> Точки\n</th></tr>
            <tr><td>  <a href=\"/profile/1\"> ЯкаТупалка </a> </td><td>\t440,890,530 </td></tr>
        </table>";
        let got = records(html, 1);
        assert_eq!(got[0].get("Играч"), Some("ЯкаТупалка"));
        assert_eq!(got[0].get("Точки"), Some("440,890,530"));
    }

    #[test]
    fn first_matching_table_wins_and_fragment_is_kept() {
        let html = r#"<div>
            <table class="menu"><tr><th>X</th></tr></table>
            <table class="default wide"><tr><th>A</th></tr><tr><td>1</td></tr></table>
            <table class="default"><tr><th>B</th></tr><tr><td>2</td></tr></table>
        </div>"#;
        let extract = extractor().extract_page(html, 1);
        assert_eq!(extract.records[0].get("A"), Some("1"));
        let fragment = extract.table_html.unwrap();
        assert!(fragment.starts_with("<table class=\"default wide\">"));
        assert!(!fragment.contains("<th>B</th>"));
    }

    #[test]
    fn header_row_cells_and_page_column() {
        let html = r#"<table class="default">
            <thead><tr><th>page</th><th>A</th></tr></thead>
            <tbody><tr><td>x</td><td>y</td></tr></tbody>
        </table>"#;
        let got = records(html, 3);
        assert_eq!(got[0].get("page"), Some("x"));
        assert_eq!(
            serde_json::to_string(&got[0]).unwrap(),
            r#"{"page":3,"A":"y"}"#
        );
        assert_eq!(
            serde_json::to_string(&Record::new(fields(&[("B", "b"), ("A", "a")]), 1)).unwrap(),
            r#"{"B":"b","A":"a","page":1}"#
        );
    }

    #[test]
    fn cells_are_kept_by_position() {
        let html = r#"<table class="default">
            <tr><th></th><th>Играч</th><th></th><th>Опит</th></tr>
            <tr><td>1.</td><td>Иван</td><td>x</td><td>1,000</td></tr>
            <tr><td>2.</td><td>Петър</td><td>10</td></tr>
        </table>"#;
        let extract = extractor().extract_page(html, 1);
        assert_eq!(
            extract.cells,
            [vec!["1.", "Иван", "x", "1,000"], vec!["2.", "Петър", "10"]]
        );
        assert_eq!(extract.records.len(), 1);
        assert_eq!(extract.records[0].fields().len(), 3);
        assert_eq!(extract.records[0].get(""), Some("x"));
    }

    #[test]
    fn custom_class() {
        let extractor = TableExtractor::new("ranking").unwrap();
        let html = Html::parse_document(
            r#"<table class="ranking"><tr><th>A</th></tr><tr><td>1</td></tr></table>"#,
        );
        let table = extractor.extract(&html).unwrap();
        assert_eq!(table.headers(), &["A"]);
        assert_eq!(table.rows().len(), 1);
        assert!(TableExtractor::new("a b[").is_err());
    }
}
