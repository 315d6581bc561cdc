pub mod detail;
pub mod event;
pub mod listing;
pub mod missions;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use thiserror::Error;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub(crate) static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
pub(crate) static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
pub(crate) static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
pub(crate) static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Structural problems found while reading a page. These are reported per
/// row or per page and never abort the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("{page}: row {row} has {found} cells, expected at least {expected}")]
    ShapeMismatch {
        page: String,
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{page}: missing {what}")]
    MissingElement { page: String, what: &'static str },
}

/// Anchor found inside a table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: String,
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Read the `td` cells of a row, failing when fewer than `expected` exist.
pub(crate) fn row_cells<'a>(
    row: ElementRef<'a>,
    expected: usize,
    page: &str,
    index: usize,
) -> Result<Vec<ElementRef<'a>>, ExtractError> {
    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    if cells.len() < expected {
        return Err(ExtractError::ShapeMismatch {
            page: page.to_string(),
            row: index,
            expected,
            found: cells.len(),
        });
    }
    Ok(cells)
}

pub(crate) fn anchors(el: &ElementRef) -> Vec<Anchor> {
    el.select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            Some(Anchor {
                text: element_text(&a),
                href: href.to_string(),
            })
        })
        .collect()
}
