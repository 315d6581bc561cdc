use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{element_text, normalize_whitespace, ExtractError, ROW, TABLE};

static CONTENT_BOX: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".eu4box").unwrap());

/// Effect text of an event page: third row of the second table inside the
/// event's content box.
pub fn outcome_text(html: &str, page: &str) -> Result<String, ExtractError> {
    let doc = Html::parse_document(html);
    let missing = |what| ExtractError::MissingElement {
        page: page.to_string(),
        what,
    };

    let content = doc.select(&CONTENT_BOX).next().ok_or_else(|| missing("event box"))?;
    let table = content.select(&TABLE).nth(1).ok_or_else(|| missing("effects table"))?;
    let row = table.select(&ROW).nth(2).ok_or_else(|| missing("effects row"))?;

    Ok(normalize_whitespace(&element_text(&row)))
}
