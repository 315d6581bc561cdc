use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{element_text, row_cells, ExtractError, ANCHOR, ROW, TABLE};
use crate::model::Entity;

pub const LISTING_CAPTION: &str = "Non-colonial formable nations";
const LISTING_CELLS: usize = 8;

static CAPTION: LazyLock<Selector> = LazyLock::new(|| Selector::parse("caption").unwrap());

/// Read the formable nations table into entities, one result per data row.
///
/// Only tables whose caption is exactly [`LISTING_CAPTION`] are read.
pub fn extract(html: &str, page: &str) -> Vec<Result<Entity, ExtractError>> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    let tables = doc.select(&TABLE).filter(|t| {
        t.select(&CAPTION)
            .next()
            .is_some_and(|c| element_text(&c) == LISTING_CAPTION)
    });

    for table in tables {
        for (i, row) in table.select(&ROW).enumerate().skip(1) {
            let cells = match row_cells(row, LISTING_CELLS, page, i) {
                Ok(c) => c,
                Err(e) => {
                    out.push(Err(e));
                    continue;
                }
            };

            let text = |n: usize| element_text(&cells[n]);
            let optional = |n: usize| Some(text(n)).filter(|s| !s.is_empty());
            let yes = |n: usize| text(n) == "Yes";

            out.push(Ok(Entity {
                name: text(0),
                link: cells[0]
                    .select(&ANCHOR)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
                region: text(1),
                culture: optional(2),
                faith: optional(3),
                relocates_capital: yes(4),
                has_missions: yes(5),
                is_end_game_tag: yes(6),
                notes: text(7),
                ..Default::default()
            }));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> String {
        let tds: String = cells.iter().map(|c| format!("<td>{}</td>", c)).collect();
        format!("<tr>{}</tr>", tds)
    }

    fn table(caption: &str, rows: &[String]) -> String {
        format!(
            "<table><caption> {} </caption><tr><th>Country</th><th>Region</th></tr>{}</table>",
            caption,
            rows.concat()
        )
    }

    fn byzantium() -> String {
        row(&[
            "<a href=\"/Byzantium\" title=\"Byzantium\">Byzantium</a>",
            "Balkans",
            "Greek",
            "Orthodox",
            "Yes",
            "Yes",
            "No",
            " Requires Constantinople ",
        ])
    }

    #[test]
    fn reads_positional_cells() {
        let html = format!("<html><body>{}</body></html>", table(LISTING_CAPTION, &[byzantium()]));
        let rows = extract(&html, "/Formable_countries");
        assert_eq!(rows.len(), 1);
        let e = rows[0].as_ref().unwrap();
        assert_eq!(e.name, "Byzantium");
        assert_eq!(e.link.as_deref(), Some("/Byzantium"));
        assert_eq!(e.region, "Balkans");
        assert_eq!(e.culture.as_deref(), Some("Greek"));
        assert_eq!(e.faith.as_deref(), Some("Orthodox"));
        assert!(e.relocates_capital);
        assert!(e.has_missions);
        assert!(!e.is_end_game_tag);
        assert_eq!(e.notes, "Requires Constantinople");
        assert!(e.tasks.is_empty());
    }

    #[test]
    fn booleans_require_exact_yes() {
        let r = row(&["Prussia", "Germany", "", "", "yes", "", "Yes ", ""]);
        let html = table(LISTING_CAPTION, &[r]);
        let rows = extract(&html, "listing");
        let e = rows[0].as_ref().unwrap();
        assert!(!e.relocates_capital);
        assert!(!e.has_missions);
        // cell text is trimmed before comparison
        assert!(e.is_end_game_tag);
        assert_eq!(e.culture, None);
        assert_eq!(e.faith, None);
        assert_eq!(e.link, None);
    }

    #[test]
    fn other_captions_are_ignored() {
        let html = format!(
            "{}{}",
            table("Colonial formable nations", &[byzantium()]),
            table("Non-colonial formable nations (old)", &[byzantium()])
        );
        assert!(extract(&html, "listing").is_empty());
    }

    #[test]
    fn short_row_is_reported() {
        let short = row(&["Rome", "Italy"]);
        let html = table(LISTING_CAPTION, &[short, byzantium()]);
        let rows = extract(&html, "/Formable_countries");
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].as_ref().unwrap_err(),
            &ExtractError::ShapeMismatch {
                page: "/Formable_countries".into(),
                row: 1,
                expected: 8,
                found: 2,
            }
        );
        assert_eq!(rows[1].as_ref().unwrap().name, "Byzantium");
    }
}
