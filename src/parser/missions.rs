use scraper::Html;

use super::{anchors, element_text, normalize_whitespace, row_cells, Anchor, ExtractError, ROW, TABLE};

const MISSION_CELLS: usize = 3;

/// Mission row as read from the page, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionRow {
    pub description: String,
    pub requirement: String,
    pub effect: String,
    /// Anchors in the effect cell, used to resolve event links.
    pub effect_links: Vec<Anchor>,
}

/// Read every table of a mission page, skipping each table's header row.
pub fn extract(html: &str, page: &str) -> Vec<Result<MissionRow, ExtractError>> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    for table in doc.select(&TABLE) {
        for (i, row) in table.select(&ROW).enumerate().skip(1) {
            out.push(row_cells(row, MISSION_CELLS, page, i).map(|cells| MissionRow {
                description: element_text(&cells[0]),
                requirement: element_text(&cells[1]),
                effect: normalize_whitespace(&element_text(&cells[2])),
                effect_links: anchors(&cells[2]),
            }));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table>
          <tr><th>Mission</th><th>Requirements</th><th>Effects</th></tr>
          <tr><td> Restore the Empire </td><td>Own Constantinople</td>
              <td>+1   stability
                  for the rest of the game</td></tr>
          <tr><td>Reform</td><td>Have 50 prestige</td>
              <td>Country gets the event "<a href="/Byzantine_events#The_Great_Reform">Great Reform</a>"</td></tr>
        </table>
        <table>
          <tr><th>Mission</th><th>Requirements</th><th>Effects</th></tr>
          <tr><td>Conquer Anatolia</td><td>Own Anatolia</td><td>+10 prestige</td></tr>
        </table>"#;

    #[test]
    fn reads_all_tables_in_order() {
        let rows: Vec<MissionRow> = extract(PAGE, "/Byzantine_missions")
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].description, "Restore the Empire");
        assert_eq!(rows[0].requirement, "Own Constantinople");
        assert_eq!(rows[0].effect, "+1 stability for the rest of the game");
        assert_eq!(rows[2].description, "Conquer Anatolia");
    }

    #[test]
    fn keeps_effect_anchors() {
        let rows = extract(PAGE, "/Byzantine_missions");
        let reform = rows[1].as_ref().unwrap();
        assert_eq!(
            reform.effect_links,
            vec![Anchor {
                text: "Great Reform".into(),
                href: "/Byzantine_events#The_Great_Reform".into(),
            }]
        );
        assert_eq!(reform.effect, "Country gets the event \"Great Reform\"");
    }

    #[test]
    fn short_row_is_reported_and_others_kept() {
        let html = r#"<table><tr><th>h</th></tr><tr><td>only one</td></tr><tr><td>a</td><td>b</td><td>c</td></tr></table>"#;
        let rows = extract(html, "/X_missions");
        assert_eq!(rows.len(), 2);
        assert!(matches!(
            rows[0],
            Err(ExtractError::ShapeMismatch { row: 1, found: 1, .. })
        ));
        assert_eq!(rows[1].as_ref().unwrap().effect, "c");
    }

    #[test]
    fn page_without_tables_is_empty() {
        assert!(extract("<p>No missions</p>", "/X").is_empty());
    }
}
