use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static MISSIONS_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".*? missions").unwrap());
static INFOBOX_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl > dd > i > a").unwrap());

/// Find the link to an entity's mission page on its detail page.
///
/// Returns the `href` of the first `dl > dd > i > a` whose title mentions
/// missions. Many task-bearing entities have no such link; that is `None`,
/// not an error.
pub fn missions_link(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&INFOBOX_LINK)
        .find(|a| {
            a.value()
                .attr("title")
                .is_some_and(|t| MISSIONS_TITLE_RE.is_match(t))
        })
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_missions_anchor() {
        let html = r#"
            <div class="eu4box"></div>
            <dl><dd><i>Main article: <a href="/Greek_missions" title="Greek missions">Greek missions</a></i></dd></dl>
            <dl><dd><i><a href="/Byzantine_missions" title="Byzantine missions">other</a></i></dd></dl>"#;
        assert_eq!(missions_link(html).as_deref(), Some("/Greek_missions"));
    }

    #[test]
    fn skips_unrelated_anchors() {
        let html = r#"
            <dl><dd><i><a href="/Decisions" title="Decisions">Decisions</a></i></dd></dl>
            <dl><dd><i><a href="/Prussian_missions" title="Prussian missions">see</a></i></dd></dl>"#;
        assert_eq!(missions_link(html).as_deref(), Some("/Prussian_missions"));
    }

    #[test]
    fn first_match_without_href_yields_none() {
        let html = r#"
            <dl><dd><i><a title="Greek missions">Greek missions</a></i></dd></dl>
            <dl><dd><i><a href="/Byzantine_missions" title="Byzantine missions">see</a></i></dd></dl>"#;
        assert_eq!(missions_link(html), None);
    }

    #[test]
    fn title_match_is_case_sensitive() {
        let html = r#"<dl><dd><i><a href="/X" title="Greek Missions">x</a></i></dd></dl>"#;
        assert_eq!(missions_link(html), None);
    }

    #[test]
    fn anchor_outside_path_is_ignored() {
        let html = r#"<p><a href="/Greek_missions" title="Greek missions">Greek missions</a></p>"#;
        assert_eq!(missions_link(html), None);
    }
}
