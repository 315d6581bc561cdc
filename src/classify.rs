use std::sync::LazyLock;

use regex::Regex;

use crate::model::{EventLink, EventOutcome, Task};
use crate::parser::missions::MissionRow;
use crate::parser::Anchor;

static PERMANENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.*? rest of the game)|(.*? end of the game)|(.*? rest of the campaign)").unwrap()
});

// Alternatives are listed in priority order; the first non-empty group wins.
static EVENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)gets the event ["“”]([^"“”]+)["“”]"#,
        r#"|the event ["“”]([^"“”]+)["“”] happens"#,
        r#"|gets ["“”]([^"“”]+)["“”] event"#,
        r#"|gets the ["“”]([^"“”]+)["“”] event"#,
        r#"|trigger event ["“”]([^"“”]+)["“”]"#,
    ))
    .unwrap()
});

/// Whether the effect lasts for the remainder of the playthrough.
pub fn is_permanent(effect: &str) -> bool {
    PERMANENT_RE.is_match(effect)
}

/// Name of the event the effect triggers, if any.
pub fn event_name(effect: &str) -> Option<String> {
    let caps = EVENT_RE.captures(effect)?;
    (1..caps.len())
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str().trim())
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Link of the anchor whose text is the event name, without its fragment.
pub fn event_link(name: &str, links: &[Anchor]) -> Option<String> {
    links
        .iter()
        .find(|a| a.text.trim() == name)
        .map(|a| a.href.split('#').next().unwrap_or_default().to_string())
        .filter(|href| !href.is_empty())
}

pub fn classify_task(row: MissionRow) -> Task {
    let event = event_name(&row.effect).map(|name| EventLink {
        link: event_link(&name, &row.effect_links),
        name,
        outcome: None,
    });

    Task {
        has_permanent_effect: is_permanent(&row.effect),
        description: row.description,
        requirement: row.requirement,
        effect: row.effect,
        event,
    }
}

pub fn classify_outcome(effect: String) -> EventOutcome {
    EventOutcome {
        is_permanent: is_permanent(&effect),
        effect,
    }
}
