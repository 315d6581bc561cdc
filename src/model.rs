use serde::Serialize;

/// One row of the formable nations listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Entity {
    pub name: String,
    pub link: Option<String>,
    pub region: String,
    pub culture: Option<String>,
    pub faith: Option<String>,
    pub relocates_capital: bool,
    pub has_missions: bool,
    pub is_end_game_tag: bool,
    pub notes: String,
    pub missions_link: Option<String>,
    pub tasks: Vec<Task>,
}

impl Entity {
    /// Cache key for the entity's detail page: the canonical link, or the
    /// display name when the listing row carried no anchor.
    pub fn cache_key(&self) -> &str {
        self.link.as_deref().unwrap_or(&self.name)
    }

    /// True when any task grants a permanent effect, directly or through
    /// the event it triggers.
    pub fn has_permanent_effect(&self) -> bool {
        self.tasks.iter().any(Task::grants_permanent_effect)
    }
}

/// One mission row from an entity's mission page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Task {
    pub description: String,
    pub requirement: String,
    pub effect: String,
    pub has_permanent_effect: bool,
    pub event: Option<EventLink>,
}

impl Task {
    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }

    pub fn grants_permanent_effect(&self) -> bool {
        self.has_permanent_effect
            || self
                .event
                .as_ref()
                .and_then(|e| e.outcome.as_ref())
                .is_some_and(|o| o.is_permanent)
    }
}

/// Event named in a task's effect text.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLink {
    pub name: String,
    /// Canonical link with the `#fragment` removed; `None` when the effect
    /// cell has no anchor carrying the event name.
    pub link: Option<String>,
    pub outcome: Option<EventOutcome>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EventOutcome {
    pub effect: String,
    pub is_permanent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(permanent: bool, event_permanent: Option<bool>) -> Task {
        Task {
            has_permanent_effect: permanent,
            event: event_permanent.map(|p| EventLink {
                name: "Ev".into(),
                link: Some("/Ev".into()),
                outcome: Some(EventOutcome {
                    effect: String::new(),
                    is_permanent: p,
                }),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn direct_permanence() {
        assert!(task(true, None).grants_permanent_effect());
        assert!(!task(false, None).grants_permanent_effect());
    }

    #[test]
    fn permanence_through_event() {
        assert!(task(false, Some(true)).grants_permanent_effect());
        assert!(!task(false, Some(false)).grants_permanent_effect());
    }

    #[test]
    fn unresolved_event_is_not_permanent() {
        let mut t = task(false, Some(true));
        t.event.as_mut().unwrap().outcome = None;
        assert!(t.has_event());
        assert!(!t.grants_permanent_effect());
    }

    #[test]
    fn cache_key_prefers_link() {
        let mut e = Entity {
            name: "Byzantium".into(),
            link: Some("/Byzantium".into()),
            ..Default::default()
        };
        assert_eq!(e.cache_key(), "/Byzantium");
        e.link = None;
        assert_eq!(e.cache_key(), "Byzantium");
    }
}
