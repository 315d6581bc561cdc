use std::collections::VecDeque;
use std::io::Write;

use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::cache::CachedFetcher;
use crate::classify;
use crate::export::Exporter;
use crate::fetch::PageFetcher;
use crate::model::Entity;
use crate::parser::{detail, event, listing, missions, ExtractError};

const DETAIL_READY: &str = ".eu4box";
const MISSIONS_READY: &str = "table";
const EVENT_READY: &str = ".eu4box";
const LISTING_READY: &str = "table";

/// Pending page visit below an entity. The parent is the entity being
/// enriched; event items also carry the index of their task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Detail { link: String },
    Missions { link: String },
    Event { task: usize, link: String },
}

impl WorkItem {
    pub fn level(&self) -> &'static str {
        match self {
            WorkItem::Detail { .. } => "detail",
            WorkItem::Missions { .. } => "missions",
            WorkItem::Event { .. } => "event",
        }
    }
}

/// Row or page left out of the dataset because of its structure.
#[derive(Debug, Clone)]
pub struct Skipped {
    pub entity: Option<String>,
    pub reason: String,
}

pub struct Crawler<F> {
    pages: CachedFetcher<F>,
    pub skipped: Vec<Skipped>,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(pages: CachedFetcher<F>) -> Self {
        Self {
            pages,
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, entity: Option<&str>, err: ExtractError) {
        warn!(entity, "{}", err);
        self.skipped.push(Skipped {
            entity: entity.map(str::to_string),
            reason: err.to_string(),
        });
    }

    /// Load the listing page and read its entities in table order.
    pub async fn listing(&mut self, path: &str) -> Result<Vec<Entity>> {
        let html = self.pages.load(path, path, LISTING_READY).await?;
        let mut entities = Vec::new();
        for row in listing::extract(&html, path) {
            match row {
                Ok(entity) => entities.push(entity),
                Err(e) => self.skip(None, e),
            }
        }
        info!("Listing {} has {} entities", path, entities.len());
        Ok(entities)
    }

    /// Follow the entity's detail, mission and event pages until nothing is
    /// left to visit. On return the entity is fully enriched.
    pub async fn enrich(&mut self, entity: &mut Entity) -> Result<()> {
        if !entity.has_missions {
            return Ok(());
        }
        let Some(link) = entity.link.clone() else {
            self.skip(
                Some(&entity.name),
                ExtractError::MissingElement {
                    page: entity.cache_key().to_string(),
                    what: "country link",
                },
            );
            return Ok(());
        };

        let mut queue = VecDeque::from([WorkItem::Detail { link }]);
        while let Some(item) = queue.pop_front() {
            debug!(entity = %entity.name, level = item.level(), "visiting");
            self.visit(entity, item, &mut queue).await?;
        }
        Ok(())
    }

    async fn visit(
        &mut self,
        entity: &mut Entity,
        item: WorkItem,
        queue: &mut VecDeque<WorkItem>,
    ) -> Result<()> {
        match item {
            WorkItem::Detail { link } => {
                let key = entity.cache_key().to_string();
                let html = self.pages.load(&key, &link, DETAIL_READY).await?;
                match detail::missions_link(&html) {
                    Some(missions) => {
                        entity.missions_link = Some(missions.clone());
                        queue.push_back(WorkItem::Missions { link: missions });
                    }
                    None => debug!(entity = %entity.name, "no missions link on detail page"),
                }
            }
            WorkItem::Missions { link } => {
                let html = self.pages.load(&link, &link, MISSIONS_READY).await?;
                for row in missions::extract(&html, &link) {
                    let row = match row {
                        Ok(r) => r,
                        Err(e) => {
                            self.skip(Some(&entity.name), e);
                            continue;
                        }
                    };
                    let task = classify::classify_task(row);
                    if let Some(event_link) = task.event.as_ref().and_then(|e| e.link.clone()) {
                        queue.push_back(WorkItem::Event {
                            task: entity.tasks.len(),
                            link: event_link,
                        });
                    }
                    entity.tasks.push(task);
                }
                debug!(entity = %entity.name, tasks = entity.tasks.len(), "missions read");
            }
            WorkItem::Event { task, link } => {
                let html = self.pages.load(&link, &link, EVENT_READY).await?;
                match event::outcome_text(&html, &link) {
                    Ok(text) => {
                        if let Some(ev) = entity.tasks.get_mut(task).and_then(|t| t.event.as_mut()) {
                            ev.outcome = Some(classify::classify_outcome(text));
                        }
                    }
                    Err(e) => self.skip(Some(&entity.name), e),
                }
            }
        }
        Ok(())
    }
}

/// Crawl summary printed at the end of a run.
pub struct CrawlReport {
    pub entities: Vec<Entity>,
    pub exported: usize,
    pub skipped: Vec<Skipped>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// Crawl the listing, enrich each entity in order and export it as soon as
/// it is complete.
pub async fn run<F: PageFetcher, W: Write>(
    mut crawler: Crawler<F>,
    exporter: &mut Exporter<W>,
    listing_path: &str,
    limit: Option<usize>,
    progress: &ProgressBar,
) -> Result<CrawlReport> {
    let mut entities = crawler.listing(listing_path).await?;
    if let Some(n) = limit {
        entities.truncate(n);
    }
    progress.set_length(entities.len() as u64);

    for entity in entities.iter_mut() {
        progress.set_message(entity.name.clone());
        crawler.enrich(entity).await?;
        if exporter.offer(entity)? {
            info!(entity = %entity.name, "exported");
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    Ok(CrawlReport {
        exported: exporter.rows,
        skipped: crawler.skipped,
        cache_hits: crawler.pages.hits,
        cache_misses: crawler.pages.misses,
        entities,
    })
}
