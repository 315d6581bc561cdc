use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};

use crate::model::Entity;

const HEADER: [&str; 3] = ["NAME", "LINK TO COUNTRY", "LINK TO MISSIONS"];

/// Whether a fully enriched entity belongs in the export.
pub fn qualifies(entity: &Entity) -> bool {
    entity.has_permanent_effect() && !entity.is_end_game_tag
}

/// Incremental CSV export; each qualifying entity is flushed as it is offered.
pub struct Exporter<W: Write> {
    writer: Writer<W>,
    host: String,
    pub rows: usize,
}

impl Exporter<File> {
    pub fn create(path: &Path, host: &str) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Self::new(file, host)
    }
}

impl<W: Write> Exporter<W> {
    pub fn new(inner: W, host: &str) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self {
            writer,
            host: host.to_string(),
            rows: 0,
        })
    }

    /// Write `entity` if it qualifies. Returns whether a row was written.
    pub fn offer(&mut self, entity: &Entity) -> Result<bool> {
        if !qualifies(entity) {
            return Ok(false);
        }
        let absolute = |link: &Option<String>| {
            link.as_deref()
                .map(|l| format!("{}{}", self.host, l))
                .unwrap_or_default()
        };
        self.writer.write_record([
            entity.name.clone(),
            absolute(&entity.link),
            absolute(&entity.missions_link),
        ])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(true)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush export: {}", e.error()))
    }
}
