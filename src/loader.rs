use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::catalog::EventCatalog;
use crate::document_source::DocumentSource;
use crate::error::LoadError;
use crate::event_cache::EventCache;
use crate::sheet_url;
use crate::xlsx_events::read_first_sheet;

/// Header of the column holding the event prompts. Matched exactly.
pub const EVENT_COLUMN: &str = "imprevisto";

/// Turns sheet links into event catalogs, remembering recent successes.
#[derive(Debug)]
pub struct EventLoader<S> {
    source: S,
    cache: EventCache,
}

impl<S: DocumentSource> EventLoader<S> {
    pub fn new(source: S, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache: EventCache::new(cache_ttl),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn load(&mut self, url: &str) -> Result<EventCatalog, LoadError> {
        self.load_at(url, Instant::now())
    }

    /// Link checks happen before any network access; only successful loads
    /// are cached.
    pub fn load_at(&mut self, url: &str, now: Instant) -> Result<EventCatalog, LoadError> {
        let result = self.try_load(url, now);
        if let Err(err) = &result {
            warn!("load failed ({}): {err}", err.kind());
        }
        result
    }

    fn try_load(&mut self, url: &str, now: Instant) -> Result<EventCatalog, LoadError> {
        let export_url = sheet_url::export_url(url)?;

        if let Some(events) = self.cache.get(url, now) {
            info!("using cached sheet ({} events)", events.len());
            return Ok(EventCatalog::new(events));
        }

        debug!("downloading sheet from {export_url}");
        let bytes = self
            .source
            .fetch(&export_url)
            .map_err(|err| LoadError::Fetch(format!("{err:#}")))?;
        let events = extract_events(&bytes)?;

        info!("loaded {} events from sheet", events.len());
        self.cache.insert(url, events.clone(), now);
        Ok(EventCatalog::new(events))
    }
}

/// Reads the `imprevisto` column out of an `.xlsx` payload.
pub fn extract_events(bytes: &[u8]) -> Result<Vec<String>, LoadError> {
    let table = read_first_sheet(bytes).map_err(|err| {
        LoadError::Fetch(format!("the download is not a readable spreadsheet: {err}"))
    })?;
    table.non_empty_column(EVENT_COLUMN).ok_or_else(|| {
        LoadError::Schema(format!(
            "the sheet must have a column named '{EVENT_COLUMN}' (found: {})",
            table.headers().join(", ")
        ))
    })
}
