use crate::album_store::AlbumStore;
use crate::error::AlbumResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which on-disk representation currently holds an album's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    Legacy,
    Unified,
    Empty,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVariant::Legacy => "legacy",
            SchemaVariant::Unified => "unified",
            SchemaVariant::Empty => "empty",
        }
    }

    /// Classifies from already known probe results.
    pub fn classify(unified_pages: usize, legacy_pages: usize, has_unified_stamp: bool) -> Self {
        if unified_pages > 0 {
            SchemaVariant::Unified
        } else if has_unified_stamp {
            // saved empty in unified form; legacy rows are only a recovery copy
            SchemaVariant::Empty
        } else if legacy_pages > 0 {
            SchemaVariant::Legacy
        } else {
            SchemaVariant::Empty
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only probe deciding which adapter an album needs.
#[derive(Clone)]
pub struct SchemaDetector {
    store: Arc<dyn AlbumStore>,
}

impl SchemaDetector {
    pub fn new(store: Arc<dyn AlbumStore>) -> Self {
        Self { store }
    }

    pub fn detect(&self, album_id: &str) -> AlbumResult<SchemaVariant> {
        let unified_pages = self.store.count_unified_pages(album_id)?;
        if unified_pages > 0 {
            debug!("Album {} detected as unified", album_id);
            return Ok(SchemaVariant::Unified);
        }

        let has_unified_stamp = self
            .store
            .get_album(album_id)?
            .map(|row| row.layout_metadata.is_some())
            .unwrap_or(false);
        let legacy_pages = if has_unified_stamp {
            0
        } else {
            self.store.count_legacy_pages(album_id)?
        };

        let variant = SchemaVariant::classify(unified_pages, legacy_pages, has_unified_stamp);
        debug!("Album {} detected as {}", album_id, variant);
        Ok(variant)
    }
}
