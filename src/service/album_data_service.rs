use crate::adapters::{
    CacheStatus, ConversionWarning, LayoutSummary, LegacyAdapter, SchemaDetector, SchemaVariant,
    UnifiedAdapter,
};
use crate::album_store::{
    AlbumListingRow, AlbumRow, AlbumStore, LegacyRemovals, NewAlbumRow, WriteOutcome,
};
use crate::error::{AlbumError, AlbumResult};
use crate::layout::{validate_album, Album, AlbumMetadata, ValidationError};
use crate::realtime::{ChangeEvent, ChangeNotifier, ChangeTable};
use anyhow::anyhow;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A freshly loaded album. The caller owns it; the service keeps nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumDocument {
    pub album: Album,
    /// Version to pass back as `expected_version` when saving.
    pub version: i64,
    pub variant: SchemaVariant,
    pub warnings: Vec<ConversionWarning>,
}

/// List view entry, built from the album row cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    pub total_pages: i64,
    pub cover_url: Option<String>,
    pub version: i64,
    pub variant_hint: SchemaVariant,
}

/// Single entry point for reading and writing albums.
pub struct AlbumDataService {
    store: Arc<dyn AlbumStore>,
    detector: SchemaDetector,
    notifier: Arc<ChangeNotifier>,
    /// album_id -> lock serializing saves for that album
    save_queues: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    migrate_on_save: bool,
}

/// Runs blocking store work off the async runtime.
async fn blocking<T, F>(f: F) -> AlbumResult<T>
where
    F: FnOnce() -> AlbumResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AlbumError::Storage(anyhow!("storage task failed: {}", e)))?
}

impl AlbumDataService {
    pub fn new(
        store: Arc<dyn AlbumStore>,
        notifier: Arc<ChangeNotifier>,
        migrate_on_save: bool,
    ) -> Self {
        Self {
            detector: SchemaDetector::new(store.clone()),
            store,
            notifier,
            save_queues: Mutex::new(HashMap::new()),
            migrate_on_save,
        }
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    pub async fn detect(&self, album_id: &str) -> AlbumResult<SchemaVariant> {
        let store = self.store.clone();
        let detector = self.detector.clone();
        let album_id = album_id.to_string();
        blocking(move || {
            store
                .get_album(&album_id)?
                .ok_or_else(|| AlbumError::NotFound(album_id.clone()))?;
            detector.detect(&album_id)
        })
        .await
    }

    pub async fn fetch_album(&self, album_id: &str) -> AlbumResult<AlbumDocument> {
        let store = self.store.clone();
        let detector = self.detector.clone();
        let album_id = album_id.to_string();
        blocking(move || Self::load(store.as_ref(), &detector, &album_id)).await
    }

    fn load(
        store: &dyn AlbumStore,
        detector: &SchemaDetector,
        album_id: &str,
    ) -> AlbumResult<AlbumDocument> {
        let row = store
            .get_album(album_id)?
            .ok_or_else(|| AlbumError::NotFound(album_id.to_string()))?;

        match detector.detect(album_id)? {
            SchemaVariant::Unified => {
                let stored = store
                    .get_unified_layout(album_id)?
                    .ok_or_else(|| AlbumError::NotFound(album_id.to_string()))?;
                if let CacheStatus::Stale { cached, actual } =
                    UnifiedAdapter::cache_status(&stored.layout)
                {
                    warn!(
                        "Album {} caches {} pages but has {}, using stored pages",
                        album_id, cached, actual
                    );
                }
                let converted = UnifiedAdapter::from_layout_json(&stored.layout)?;
                Ok(AlbumDocument {
                    album: converted.album,
                    version: stored.version,
                    variant: SchemaVariant::Unified,
                    warnings: converted.warnings,
                })
            }
            SchemaVariant::Legacy => {
                let stored = store
                    .get_legacy_layout(album_id)?
                    .ok_or_else(|| AlbumError::NotFound(album_id.to_string()))?;
                let converted = LegacyAdapter::from_legacy_rows(&stored.layout)?;
                let variant = if converted.album.pages.is_empty() {
                    SchemaVariant::Empty
                } else {
                    SchemaVariant::Legacy
                };
                Ok(AlbumDocument {
                    album: converted.album,
                    version: stored.version,
                    variant,
                    warnings: converted.warnings,
                })
            }
            SchemaVariant::Empty => Ok(Self::empty_document(row)),
        }
    }

    fn empty_document(row: AlbumRow) -> AlbumDocument {
        let mut warnings = Vec::new();
        let metadata = match row.metadata.as_deref().map(str::trim) {
            None | Some("") => AlbumMetadata::default(),
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                warnings.push(ConversionWarning::InvalidMetadata {
                    reason: e.to_string(),
                });
                AlbumMetadata::default()
            }),
        };
        AlbumDocument {
            album: Album {
                id: row.id,
                title: row.title,
                metadata,
                pages: Vec::new(),
            },
            version: row.version,
            variant: SchemaVariant::Empty,
            warnings,
        }
    }

    fn save_queue(&self, album_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.save_queues
            .lock()
            .unwrap()
            .entry(album_id.to_string())
            .or_default()
            .clone()
    }

    fn release_save_queue(&self, album_id: &str, queue: Arc<tokio::sync::Mutex<()>>) {
        let mut queues = self.save_queues.lock().unwrap();
        // one reference in the map, one held here: nobody else is waiting
        if Arc::strong_count(&queue) == 2 {
            queues.remove(album_id);
        }
    }

    /// Persists `album` if the stored version still equals
    /// `expected_version`, returning the new version.
    ///
    /// Saves of the same album are queued behind each other. The album is
    /// only read, so on any error the caller still holds its edits.
    pub async fn save_album(
        &self,
        album_id: &str,
        album: &Album,
        expected_version: i64,
        origin_session: Option<&str>,
    ) -> AlbumResult<i64> {
        if album.id != album_id {
            return Err(ValidationError::AlbumIdMismatch {
                expected: album_id.to_string(),
                found: album.id.clone(),
            }
            .into());
        }
        validate_album(album)?;

        let queue = self.save_queue(album_id);
        let result = {
            let _turn = queue.lock().await;
            self.write(album_id, album, expected_version).await
        };
        self.release_save_queue(album_id, queue);

        let (version, table) = match result {
            Ok(written) => written,
            Err(AlbumError::SaveConflict {
                album_id,
                expected,
                actual,
            }) => {
                warn!(
                    "Save of album {} rejected: expected version {}, stored version {}",
                    album_id, expected, actual
                );
                return Err(AlbumError::SaveConflict {
                    album_id,
                    expected,
                    actual,
                });
            }
            Err(e) => return Err(e),
        };

        info!("Saved album {} at version {}", album_id, version);
        self.notifier.publish(&ChangeEvent {
            album_id: album_id.to_string(),
            table,
            row_id: None,
            version,
            origin_session: origin_session.map(str::to_string),
        });
        Ok(version)
    }

    async fn write(
        &self,
        album_id: &str,
        album: &Album,
        expected_version: i64,
    ) -> AlbumResult<(i64, ChangeTable)> {
        let store = self.store.clone();
        let detector = self.detector.clone();
        let migrate_on_save = self.migrate_on_save;
        let album = album.clone();
        let album_id = album_id.to_string();

        blocking(move || {
            let variant = detector.detect(&album_id)?;
            let (outcome, table) = if !migrate_on_save && variant == SchemaVariant::Legacy {
                debug!("Writing album {} back in legacy shape", album_id);
                let rows = LegacyAdapter::to_legacy_rows(&album)?;
                let removals =
                    Self::legacy_removals(store.as_ref(), &album, expected_version)?;
                (
                    store.write_legacy_layout(&rows, &removals, expected_version)?,
                    ChangeTable::Pages,
                )
            } else {
                if variant == SchemaVariant::Unified {
                    Self::ensure_pages_readable(store.as_ref(), &album_id, expected_version)?;
                }
                let layout = UnifiedAdapter::to_layout_json(&album)?;
                (
                    store.write_unified_layout(&layout, expected_version)?,
                    ChangeTable::AlbumPages,
                )
            };
            match outcome {
                WriteOutcome::Saved { version } => Ok((version, table)),
                WriteOutcome::Conflict { actual } => Err(AlbumError::SaveConflict {
                    album_id,
                    expected: expected_version,
                    actual,
                }),
                WriteOutcome::NotFound => Err(AlbumError::NotFound(album_id)),
            }
        })
        .await
    }

    /// Legacy rows that loaded into the stored version of the album but are
    /// missing from `album`. Rows that never converted are not listed, so a
    /// legacy write leaves them alone.
    fn legacy_removals(
        store: &dyn AlbumStore,
        album: &Album,
        expected_version: i64,
    ) -> AlbumResult<LegacyRemovals> {
        let Some(stored) = store.get_legacy_layout(&album.id)? else {
            return Ok(LegacyRemovals::default());
        };
        if stored.version != expected_version {
            // the write itself reports the conflict
            return Ok(LegacyRemovals::default());
        }
        let loaded = LegacyAdapter::from_legacy_rows(&stored.layout)?.album;

        let page_ids: HashSet<&str> = album.pages.iter().map(|p| p.id.as_str()).collect();
        let asset_ids: HashSet<&str> = album.assets().map(|a| a.id.as_str()).collect();
        Ok(LegacyRemovals {
            page_ids: loaded
                .pages
                .iter()
                .filter(|p| !page_ids.contains(p.id.as_str()))
                .map(|p| p.id.clone())
                .collect(),
            asset_ids: loaded
                .assets()
                .filter(|a| !asset_ids.contains(a.id.as_str()))
                .map(|a| a.id.clone())
                .collect(),
        })
    }

    /// A unified write replaces every stored page, so it is refused while
    /// some of them cannot be read.
    fn ensure_pages_readable(
        store: &dyn AlbumStore,
        album_id: &str,
        expected_version: i64,
    ) -> AlbumResult<()> {
        let Some(stored) = store.get_unified_layout(album_id)? else {
            return Ok(());
        };
        if stored.version != expected_version {
            return Ok(());
        }
        let unreadable = UnifiedAdapter::unreadable_page_count(&stored.layout)?;
        if unreadable > 0 {
            warn!(
                "Refusing to save album {}: {} stored pages could not be read",
                album_id, unreadable
            );
            return Err(AlbumError::UnreadablePages {
                album_id: album_id.to_string(),
                count: unreadable,
            });
        }
        Ok(())
    }

    /// Creates an empty album in the unified shape at version 0.
    pub async fn create_album(
        &self,
        title: &str,
        metadata: AlbumMetadata,
    ) -> AlbumResult<AlbumDocument> {
        let album = Album {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            metadata,
            pages: Vec::new(),
        };
        validate_album(&album)?;
        let row = NewAlbumRow {
            id: album.id.clone(),
            title: album.title.clone(),
            metadata: serde_json::to_string(&album.metadata)
                .map_err(|e| AlbumError::Conversion(e.into()))?,
            layout_metadata: serde_json::to_string(&LayoutSummary::of(&album))
                .map_err(|e| AlbumError::Conversion(e.into()))?,
        };

        let store = self.store.clone();
        let created = blocking(move || Ok(store.create_album(&row)?)).await?;
        info!("Created album {} ({})", created.id, created.title);

        self.notifier.publish(&ChangeEvent {
            album_id: created.id.clone(),
            table: ChangeTable::Albums,
            row_id: Some(created.id.clone()),
            version: created.version,
            origin_session: None,
        });
        Ok(AlbumDocument {
            album,
            version: created.version,
            variant: SchemaVariant::Empty,
            warnings: Vec::new(),
        })
    }

    pub async fn list_albums(&self) -> AlbumResult<Vec<AlbumSummary>> {
        let store = self.store.clone();
        let rows = blocking(move || Ok(store.list_albums()?)).await?;
        Ok(rows.into_iter().map(Self::summarize).collect())
    }

    fn summarize(row: AlbumListingRow) -> AlbumSummary {
        let variant_hint = SchemaVariant::classify(
            row.unified_page_count as usize,
            row.legacy_page_count as usize,
            row.layout_metadata.is_some(),
        );
        let cached = UnifiedAdapter::cached_summary(row.layout_metadata.as_deref());
        let total_pages = match variant_hint {
            SchemaVariant::Legacy => row.legacy_page_count,
            _ => row.total_pages.unwrap_or(row.unified_page_count),
        };
        AlbumSummary {
            id: row.id,
            title: row.title,
            total_pages,
            cover_url: cached.and_then(|s| s.cover_url),
            version: row.version,
            variant_hint,
        }
    }
}
