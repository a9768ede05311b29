//! Conversion between the unified JSON layout and the canonical album.
//!
//! Each page is stored verbatim as its canonical JSON, so this adapter is a
//! direct serialization with no defaults applied. The album row carries a
//! cached page count and summary that are always re-derived on write and
//! never trusted on read.

use super::warnings::{ConversionError, ConversionWarning, Converted};
use crate::album_store::{UnifiedLayout, UnifiedPageRow};
use crate::layout::{resolve_cover, validate_page, Album, AlbumMetadata, AssetType, Page};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Summary cached on the album row for list views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub page_count: usize,
    pub asset_count: usize,
    pub asset_types: BTreeMap<AssetType, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl LayoutSummary {
    pub fn of(album: &Album) -> Self {
        let mut asset_types = BTreeMap::new();
        for asset in album.assets() {
            *asset_types.entry(asset.asset_type).or_insert(0) += 1;
        }
        Self {
            page_count: album.pages.len(),
            asset_count: album.asset_count(),
            asset_types,
            cover_url: resolve_cover(album),
        }
    }
}

/// Whether the cached page count agrees with the stored page documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Stale { cached: i64, actual: i64 },
}

pub struct UnifiedAdapter;

impl UnifiedAdapter {
    pub fn from_layout_json(layout: &UnifiedLayout) -> Result<Converted, ConversionError> {
        let metadata = match layout.metadata.as_deref().map(str::trim) {
            None | Some("") => AlbumMetadata::default(),
            Some(raw) => {
                serde_json::from_str(raw).map_err(|source| ConversionError::InvalidMetadata {
                    album_id: layout.album_id.clone(),
                    source,
                })?
            }
        };

        let mut warnings = Vec::new();
        let mut rows: Vec<&UnifiedPageRow> = layout.pages.iter().collect();
        rows.sort_by_key(|r| r.page_number);

        let mut seen = SeenIds::default();
        let mut pages = Vec::with_capacity(rows.len());
        for row in rows {
            match read_page(row, &seen) {
                Ok(page) => {
                    seen.pages.insert(page.id.clone());
                    seen.assets.extend(page.assets.iter().map(|a| a.id.clone()));
                    pages.push(page);
                }
                Err(warning) => warnings.push(warning),
            }
        }

        if pages.is_empty() && !layout.pages.is_empty() {
            return Err(ConversionError::NoReadablePages {
                album_id: layout.album_id.clone(),
                skipped: layout.pages.len(),
            });
        }

        let mut album = Album {
            id: layout.album_id.clone(),
            title: layout.title.clone(),
            metadata,
            pages,
        };
        if album.renumber_pages() {
            warnings.push(ConversionWarning::PagesRenumbered);
        }

        for warning in &warnings {
            warn!("Unified album {}: {}", layout.album_id, warning);
        }
        Ok(Converted { album, warnings })
    }

    /// Serializes the album; the cached count and summary come from the
    /// album itself.
    pub fn to_layout_json(album: &Album) -> Result<UnifiedLayout, ConversionError> {
        let pages = album
            .pages
            .iter()
            .map(|page| {
                Ok(UnifiedPageRow {
                    page_number: page.page_number as i64,
                    layout_json: serde_json::to_string(page)?,
                })
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        Ok(UnifiedLayout {
            album_id: album.id.clone(),
            title: album.title.clone(),
            metadata: Some(serde_json::to_string(&album.metadata)?),
            total_pages: pages.len() as i64,
            layout_metadata: Some(serde_json::to_string(&LayoutSummary::of(album))?),
            pages,
        })
    }

    /// Number of stored pages that `from_layout_json` would skip.
    pub fn unreadable_page_count(layout: &UnifiedLayout) -> Result<usize, ConversionError> {
        match Self::from_layout_json(layout) {
            Ok(converted) => Ok(layout.pages.len() - converted.album.pages.len()),
            Err(ConversionError::NoReadablePages { skipped, .. }) => Ok(skipped),
            Err(e) => Err(e),
        }
    }

    pub fn cache_status(layout: &UnifiedLayout) -> CacheStatus {
        let actual = layout.pages.len() as i64;
        if layout.total_pages == actual {
            CacheStatus::Fresh
        } else {
            CacheStatus::Stale {
                cached: layout.total_pages,
                actual,
            }
        }
    }

    /// Reads the cached summary, `None` if it is missing or unreadable.
    pub fn cached_summary(layout_metadata: Option<&str>) -> Option<LayoutSummary> {
        layout_metadata.and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Page ids and asset ids are separate namespaces.
#[derive(Default)]
struct SeenIds {
    pages: HashSet<String>,
    assets: HashSet<String>,
}

fn read_page(row: &UnifiedPageRow, seen: &SeenIds) -> Result<Page, ConversionWarning> {
    let unreadable = |reason: String| ConversionWarning::UnreadablePage {
        page_number: row.page_number,
        reason,
    };

    let mut page: Page =
        serde_json::from_str(&row.layout_json).map_err(|e| unreadable(e.to_string()))?;
    // the row's page number is the one the unique constraint guards
    page.page_number = u32::try_from(row.page_number)
        .map_err(|_| unreadable(format!("page number {} out of range", row.page_number)))?;
    validate_page(&page).map_err(|e| unreadable(e.to_string()))?;

    let duplicate = Some(&page.id)
        .filter(|id| seen.pages.contains(*id))
        .or_else(|| page.assets.iter().map(|a| &a.id).find(|id| seen.assets.contains(*id)));
    if let Some(id) = duplicate {
        return Err(ConversionWarning::DuplicateId { id: id.clone() });
    }
    Ok(page)
}
