//! Row shapes for album storage.
//!
//! These mirror the database columns one to one. Nothing here is
//! interpreted; the adapters own every conversion into the canonical model.

// =============================================================================
// Album rows
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumRow {
    pub id: String,
    pub title: String,
    /// Free-form metadata JSON.
    pub metadata: Option<String>,
    /// Cached page count; only present once the album was saved unified.
    pub total_pages: Option<i64>,
    /// Cached summary JSON; only present once the album was saved unified.
    pub layout_metadata: Option<String>,
    pub version: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert payload for a new album.
#[derive(Debug, Clone)]
pub struct NewAlbumRow {
    pub id: String,
    pub title: String,
    pub metadata: String,
    pub layout_metadata: String,
}

/// One entry of the album list, read without touching page documents.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumListingRow {
    pub id: String,
    pub title: String,
    pub total_pages: Option<i64>,
    pub layout_metadata: Option<String>,
    pub version: i64,
    pub legacy_page_count: i64,
    pub unified_page_count: i64,
}

// =============================================================================
// Legacy shape
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyPageRow {
    pub id: String,
    pub album_id: String,
    pub page_number: i64,
    pub template_id: Option<String>,
    pub background_color: Option<String>,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyAssetRow {
    pub id: String,
    pub page_id: String,
    pub url: Option<String>,
    pub asset_type: String,
    /// Free-form JSON with x/y/width/height/rotation/scale and friends.
    pub config: Option<String>,
    pub z_index: Option<i64>,
}

/// All legacy rows of one album. Assets are kept in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyLayout {
    pub album_id: String,
    pub title: String,
    pub metadata: Option<String>,
    pub pages: Vec<LegacyPageRow>,
    pub assets: Vec<LegacyAssetRow>,
}

/// Legacy rows the caller deleted from its album. A legacy write touches
/// only the rows it writes and the rows named here; anything else, such as
/// rows that failed to convert on load, stays as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyRemovals {
    pub page_ids: Vec<String>,
    pub asset_ids: Vec<String>,
}

// =============================================================================
// Unified shape
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedPageRow {
    pub page_number: i64,
    pub layout_json: String,
}

/// The unified document of one album: the album row with its cached
/// summary plus one layout document per page.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedLayout {
    pub album_id: String,
    pub title: String,
    pub metadata: Option<String>,
    pub total_pages: i64,
    pub layout_metadata: Option<String>,
    pub pages: Vec<UnifiedPageRow>,
}

// =============================================================================
// Reads and writes
// =============================================================================

/// A layout together with the album version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub version: i64,
    pub layout: T,
}

/// Result of a version-checked write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Saved { version: i64 },
    Conflict { actual: i64 },
    NotFound,
}
