mod models;
mod schema;
mod sqlite_album_store;

pub use models::*;
pub use schema::ALBUM_VERSIONED_SCHEMAS;
pub use sqlite_album_store::SqliteAlbumStore;

use anyhow::Result;

/// Raw access to persisted albums.
///
/// Implementations only move rows in and out; they never interpret layout
/// documents or legacy config blobs. Writes are checked against the album's
/// current version inside the same transaction.
pub trait AlbumStore: Send + Sync {
    fn get_album(&self, album_id: &str) -> Result<Option<AlbumRow>>;
    fn list_albums(&self) -> Result<Vec<AlbumListingRow>>;
    fn create_album(&self, album: &NewAlbumRow) -> Result<AlbumRow>;

    // Schema probes
    fn count_unified_pages(&self, album_id: &str) -> Result<usize>;
    fn count_legacy_pages(&self, album_id: &str) -> Result<usize>;

    // Layout reads, `None` when the album row is missing
    fn get_legacy_layout(&self, album_id: &str) -> Result<Option<Stored<LegacyLayout>>>;
    fn get_unified_layout(&self, album_id: &str) -> Result<Option<Stored<UnifiedLayout>>>;

    // Version-checked writes
    fn write_unified_layout(
        &self,
        layout: &UnifiedLayout,
        expected_version: i64,
    ) -> Result<WriteOutcome>;
    fn write_legacy_layout(
        &self,
        layout: &LegacyLayout,
        removals: &LegacyRemovals,
        expected_version: i64,
    ) -> Result<WriteOutcome>;
}
