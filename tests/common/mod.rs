//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestEnv, LEGACY_ALBUM_ID};
//!
//! #[tokio::test]
//! async fn test_fetch_legacy() {
//!     let env = TestEnv::with_legacy_album(true);
//!     let doc = env.service.fetch_album(LEGACY_ALBUM_ID).await.unwrap();
//!     assert_eq!(doc.album.pages.len(), 2);
//! }
//! ```

mod constants;
mod fixtures;

pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{
    count_rows, create_unversioned_legacy_db, legacy_rows_snapshot, seed_legacy_album,
    seed_malformed_assets, unified_page_json, write_unified_page_json,
};

use album_layout::album_store::SqliteAlbumStore;
use album_layout::realtime::ChangeNotifier;
use album_layout::service::AlbumDataService;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// A service over a fresh on-disk database.
pub struct TestEnv {
    pub service: Arc<AlbumDataService>,
    pub notifier: Arc<ChangeNotifier>,
    pub db_path: PathBuf,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestEnv {
    pub fn new(migrate_on_save: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("albums.db");
        fixtures::create_empty_db(&db_path).expect("Failed to create album database");
        Self::open(temp_dir, db_path, migrate_on_save)
    }

    pub fn with_legacy_album(migrate_on_save: bool) -> Self {
        let env = Self::new(migrate_on_save);
        seed_legacy_album(&env.db_path).expect("Failed to seed legacy album");
        env
    }

    fn open(temp_dir: TempDir, db_path: PathBuf, migrate_on_save: bool) -> Self {
        let store = SqliteAlbumStore::new(&db_path).expect("Failed to open album store");
        let notifier = Arc::new(ChangeNotifier::new());
        let service = Arc::new(AlbumDataService::new(
            Arc::new(store),
            notifier.clone(),
            migrate_on_save,
        ));
        Self {
            service,
            notifier,
            db_path,
            _temp_dir: temp_dir,
        }
    }

    /// A second service over the same file, as another process would see it.
    pub fn reopen(&self, migrate_on_save: bool) -> Arc<AlbumDataService> {
        let store = SqliteAlbumStore::new(&self.db_path).expect("Failed to reopen album store");
        Arc::new(AlbumDataService::new(
            Arc::new(store),
            Arc::new(ChangeNotifier::new()),
            migrate_on_save,
        ))
    }

    pub fn legacy_rows(&self, album_id: &str) -> Vec<String> {
        legacy_rows_snapshot(&self.db_path, album_id).expect("Failed to read legacy rows")
    }

    pub fn unified_page_count(&self, album_id: &str) -> i64 {
        count_rows(
            &self.db_path,
            "SELECT COUNT(*) FROM album_pages WHERE album_id = ?1",
            album_id,
        )
        .expect("Failed to count album_pages")
    }
}
