use super::models::{
    AlbumListingRow, AlbumRow, LegacyAssetRow, LegacyLayout, LegacyPageRow, LegacyRemovals,
    NewAlbumRow, Stored, UnifiedLayout, UnifiedPageRow, WriteOutcome,
};
use super::schema::ALBUM_VERSIONED_SCHEMAS;
use super::AlbumStore;
use crate::sqlite_persistence::{migrate_forward, stored_schema_version, VersionedSchema};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Version of the unversioned legacy database layout.
const LEGACY_SCHEMA_VERSION: usize = 1;

const ALBUM_COLUMNS: &str =
    "id, title, metadata, total_pages, layout_metadata, version, created_at, updated_at";

pub struct SqliteAlbumStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAlbumStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open album database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        let latest = Self::latest_schema();
        if is_new_db {
            info!("Creating new album database at {:?}", path);
            latest.create(&conn)?;
        } else {
            match stored_schema_version(&conn)? {
                Some(version) if version == latest.version => {
                    latest.validate(&conn).with_context(|| {
                        format!("Album database schema validation failed for version {}", version)
                    })?;
                }
                Some(version) if version > latest.version => {
                    bail!(
                        "Album database version {} is newer than supported version {}",
                        version,
                        latest.version
                    );
                }
                Some(version) => {
                    migrate_forward(&mut conn, ALBUM_VERSIONED_SCHEMAS, version)?;
                }
                None if Self::has_table(&conn, "pages")? => {
                    info!("Found unversioned legacy album database at {:?}", path);
                    migrate_forward(&mut conn, ALBUM_VERSIONED_SCHEMAS, LEGACY_SCHEMA_VERSION)?;
                }
                None if Self::is_blank(&conn)? => {
                    info!("Initializing empty album database at {:?}", path);
                    latest.create(&conn)?;
                }
                None => bail!("{:?} is not an album database", path),
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn latest_schema() -> &'static VersionedSchema {
        &ALBUM_VERSIONED_SCHEMAS[ALBUM_VERSIONED_SCHEMAS.len() - 1]
    }

    fn has_table(conn: &Connection, table: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1)",
            params![table],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn is_blank(conn: &Connection) -> Result<bool> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |r| r.get(0))?;
        Ok(count == 0)
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`, committing on success.
    fn write_transaction<T>(
        conn: &Connection,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        conn.execute("BEGIN IMMEDIATE", [])?;
        match f(conn) {
            Ok(value) => {
                conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Checks the stored version inside an open write transaction.
    fn check_version(
        conn: &Connection,
        album_id: &str,
        expected_version: i64,
    ) -> Result<Option<WriteOutcome>> {
        let actual: Option<i64> = conn
            .query_row(
                "SELECT version FROM albums WHERE id = ?1",
                params![album_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(match actual {
            None => Some(WriteOutcome::NotFound),
            Some(actual) if actual != expected_version => Some(WriteOutcome::Conflict { actual }),
            Some(_) => None,
        })
    }

    fn row_to_album(row: &rusqlite::Row) -> rusqlite::Result<AlbumRow> {
        Ok(AlbumRow {
            id: row.get(0)?,
            title: row.get(1)?,
            metadata: row.get(2)?,
            total_pages: row.get(3)?,
            layout_metadata: row.get(4)?,
            version: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    fn row_to_legacy_page(row: &rusqlite::Row) -> rusqlite::Result<LegacyPageRow> {
        Ok(LegacyPageRow {
            id: row.get(0)?,
            album_id: row.get(1)?,
            page_number: row.get(2)?,
            template_id: row.get(3)?,
            background_color: row.get(4)?,
            background_image: row.get(5)?,
        })
    }

    fn row_to_legacy_asset(row: &rusqlite::Row) -> rusqlite::Result<LegacyAssetRow> {
        Ok(LegacyAssetRow {
            id: row.get(0)?,
            page_id: row.get(1)?,
            url: row.get(2)?,
            asset_type: row.get(3)?,
            config: row.get(4)?,
            z_index: row.get(5)?,
        })
    }

    fn query_album(conn: &Connection, album_id: &str) -> Result<Option<AlbumRow>> {
        let album = conn
            .query_row(
                &format!("SELECT {} FROM albums WHERE id = ?1", ALBUM_COLUMNS),
                params![album_id],
                Self::row_to_album,
            )
            .optional()?;
        Ok(album)
    }
}

impl AlbumStore for SqliteAlbumStore {
    fn get_album(&self, album_id: &str) -> Result<Option<AlbumRow>> {
        let conn = self.conn.lock().unwrap();
        Self::query_album(&conn, album_id)
    }

    fn list_albums(&self) -> Result<Vec<AlbumListingRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.title, a.total_pages, a.layout_metadata, a.version,
                    (SELECT COUNT(*) FROM pages p WHERE p.album_id = a.id),
                    (SELECT COUNT(*) FROM album_pages ap WHERE ap.album_id = a.id)
             FROM albums a
             ORDER BY a.updated_at DESC, a.id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AlbumListingRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    total_pages: row.get(2)?,
                    layout_metadata: row.get(3)?,
                    version: row.get(4)?,
                    legacy_page_count: row.get(5)?,
                    unified_page_count: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn create_album(&self, album: &NewAlbumRow) -> Result<AlbumRow> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        Self::write_transaction(&conn, |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM albums WHERE id = ?1)",
                params![&album.id],
                |r| r.get(0),
            )?;
            if exists {
                bail!("Album with id '{}' already exists", album.id);
            }
            conn.execute(
                "INSERT INTO albums (id, title, metadata, total_pages, layout_metadata, version, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, 0, ?5, ?5)",
                params![&album.id, &album.title, &album.metadata, &album.layout_metadata, now],
            )?;
            Self::query_album(conn, &album.id)?
                .with_context(|| format!("Album '{}' vanished after insert", album.id))
        })
    }

    fn count_unified_pages(&self, album_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM album_pages WHERE album_id = ?1",
            params![album_id],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_legacy_pages(&self, album_id: &str) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE album_id = ?1",
            params![album_id],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    fn get_legacy_layout(&self, album_id: &str) -> Result<Option<Stored<LegacyLayout>>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let Some(album) = Self::query_album(&tx, album_id)? else {
            return Ok(None);
        };

        let pages = tx
            .prepare(
                "SELECT id, album_id, page_number, template_id, background_color, background_image
                 FROM pages WHERE album_id = ?1 ORDER BY rowid",
            )?
            .query_map(params![album_id], Self::row_to_legacy_page)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let assets = tx
            .prepare(
                "SELECT a.id, a.page_id, a.url, a.asset_type, a.config, a.z_index
                 FROM assets a JOIN pages p ON a.page_id = p.id
                 WHERE p.album_id = ?1
                 ORDER BY a.rowid",
            )?
            .query_map(params![album_id], Self::row_to_legacy_asset)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tx.commit()?;
        Ok(Some(Stored {
            version: album.version,
            layout: LegacyLayout {
                album_id: album.id,
                title: album.title,
                metadata: album.metadata,
                pages,
                assets,
            },
        }))
    }

    fn get_unified_layout(&self, album_id: &str) -> Result<Option<Stored<UnifiedLayout>>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let Some(album) = Self::query_album(&tx, album_id)? else {
            return Ok(None);
        };

        let pages = tx
            .prepare(
                "SELECT page_number, layout_json FROM album_pages
                 WHERE album_id = ?1 ORDER BY page_number",
            )?
            .query_map(params![album_id], |row| {
                Ok(UnifiedPageRow {
                    page_number: row.get(0)?,
                    layout_json: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        tx.commit()?;
        Ok(Some(Stored {
            version: album.version,
            layout: UnifiedLayout {
                album_id: album.id,
                title: album.title,
                metadata: album.metadata,
                total_pages: album.total_pages.unwrap_or(0),
                layout_metadata: album.layout_metadata,
                pages,
            },
        }))
    }

    fn write_unified_layout(
        &self,
        layout: &UnifiedLayout,
        expected_version: i64,
    ) -> Result<WriteOutcome> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        Self::write_transaction(&conn, |conn| {
            if let Some(outcome) = Self::check_version(conn, &layout.album_id, expected_version)? {
                return Ok(outcome);
            }

            conn.execute(
                "DELETE FROM album_pages WHERE album_id = ?1",
                params![&layout.album_id],
            )?;
            let mut insert = conn.prepare(
                "INSERT INTO album_pages (album_id, page_number, layout_json, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for page in &layout.pages {
                insert.execute(params![
                    &layout.album_id,
                    page.page_number,
                    &page.layout_json,
                    now
                ])?;
            }

            let version = expected_version + 1;
            conn.execute(
                "UPDATE albums SET title = ?2, metadata = ?3, total_pages = ?4,
                        layout_metadata = ?5, version = ?6, updated_at = ?7
                 WHERE id = ?1",
                params![
                    &layout.album_id,
                    &layout.title,
                    &layout.metadata,
                    layout.total_pages,
                    &layout.layout_metadata,
                    version,
                    now
                ],
            )?;
            debug!(
                "Wrote {} unified pages for album {} at version {}",
                layout.pages.len(),
                layout.album_id,
                version
            );
            Ok(WriteOutcome::Saved { version })
        })
    }

    fn write_legacy_layout(
        &self,
        layout: &LegacyLayout,
        removals: &LegacyRemovals,
        expected_version: i64,
    ) -> Result<WriteOutcome> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().timestamp();
        Self::write_transaction(&conn, |conn| {
            if let Some(outcome) = Self::check_version(conn, &layout.album_id, expected_version)? {
                return Ok(outcome);
            }

            let mut delete_asset = conn.prepare(
                "DELETE FROM assets WHERE id = ?1
                 AND page_id IN (SELECT id FROM pages WHERE album_id = ?2)",
            )?;
            for asset_id in &removals.asset_ids {
                delete_asset.execute(params![asset_id, &layout.album_id])?;
            }
            let mut delete_page_assets = conn.prepare(
                "DELETE FROM assets WHERE page_id IN
                 (SELECT id FROM pages WHERE id = ?1 AND album_id = ?2)",
            )?;
            let mut delete_page =
                conn.prepare("DELETE FROM pages WHERE id = ?1 AND album_id = ?2")?;
            for page_id in &removals.page_ids {
                delete_page_assets.execute(params![page_id, &layout.album_id])?;
                delete_page.execute(params![page_id, &layout.album_id])?;
            }

            let mut upsert_page = conn.prepare(
                "INSERT INTO pages (id, album_id, page_number, template_id, background_color, background_image)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    album_id = excluded.album_id,
                    page_number = excluded.page_number,
                    template_id = excluded.template_id,
                    background_color = excluded.background_color,
                    background_image = excluded.background_image",
            )?;
            for page in &layout.pages {
                upsert_page.execute(params![
                    &page.id,
                    &layout.album_id,
                    page.page_number,
                    &page.template_id,
                    &page.background_color,
                    &page.background_image
                ])?;
            }
            let mut upsert_asset = conn.prepare(
                "INSERT INTO assets (id, page_id, url, asset_type, config, z_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    page_id = excluded.page_id,
                    url = excluded.url,
                    asset_type = excluded.asset_type,
                    config = excluded.config,
                    z_index = excluded.z_index",
            )?;
            for asset in &layout.assets {
                upsert_asset.execute(params![
                    &asset.id,
                    &asset.page_id,
                    &asset.url,
                    &asset.asset_type,
                    &asset.config,
                    asset.z_index
                ])?;
            }
            debug!(
                "Wrote {} legacy pages and {} assets for album {}, removed {} pages and {} assets",
                layout.pages.len(),
                layout.assets.len(),
                layout.album_id,
                removals.page_ids.len(),
                removals.asset_ids.len()
            );

            let version = expected_version + 1;
            conn.execute(
                "UPDATE albums SET title = ?2, metadata = ?3, version = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    &layout.album_id,
                    &layout.title,
                    &layout.metadata,
                    version,
                    now
                ],
            )?;
            Ok(WriteOutcome::Saved { version })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct TestStore {
        store: SqliteAlbumStore,
        _temp_dir: TempDir, // Keep temp dir alive
    }

    fn create_test_store() -> TestStore {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("albums.db");
        let store = SqliteAlbumStore::new(&db_path).unwrap();
        TestStore {
            store,
            _temp_dir: temp_dir,
        }
    }

    fn new_album(id: &str) -> NewAlbumRow {
        NewAlbumRow {
            id: id.to_string(),
            title: format!("Album {}", id),
            metadata: "{}".to_string(),
            layout_metadata: r#"{"page_count":0}"#.to_string(),
        }
    }

    fn unified(album_id: &str, pages: &[&str]) -> UnifiedLayout {
        UnifiedLayout {
            album_id: album_id.to_string(),
            title: "Unified".to_string(),
            metadata: Some("{}".to_string()),
            total_pages: pages.len() as i64,
            layout_metadata: Some(format!(r#"{{"page_count":{}}}"#, pages.len())),
            pages: pages
                .iter()
                .enumerate()
                .map(|(i, json)| UnifiedPageRow {
                    page_number: i as i64 + 1,
                    layout_json: json.to_string(),
                })
                .collect(),
        }
    }

    fn seed_legacy(conn: &Connection) {
        conn.execute_batch(
            "INSERT INTO albums (id, title) VALUES ('legacy', 'Legacy album');
             INSERT INTO pages (id, album_id, page_number, background_color) VALUES ('p1', 'legacy', 1, '#fff');
             INSERT INTO pages (id, album_id, page_number) VALUES ('p2', 'legacy', 2);
             INSERT INTO assets (id, page_id, url, asset_type, config) VALUES ('x1', 'p1', 'https://cdn/1.jpg', 'image', '{\"x\":10}');
             INSERT INTO assets (id, page_id, url, asset_type, config, z_index) VALUES ('x2', 'p1', 'hello', 'text', '{}', 21);",
        )
        .unwrap();
    }

    #[test]
    fn test_create_and_get_album() {
        let test = create_test_store();
        let store = &test.store;

        let created = store.create_album(&new_album("a1")).unwrap();
        assert_eq!(created.version, 0);
        assert_eq!(created.total_pages, Some(0));

        let fetched = store.get_album("a1").unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(store.get_album("missing").unwrap().is_none());
        assert!(store.create_album(&new_album("a1")).is_err());
    }

    #[test]
    fn test_unified_write_bumps_version_and_replaces_pages() {
        let test = create_test_store();
        let store = &test.store;
        store.create_album(&new_album("a1")).unwrap();

        let outcome = store
            .write_unified_layout(&unified("a1", &["{\"n\":1}", "{\"n\":2}"]), 0)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Saved { version: 1 });

        let outcome = store
            .write_unified_layout(&unified("a1", &["{\"n\":3}"]), 1)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Saved { version: 2 });

        let stored = store.get_unified_layout("a1").unwrap().unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.layout.total_pages, 1);
        assert_eq!(stored.layout.pages.len(), 1);
        assert_eq!(stored.layout.pages[0].layout_json, "{\"n\":3}");
        assert_eq!(store.count_unified_pages("a1").unwrap(), 1);
    }

    #[test]
    fn test_stale_write_is_rejected_without_changes() {
        let test = create_test_store();
        let store = &test.store;
        store.create_album(&new_album("a1")).unwrap();
        store
            .write_unified_layout(&unified("a1", &["{\"winner\":true}"]), 0)
            .unwrap();

        let outcome = store
            .write_unified_layout(&unified("a1", &["{\"loser\":true}", "{}"]), 0)
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Conflict { actual: 1 });
        let stored = store.get_unified_layout("a1").unwrap().unwrap();
        assert_eq!(stored.layout.pages.len(), 1);
        assert_eq!(stored.layout.pages[0].layout_json, "{\"winner\":true}");
    }

    #[test]
    fn test_write_to_missing_album() {
        let test = create_test_store();
        let outcome = test
            .store
            .write_unified_layout(&unified("ghost", &[]), 0)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::NotFound);
    }

    #[test]
    fn test_legacy_rows_read_in_row_order() {
        let test = create_test_store();
        seed_legacy(&test.store.conn.lock().unwrap());

        let stored = test.store.get_legacy_layout("legacy").unwrap().unwrap();
        assert_eq!(stored.version, 0);
        assert_eq!(stored.layout.pages.len(), 2);
        let ids: Vec<&str> = stored.layout.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "x2"]);
        assert_eq!(stored.layout.assets[1].z_index, Some(21));
        assert_eq!(test.store.count_legacy_pages("legacy").unwrap(), 2);
        assert_eq!(test.store.count_unified_pages("legacy").unwrap(), 0);
    }

    #[test]
    fn test_unified_write_leaves_legacy_rows() {
        let test = create_test_store();
        seed_legacy(&test.store.conn.lock().unwrap());

        test.store
            .write_unified_layout(&unified("legacy", &["{}", "{}"]), 0)
            .unwrap();

        let stored = test.store.get_legacy_layout("legacy").unwrap().unwrap();
        assert_eq!(stored.layout.pages.len(), 2);
        assert_eq!(stored.layout.assets.len(), 2);
        assert_eq!(stored.version, 1);
    }

    fn legacy_page(id: &str, page_number: i64) -> LegacyPageRow {
        LegacyPageRow {
            id: id.to_string(),
            album_id: "legacy".to_string(),
            page_number,
            template_id: None,
            background_color: Some("#000".to_string()),
            background_image: None,
        }
    }

    fn legacy_asset(id: &str, page_id: &str) -> LegacyAssetRow {
        LegacyAssetRow {
            id: id.to_string(),
            page_id: page_id.to_string(),
            url: Some(format!("https://cdn/{}.jpg", id)),
            asset_type: "image".to_string(),
            config: Some("{}".to_string()),
            z_index: Some(10),
        }
    }

    #[test]
    fn test_legacy_write_upserts_and_removes_named_rows() {
        let test = create_test_store();
        seed_legacy(&test.store.conn.lock().unwrap());

        // p2 is deleted, x2 is removed, x1 moves onto the new page p9
        let layout = LegacyLayout {
            album_id: "legacy".to_string(),
            title: "Renamed".to_string(),
            metadata: None,
            pages: vec![legacy_page("p1", 1), legacy_page("p9", 2)],
            assets: vec![legacy_asset("x1", "p9"), legacy_asset("x9", "p1")],
        };
        let removals = LegacyRemovals {
            page_ids: vec!["p2".to_string()],
            asset_ids: vec!["x2".to_string()],
        };
        assert_eq!(
            test.store.write_legacy_layout(&layout, &removals, 1).unwrap(),
            WriteOutcome::Conflict { actual: 0 }
        );
        assert_eq!(
            test.store.write_legacy_layout(&layout, &removals, 0).unwrap(),
            WriteOutcome::Saved { version: 1 }
        );

        let stored = test.store.get_legacy_layout("legacy").unwrap().unwrap();
        assert_eq!(stored.layout.title, "Renamed");
        assert_eq!(stored.layout.pages, layout.pages);
        let mut assets = stored.layout.assets.clone();
        assets.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(assets, layout.assets);
        assert!(test.store.get_album("legacy").unwrap().unwrap().layout_metadata.is_none());
    }

    #[test]
    fn test_legacy_write_leaves_unnamed_rows() {
        let test = create_test_store();
        {
            let conn = test.store.conn.lock().unwrap();
            seed_legacy(&conn);
            conn.execute(
                "INSERT INTO assets (id, page_id, url, asset_type, config)
                 VALUES ('broken', 'p1', NULL, 'hologram', '{')",
                [],
            )
            .unwrap();
        }

        let layout = LegacyLayout {
            album_id: "legacy".to_string(),
            title: "Legacy album".to_string(),
            metadata: None,
            pages: vec![legacy_page("p1", 1), legacy_page("p2", 2)],
            assets: vec![legacy_asset("x1", "p1"), legacy_asset("x2", "p1")],
        };
        test.store
            .write_legacy_layout(&layout, &LegacyRemovals::default(), 0)
            .unwrap();

        let stored = test.store.get_legacy_layout("legacy").unwrap().unwrap();
        let ids: Vec<&str> = stored.layout.assets.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "x2", "broken"]);
        let broken = &stored.layout.assets[2];
        assert_eq!(broken.asset_type, "hologram");
        assert_eq!(broken.config.as_deref(), Some("{"));
    }

    #[test]
    fn test_list_albums_counts_pages() {
        let test = create_test_store();
        seed_legacy(&test.store.conn.lock().unwrap());
        test.store.create_album(&new_album("fresh")).unwrap();

        let listing = test.store.list_albums().unwrap();
        assert_eq!(listing.len(), 2);
        let legacy = listing.iter().find(|l| l.id == "legacy").unwrap();
        assert_eq!(legacy.legacy_page_count, 2);
        assert_eq!(legacy.total_pages, None);
        let fresh = listing.iter().find(|l| l.id == "fresh").unwrap();
        assert_eq!(fresh.total_pages, Some(0));
        assert_eq!(fresh.unified_page_count, 0);
    }

    #[test]
    fn test_reopen_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("albums.db");
        {
            let store = SqliteAlbumStore::new(&db_path).unwrap();
            store.create_album(&new_album("kept")).unwrap();
        }
        let store = SqliteAlbumStore::new(&db_path).unwrap();
        assert!(store.get_album("kept").unwrap().is_some());
    }

    #[test]
    fn test_unversioned_legacy_database_is_migrated() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("legacy.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            ALBUM_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
            conn.pragma_update(None, "user_version", 0).unwrap();
            seed_legacy(&conn);
        }

        let store = SqliteAlbumStore::new(&db_path).unwrap();

        let album = store.get_album("legacy").unwrap().unwrap();
        assert_eq!(album.version, 0);
        assert!(album.layout_metadata.is_none());
        assert_eq!(store.count_legacy_pages("legacy").unwrap(), 2);
        let conn = store.conn.lock().unwrap();
        assert_eq!(stored_schema_version(&conn).unwrap(), Some(2));
    }

    #[test]
    fn test_foreign_database_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("other.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute("CREATE TABLE something_else (id INTEGER)", [])
                .unwrap();
        }
        assert!(SqliteAlbumStore::new(&db_path).is_err());
    }
}
