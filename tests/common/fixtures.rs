//! Test fixture creation for album databases
//!
//! Legacy rows are inserted with direct SQL: the store never writes the
//! legacy shape for albums it did not load from it.

use super::constants::*;
use album_layout::album_store::{SqliteAlbumStore, ALBUM_VERSIONED_SCHEMAS};
use anyhow::Result;
use rusqlite::{params, Connection};
use std::path::Path;

/// Inserts the standard two-page legacy album.
pub fn seed_legacy_album(db_path: &Path) -> Result<()> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT INTO albums (id, title, metadata) VALUES (?1, ?2, ?3)",
        params![
            LEGACY_ALBUM_ID,
            LEGACY_ALBUM_TITLE,
            r#"{"category":"travel","hashtags":["lisbon"]}"#
        ],
    )?;
    conn.execute(
        "INSERT INTO pages (id, album_id, page_number, background_color) VALUES (?1, ?2, 1, '#fafafa')",
        params![LEGACY_PAGE_1_ID, LEGACY_ALBUM_ID],
    )?;
    conn.execute(
        "INSERT INTO pages (id, album_id, page_number) VALUES (?1, ?2, 2)",
        params![LEGACY_PAGE_2_ID, LEGACY_ALBUM_ID],
    )?;
    conn.execute(
        "INSERT INTO assets (id, page_id, url, asset_type, config) VALUES (?1, ?2, ?3, 'image', ?4)",
        params![
            LEGACY_IMAGE_ID,
            LEGACY_PAGE_1_ID,
            LEGACY_IMAGE_URL,
            r#"{"x":10,"y":20,"width":200,"height":150}"#
        ],
    )?;
    conn.execute(
        "INSERT INTO assets (id, page_id, asset_type, config, z_index) VALUES (?1, ?2, 'text', ?3, 22)",
        params![
            LEGACY_TEXT_ID,
            LEGACY_PAGE_2_ID,
            format!(r#"{{"x":5,"y":80,"text":"{}"}}"#, LEGACY_TEXT_CONTENT)
        ],
    )?;
    Ok(())
}

/// Adds assets that cannot be converted to page 1 of the seeded album.
pub fn seed_malformed_assets(db_path: &Path) -> Result<()> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "INSERT INTO assets (id, page_id, url, asset_type, config) VALUES ('bad-type', ?1, 'x', 'hologram', '{}')",
        params![LEGACY_PAGE_1_ID],
    )?;
    conn.execute(
        "INSERT INTO assets (id, page_id, url, asset_type, config) VALUES ('bad-config', ?1, 'y', 'image', '{not json')",
        params![LEGACY_PAGE_1_ID],
    )?;
    Ok(())
}

/// Every legacy row of an album, serialized for before/after comparison.
pub fn legacy_rows_snapshot(db_path: &Path, album_id: &str) -> Result<Vec<String>> {
    let conn = Connection::open(db_path)?;
    let mut rows = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT id, page_number, template_id, background_color, background_image
         FROM pages WHERE album_id = ?1 ORDER BY id",
    )?;
    let pages = stmt.query_map(params![album_id], |r| {
        Ok(format!(
            "page {} {} {:?} {:?} {:?}",
            r.get::<_, String>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, Option<String>>(3)?,
            r.get::<_, Option<String>>(4)?
        ))
    })?;
    for page in pages {
        rows.push(page?);
    }

    let mut stmt = conn.prepare(
        "SELECT a.id, a.page_id, a.url, a.asset_type, a.config, a.z_index
         FROM assets a JOIN pages p ON a.page_id = p.id
         WHERE p.album_id = ?1 ORDER BY a.id",
    )?;
    let assets = stmt.query_map(params![album_id], |r| {
        Ok(format!(
            "asset {} {} {:?} {} {:?} {:?}",
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, Option<String>>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<i64>>(5)?
        ))
    })?;
    for asset in assets {
        rows.push(asset?);
    }
    Ok(rows)
}

/// Stored layout document of one unified page.
pub fn unified_page_json(db_path: &Path, album_id: &str, page_number: i64) -> Result<String> {
    let conn = Connection::open(db_path)?;
    Ok(conn.query_row(
        "SELECT layout_json FROM album_pages WHERE album_id = ?1 AND page_number = ?2",
        params![album_id, page_number],
        |r| r.get(0),
    )?)
}

/// Overwrites one unified page document, as another client might.
pub fn write_unified_page_json(
    db_path: &Path,
    album_id: &str,
    page_number: i64,
    layout_json: &str,
) -> Result<()> {
    let conn = Connection::open(db_path)?;
    conn.execute(
        "UPDATE album_pages SET layout_json = ?3 WHERE album_id = ?1 AND page_number = ?2",
        params![album_id, page_number, layout_json],
    )?;
    Ok(())
}

pub fn count_rows(db_path: &Path, sql: &str, album_id: &str) -> Result<i64> {
    let conn = Connection::open(db_path)?;
    Ok(conn.query_row(sql, params![album_id], |r| r.get(0))?)
}

/// Creates a database the way the pre-versioning app left it: legacy
/// tables only and `user_version = 0`.
pub fn create_unversioned_legacy_db(db_path: &Path) -> Result<()> {
    let conn = Connection::open(db_path)?;
    ALBUM_VERSIONED_SCHEMAS[0].create(&conn)?;
    conn.pragma_update(None, "user_version", 0)?;
    Ok(())
}

/// Opens (and thereby creates) the store at `db_path`, then closes it.
pub fn create_empty_db(db_path: &Path) -> Result<()> {
    SqliteAlbumStore::new(db_path)?;
    Ok(())
}
