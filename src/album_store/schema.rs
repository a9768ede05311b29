//! SQLite schema definitions for the album database.
//!
//! Version 1 is the per-row legacy layout. Version 2 adds the unified
//! layout: cached summaries on the album row, an optimistic-concurrency
//! version stamp and one JSON document per page.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

const ALBUM_FK: ForeignKey = ForeignKey {
    foreign_table: "albums",
    foreign_column: "id",
};

const PAGE_FK: ForeignKey = ForeignKey {
    foreign_table: "pages",
    foreign_column: "id",
};

// =============================================================================
// Version 1 - Legacy per-row layout
// =============================================================================

const ALBUMS_TABLE_V1: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("metadata", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

/// Legacy pages. Page numbers were never constrained, duplicates exist in
/// the wild and are resolved when the album is loaded.
const PAGES_TABLE_V1: Table = Table {
    name: "pages",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ALBUM_FK)
        ),
        sqlite_column!("page_number", &SqlType::Integer, non_null = true),
        sqlite_column!("template_id", &SqlType::Text),
        sqlite_column!("background_color", &SqlType::Text),
        sqlite_column!("background_image", &SqlType::Text),
    ],
    indices: &[("idx_pages_album_id", "album_id")],
    unique_constraints: &[],
};

const ASSETS_TABLE_V1: Table = Table {
    name: "assets",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!(
            "page_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&PAGE_FK)
        ),
        sqlite_column!("url", &SqlType::Text),
        sqlite_column!("asset_type", &SqlType::Text, non_null = true),
        sqlite_column!("config", &SqlType::Text),
        sqlite_column!("z_index", &SqlType::Integer),
    ],
    indices: &[("idx_assets_page_id", "page_id")],
    unique_constraints: &[],
};

// =============================================================================
// Version 2 - Unified JSON layout
// =============================================================================

const ALBUMS_TABLE_V2: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("metadata", &SqlType::Text),
        sqlite_column!(
            "created_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
        sqlite_column!("total_pages", &SqlType::Integer),
        sqlite_column!("layout_metadata", &SqlType::Text),
        sqlite_column!(
            "version",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ALBUM_PAGES_TABLE_V2: Table = Table {
    name: "album_pages",
    columns: &[
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ALBUM_FK)
        ),
        sqlite_column!("page_number", &SqlType::Integer, non_null = true),
        sqlite_column!("layout_json", &SqlType::Text, non_null = true),
        sqlite_column!(
            "updated_at",
            &SqlType::Integer,
            non_null = true,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
    unique_constraints: &[&["album_id", "page_number"]],
};

fn migrate_v1_to_v2(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "ALTER TABLE albums ADD COLUMN total_pages INTEGER;
         ALTER TABLE albums ADD COLUMN layout_metadata TEXT;
         ALTER TABLE albums ADD COLUMN version INTEGER NOT NULL DEFAULT 0;",
    )?;
    ALBUM_PAGES_TABLE_V2.create(conn)?;
    Ok(())
}

pub const ALBUM_VERSIONED_SCHEMAS: &[VersionedSchema] = &[
    VersionedSchema {
        version: 1,
        tables: &[ALBUMS_TABLE_V1, PAGES_TABLE_V1, ASSETS_TABLE_V1],
        migration: None,
    },
    VersionedSchema {
        version: 2,
        tables: &[
            ALBUMS_TABLE_V2,
            PAGES_TABLE_V1,
            ASSETS_TABLE_V1,
            ALBUM_PAGES_TABLE_V2,
        ],
        migration: Some(migrate_v1_to_v2),
    },
];
