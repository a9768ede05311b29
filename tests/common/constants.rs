//! Shared constants for end-to-end tests
//!
//! When the seeded legacy album changes, update only this file.

// ============================================================================
// Seeded legacy album
// ============================================================================

pub const LEGACY_ALBUM_ID: &str = "legacy-album-1";
pub const LEGACY_ALBUM_TITLE: &str = "Lisbon 2019";

pub const LEGACY_PAGE_1_ID: &str = "legacy-page-1";
pub const LEGACY_PAGE_2_ID: &str = "legacy-page-2";

/// Image on page 1 with config `{x:10, y:20, width:200, height:150}` and no z_index
pub const LEGACY_IMAGE_ID: &str = "legacy-image-1";
pub const LEGACY_IMAGE_URL: &str = "https://cdn.example/lisbon/tram.jpg";

/// Caption on page 2 with its z_index column set
pub const LEGACY_TEXT_ID: &str = "legacy-text-1";
pub const LEGACY_TEXT_CONTENT: &str = "Tram 28";

/// Photo band base
pub const PHOTO_BAND: i32 = 10;

// ============================================================================
// Editor
// ============================================================================

pub const HISTORY_CAPACITY: usize = 20;
