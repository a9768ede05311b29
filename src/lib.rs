//! Album layout persistence and migration.
//!
//! Albums live either in the legacy per-row shape or in the unified
//! JSON-per-page shape. Everything above the adapters works on the
//! canonical [`layout::Album`] regardless of where it was loaded from.

pub mod adapters;
pub mod album_store;
pub mod config;
pub mod editor;
pub mod error;
pub mod layout;
pub mod realtime;
pub mod service;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use adapters::SchemaVariant;
pub use album_store::{AlbumStore, SqliteAlbumStore};
pub use editor::{EditHistory, EditorSession};
pub use error::{AlbumError, AlbumResult};
pub use realtime::ChangeNotifier;
pub use service::AlbumDataService;
