use crate::layout::{Album, ValidationError};
use thiserror::Error;

/// A per-row problem that was recovered from by dropping or fixing the row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionWarning {
    #[error("asset '{asset_id}': unreadable config ({reason}), skipped")]
    UnparseableConfig { asset_id: String, reason: String },

    #[error("asset '{asset_id}': unknown type '{asset_type}', skipped")]
    UnknownAssetType { asset_id: String, asset_type: String },

    #[error("asset '{asset_id}' references missing page '{page_id}', skipped")]
    OrphanAsset { asset_id: String, page_id: String },

    #[error("asset '{asset_id}': {reason}, skipped")]
    InvalidAsset {
        asset_id: String,
        reason: ValidationError,
    },

    #[error("id '{id}' appears more than once, later copy skipped")]
    DuplicateId { id: String },

    #[error("asset '{asset_id}': z-index {from} moved into its band as {to}")]
    ZIndexClamped { asset_id: String, from: i64, to: i32 },

    #[error("pages were not numbered 1..N and have been renumbered")]
    PagesRenumbered,

    #[error("page {page_number}: unreadable layout ({reason}), skipped")]
    UnreadablePage { page_number: i64, reason: String },

    #[error("album metadata unreadable ({reason}), defaults used")]
    InvalidMetadata { reason: String },
}

/// Whole-album failures that per-row skipping cannot recover from.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("album '{album_id}' has {skipped} unified pages and none is readable")]
    NoReadablePages { album_id: String, skipped: usize },

    #[error("album '{album_id}' metadata is malformed: {source}")]
    InvalidMetadata {
        album_id: String,
        source: serde_json::Error,
    },

    #[error("failed to serialize album: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An adapter result: the canonical album plus every recovered problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub album: Album,
    pub warnings: Vec<ConversionWarning>,
}
