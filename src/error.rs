use crate::adapters::ConversionError;
use crate::layout::ValidationError;
use thiserror::Error;

/// Errors surfaced to album consumers.
#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("album '{0}' not found")]
    NotFound(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("album '{album_id}' was saved by someone else (expected version {expected}, found {actual})")]
    SaveConflict {
        album_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("album '{album_id}' has {count} stored pages that could not be read; saving would discard them")]
    UnreadablePages { album_id: String, count: usize },

    #[error("invalid edit: {0}")]
    Validation(#[from] ValidationError),

    #[error("upload failed: {0:#}")]
    Upload(anyhow::Error),
}

impl AlbumError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, AlbumError::SaveConflict { .. })
    }
}

pub type AlbumResult<T> = Result<T, AlbumError>;
