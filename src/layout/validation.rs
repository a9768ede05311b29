//! Invariant checks for the canonical document.
//!
//! Commands validate the candidate album before committing it, and the
//! unified adapter validates every page it reads back.

use super::model::{Album, Asset, AssetType, Page, ZBand};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("asset '{asset_id}' ({asset_type}) has z-index {z_index} outside band {band}")]
    ZIndexOutOfBand {
        asset_id: String,
        asset_type: AssetType,
        z_index: i32,
        band: ZBand,
    },

    #[error("page number {0} appears more than once")]
    DuplicatePageNumber(u32),

    #[error("pages must be numbered contiguously: expected {expected}, found {found}")]
    PageNumberGap { expected: u32, found: u32 },

    #[error("a published album needs at least one page")]
    NoPagesInPublishedAlbum,

    #[error("asset '{asset_id}' has invalid scale {scale}")]
    InvalidScale { asset_id: String, scale: f64 },

    #[error("asset '{asset_id}' rotation {rotation} is outside [0, 360)")]
    RotationNotNormalized { asset_id: String, rotation: f64 },

    #[error("asset '{asset_id}' crop rectangle exceeds page bounds")]
    CropOutOfBounds { asset_id: String },

    #[error("asset '{asset_id}' has a non-finite {field}")]
    NonFinite {
        asset_id: String,
        field: &'static str,
    },

    #[error("asset '{asset_id}' has non-positive size")]
    InvalidSize { asset_id: String },

    #[error("page {0} not found")]
    PageNotFound(u32),

    #[error("asset '{0}' not found")]
    AssetNotFound(String),

    #[error("id '{0}' is used more than once")]
    DuplicateId(String),

    #[error("page position {position} is invalid for an album with {page_count} pages")]
    InvalidPagePosition { position: u32, page_count: u32 },

    #[error("document belongs to album '{found}', not '{expected}'")]
    AlbumIdMismatch { expected: String, found: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn validate_asset(asset: &Asset) -> ValidationResult<()> {
    let non_finite = |field: &'static str| ValidationError::NonFinite {
        asset_id: asset.id.clone(),
        field,
    };
    if !(asset.position.x.is_finite() && asset.position.y.is_finite()) {
        return Err(non_finite("position"));
    }
    if !(asset.size.width.is_finite() && asset.size.height.is_finite()) {
        return Err(non_finite("size"));
    }
    if asset.size.width <= 0.0 || asset.size.height <= 0.0 {
        return Err(ValidationError::InvalidSize {
            asset_id: asset.id.clone(),
        });
    }

    let transform = &asset.transform;
    if !transform.rotation.is_finite() {
        return Err(non_finite("rotation"));
    }
    if !(0.0..360.0).contains(&transform.rotation) {
        return Err(ValidationError::RotationNotNormalized {
            asset_id: asset.id.clone(),
            rotation: transform.rotation,
        });
    }
    if !transform.scale.is_finite() || transform.scale <= 0.0 {
        return Err(ValidationError::InvalidScale {
            asset_id: asset.id.clone(),
            scale: transform.scale,
        });
    }
    if let Some(crop) = &transform.crop {
        let within = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        let fits = within(crop.x)
            && within(crop.y)
            && within(crop.width)
            && within(crop.height)
            && crop.x + crop.width <= 100.0
            && crop.y + crop.height <= 100.0;
        if !fits {
            return Err(ValidationError::CropOutOfBounds {
                asset_id: asset.id.clone(),
            });
        }
    }

    let band = asset.asset_type.band();
    if !band.contains(asset.z_index) {
        return Err(ValidationError::ZIndexOutOfBand {
            asset_id: asset.id.clone(),
            asset_type: asset.asset_type,
            z_index: asset.z_index,
            band,
        });
    }
    Ok(())
}

/// Checks everything on a page except its number.
pub fn validate_page(page: &Page) -> ValidationResult<()> {
    let mut ids = HashSet::new();
    for asset in &page.assets {
        if !ids.insert(asset.id.as_str()) {
            return Err(ValidationError::DuplicateId(asset.id.clone()));
        }
        validate_asset(asset)?;
    }
    Ok(())
}

/// Pages must be stored in order and numbered `1..=N`.
pub fn validate_page_numbers(pages: &[Page]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for (index, page) in pages.iter().enumerate() {
        if !seen.insert(page.page_number) {
            return Err(ValidationError::DuplicatePageNumber(page.page_number));
        }
        let expected = index as u32 + 1;
        if page.page_number != expected {
            return Err(ValidationError::PageNumberGap {
                expected,
                found: page.page_number,
            });
        }
    }
    Ok(())
}

pub fn validate_album(album: &Album) -> ValidationResult<()> {
    if album.metadata.published && album.pages.is_empty() {
        return Err(ValidationError::NoPagesInPublishedAlbum);
    }
    validate_page_numbers(&album.pages)?;

    let mut page_ids = HashSet::new();
    let mut asset_ids = HashSet::new();
    for page in &album.pages {
        if !page_ids.insert(page.id.as_str()) {
            return Err(ValidationError::DuplicateId(page.id.clone()));
        }
        validate_page(page)?;
        for asset in &page.assets {
            if !asset_ids.insert(asset.id.as_str()) {
                return Err(ValidationError::DuplicateId(asset.id.clone()));
            }
        }
    }
    Ok(())
}
