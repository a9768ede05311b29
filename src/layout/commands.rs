//! Editor command layer.
//!
//! Each command works on a candidate copy and only replaces the album once
//! the candidate passes validation, so a rejected command leaves the album
//! exactly as it was.

use super::model::{
    normalize_rotation, Album, AlbumMetadata, Asset, AssetType, BackgroundConfig, Page, Position,
    Size, Transform,
};
use super::validation::{validate_album, ValidationError, ValidationResult};
use uuid::Uuid;

/// Input for [`add_asset`]; the id and z-index are assigned by the command.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub asset_type: AssetType,
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub transform: Transform,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn commit<T>(
    album: &mut Album,
    apply: impl FnOnce(&mut Album) -> ValidationResult<T>,
) -> ValidationResult<T> {
    let mut candidate = album.clone();
    let out = apply(&mut candidate)?;
    validate_album(&candidate)?;
    *album = candidate;
    Ok(out)
}

fn page_count(album: &Album) -> u32 {
    album.pages.len() as u32
}

pub fn add_page(album: &mut Album, background: BackgroundConfig) -> ValidationResult<String> {
    let position = page_count(album) + 1;
    insert_page(album, position, background)
}

/// Inserts a blank page so that it becomes `page_number`; later pages shift up.
pub fn insert_page(
    album: &mut Album,
    page_number: u32,
    background: BackgroundConfig,
) -> ValidationResult<String> {
    commit(album, |album| {
        let count = page_count(album);
        if page_number == 0 || page_number > count + 1 {
            return Err(ValidationError::InvalidPagePosition {
                position: page_number,
                page_count: count,
            });
        }
        let id = new_id();
        album.pages.insert(
            page_number as usize - 1,
            Page {
                id: id.clone(),
                page_number,
                background,
                template_id: None,
                assets: Vec::new(),
                extra: Default::default(),
            },
        );
        album.renumber_pages();
        Ok(id)
    })
}

pub fn delete_page(album: &mut Album, page_number: u32) -> ValidationResult<Page> {
    commit(album, |album| {
        let index = album
            .pages
            .iter()
            .position(|p| p.page_number == page_number)
            .ok_or(ValidationError::PageNotFound(page_number))?;
        let removed = album.pages.remove(index);
        album.renumber_pages();
        Ok(removed)
    })
}

pub fn move_page(album: &mut Album, from: u32, to: u32) -> ValidationResult<()> {
    commit(album, |album| {
        let count = page_count(album);
        let index = album
            .pages
            .iter()
            .position(|p| p.page_number == from)
            .ok_or(ValidationError::PageNotFound(from))?;
        if to == 0 || to > count {
            return Err(ValidationError::InvalidPagePosition {
                position: to,
                page_count: count,
            });
        }
        let page = album.pages.remove(index);
        album.pages.insert(to as usize - 1, page);
        album.renumber_pages();
        Ok(())
    })
}

pub fn set_background(
    album: &mut Album,
    page_number: u32,
    background: BackgroundConfig,
) -> ValidationResult<()> {
    commit(album, |album| {
        let page = album
            .page_mut(page_number)
            .ok_or(ValidationError::PageNotFound(page_number))?;
        page.background = background;
        Ok(())
    })
}

/// Adds an asset on top of its type's band on the given page.
pub fn add_asset(album: &mut Album, page_number: u32, asset: NewAsset) -> ValidationResult<String> {
    commit(album, |album| {
        let page = album
            .page_mut(page_number)
            .ok_or(ValidationError::PageNotFound(page_number))?;
        let z_index = asset
            .asset_type
            .band()
            .slot(page.count_of_type(asset.asset_type));
        let id = new_id();
        page.assets.push(Asset {
            id: id.clone(),
            asset_type: asset.asset_type,
            content: asset.content,
            position: asset.position,
            size: asset.size,
            transform: Transform {
                rotation: normalize_rotation(asset.transform.rotation),
                ..asset.transform
            },
            z_index,
            extra: Default::default(),
        });
        Ok(id)
    })
}

pub fn update_asset_geometry(
    album: &mut Album,
    asset_id: &str,
    position: Position,
    size: Size,
    transform: Transform,
) -> ValidationResult<()> {
    commit(album, |album| {
        let asset = album
            .asset_mut(asset_id)
            .ok_or_else(|| ValidationError::AssetNotFound(asset_id.to_string()))?;
        asset.position = position;
        asset.size = size;
        asset.transform = Transform {
            rotation: normalize_rotation(transform.rotation),
            ..transform
        };
        Ok(())
    })
}

pub fn set_asset_z_index(album: &mut Album, asset_id: &str, z_index: i32) -> ValidationResult<()> {
    commit(album, |album| {
        let asset = album
            .asset_mut(asset_id)
            .ok_or_else(|| ValidationError::AssetNotFound(asset_id.to_string()))?;
        asset.z_index = z_index;
        Ok(())
    })
}

pub fn update_asset_content(
    album: &mut Album,
    asset_id: &str,
    content: impl Into<String>,
) -> ValidationResult<()> {
    let content = content.into();
    commit(album, |album| {
        let asset = album
            .asset_mut(asset_id)
            .ok_or_else(|| ValidationError::AssetNotFound(asset_id.to_string()))?;
        asset.content = content;
        Ok(())
    })
}

pub fn remove_asset(album: &mut Album, asset_id: &str) -> ValidationResult<Asset> {
    commit(album, |album| {
        for page in album.pages.iter_mut() {
            if let Some(index) = page.assets.iter().position(|a| a.id == asset_id) {
                return Ok(page.assets.remove(index));
            }
        }
        Err(ValidationError::AssetNotFound(asset_id.to_string()))
    })
}

pub fn update_metadata(album: &mut Album, metadata: AlbumMetadata) -> ValidationResult<()> {
    commit(album, |album| {
        album.metadata = metadata;
        Ok(())
    })
}

pub fn set_title(album: &mut Album, title: impl Into<String>) -> ValidationResult<()> {
    let title = title.into();
    commit(album, |album| {
        album.title = title;
        Ok(())
    })
}
