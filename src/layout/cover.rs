//! Cover image selection for list views.
//!
//! An explicit `metadata.cover_url` wins. Otherwise the first image in
//! render order is used, then the first video, otherwise there is no cover.

use super::model::{Album, AssetType};

pub fn resolve_cover(album: &Album) -> Option<String> {
    if let Some(url) = album
        .metadata
        .cover_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        return Some(url.to_string());
    }
    first_of_type(album, AssetType::Image).or_else(|| first_of_type(album, AssetType::Video))
}

fn first_of_type(album: &Album, asset_type: AssetType) -> Option<String> {
    album.pages.iter().find_map(|page| {
        page.assets_in_render_order()
            .into_iter()
            .find(|a| a.asset_type == asset_type && !a.content.is_empty())
            .map(|a| a.content.clone())
    })
}
