//! Conversion between the per-row legacy layout and the canonical album.
//!
//! Legacy asset rows keep their geometry in a free-form `config` JSON
//! object whose numbers were written both as JSON numbers and as strings
//! over the years. Everything is normalized here; rows that cannot be
//! normalized are dropped with a warning so the rest of the album loads.

use super::warnings::{ConversionError, ConversionWarning, Converted};
use crate::album_store::{LegacyAssetRow, LegacyLayout, LegacyPageRow};
use crate::layout::{
    normalize_rotation, validate_asset, Album, AlbumMetadata, Asset, AssetType,
    BackgroundConfig, CropRect, Page, Position, Size, Transform,
};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Geometry defaults legacy rows were historically created with.
pub const DEFAULT_WIDTH: f64 = 200.0;
pub const DEFAULT_HEIGHT: f64 = 150.0;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_ROTATION: f64 = 0.0;

pub struct LegacyAdapter;

impl LegacyAdapter {
    pub fn from_legacy_rows(layout: &LegacyLayout) -> Result<Converted, ConversionError> {
        let mut warnings = Vec::new();

        let metadata = parse_metadata(layout.metadata.as_deref(), &mut warnings);

        let mut page_rows: Vec<&LegacyPageRow> = layout.pages.iter().collect();
        page_rows.sort_by_key(|p| p.page_number);

        let mut album = Album {
            id: layout.album_id.clone(),
            title: layout.title.clone(),
            metadata,
            pages: Vec::with_capacity(page_rows.len()),
        };
        // pages and assets live in separate tables, so their ids may overlap
        let mut seen_page_ids = HashSet::new();
        let mut seen_asset_ids = HashSet::new();
        let mut page_index = HashMap::new();
        for row in page_rows {
            if !seen_page_ids.insert(row.id.clone()) {
                warnings.push(ConversionWarning::DuplicateId { id: row.id.clone() });
                continue;
            }
            page_index.insert(row.id.as_str(), album.pages.len());
            album.pages.push(Page {
                id: row.id.clone(),
                page_number: row.page_number.max(0) as u32,
                background: legacy_background(row),
                template_id: row.template_id.clone(),
                assets: Vec::new(),
                extra: Default::default(),
            });
        }
        if album.renumber_pages() {
            warnings.push(ConversionWarning::PagesRenumbered);
        }

        for row in &layout.assets {
            let Some(&index) = page_index.get(row.page_id.as_str()) else {
                warnings.push(ConversionWarning::OrphanAsset {
                    asset_id: row.id.clone(),
                    page_id: row.page_id.clone(),
                });
                continue;
            };
            if seen_asset_ids.contains(&row.id) {
                warnings.push(ConversionWarning::DuplicateId { id: row.id.clone() });
                continue;
            }
            let page = &mut album.pages[index];
            match convert_asset(row, page, &mut warnings) {
                Ok(asset) => {
                    seen_asset_ids.insert(asset.id.clone());
                    page.assets.push(asset);
                }
                Err(warning) => warnings.push(warning),
            }
        }

        for warning in &warnings {
            warn!("Legacy album {}: {}", layout.album_id, warning);
        }
        Ok(Converted { album, warnings })
    }

    /// Serializes an album back into legacy rows. Gradients have no legacy
    /// representation and are written as their first stop color.
    pub fn to_legacy_rows(album: &Album) -> Result<LegacyLayout, ConversionError> {
        let mut pages = Vec::with_capacity(album.pages.len());
        let mut assets = Vec::with_capacity(album.asset_count());

        for page in &album.pages {
            let (background_color, background_image) = match &page.background {
                BackgroundConfig::Solid { color } => (Some(color.clone()), None),
                BackgroundConfig::Image { url } => (None, Some(url.clone())),
                BackgroundConfig::Gradient { stops, .. } => {
                    warn!(
                        "Album {} page {}: gradient background stored as solid color",
                        album.id, page.page_number
                    );
                    (stops.first().map(|s| s.color.clone()), None)
                }
            };
            pages.push(LegacyPageRow {
                id: page.id.clone(),
                album_id: album.id.clone(),
                page_number: page.page_number as i64,
                template_id: page.template_id.clone(),
                background_color,
                background_image,
            });

            for asset in &page.assets {
                let mut config = json!({
                    "x": asset.position.x,
                    "y": asset.position.y,
                    "width": asset.size.width,
                    "height": asset.size.height,
                    "rotation": asset.transform.rotation,
                    "scale": asset.transform.scale,
                    "zIndex": asset.z_index,
                });
                if let Some(crop) = &asset.transform.crop {
                    config["crop"] = serde_json::to_value(crop)?;
                }
                assets.push(LegacyAssetRow {
                    id: asset.id.clone(),
                    page_id: page.id.clone(),
                    url: Some(asset.content.clone()),
                    asset_type: asset.asset_type.to_db_str().to_string(),
                    config: Some(config.to_string()),
                    z_index: Some(asset.z_index as i64),
                });
            }
        }

        Ok(LegacyLayout {
            album_id: album.id.clone(),
            title: album.title.clone(),
            metadata: Some(serde_json::to_string(&album.metadata)?),
            pages,
            assets,
        })
    }
}

fn parse_metadata(raw: Option<&str>, warnings: &mut Vec<ConversionWarning>) -> AlbumMetadata {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => AlbumMetadata::default(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warnings.push(ConversionWarning::InvalidMetadata {
                reason: e.to_string(),
            });
            AlbumMetadata::default()
        }),
    }
}

fn legacy_background(row: &LegacyPageRow) -> BackgroundConfig {
    let non_empty = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    if let Some(url) = non_empty(&row.background_image) {
        BackgroundConfig::Image { url }
    } else if let Some(color) = non_empty(&row.background_color) {
        BackgroundConfig::Solid { color }
    } else {
        BackgroundConfig::default()
    }
}

fn convert_asset(
    row: &LegacyAssetRow,
    page: &Page,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<Asset, ConversionWarning> {
    let unparseable = |reason: String| ConversionWarning::UnparseableConfig {
        asset_id: row.id.clone(),
        reason,
    };

    let asset_type =
        AssetType::from_db_str(&row.asset_type).ok_or_else(|| ConversionWarning::UnknownAssetType {
            asset_id: row.id.clone(),
            asset_type: row.asset_type.clone(),
        })?;

    let config = match row.config.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Map::new(),
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => return Err(unparseable(format!("expected an object, got {}", other))),
            Err(e) => return Err(unparseable(e.to_string())),
        },
    };

    let number = |key: &str, default: f64| -> Result<f64, ConversionWarning> {
        Ok(read_number(&config, key).map_err(&unparseable)?.unwrap_or(default))
    };
    let position = Position {
        x: number("x", 0.0)?,
        y: number("y", 0.0)?,
    };
    let size = Size {
        width: number("width", DEFAULT_WIDTH)?,
        height: number("height", DEFAULT_HEIGHT)?,
    };
    let crop = match config.get("crop") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<CropRect>(value.clone())
                .map_err(|e| unparseable(format!("crop: {}", e)))?,
        ),
    };
    let rotation = number("rotation", DEFAULT_ROTATION)?;
    let transform = Transform {
        rotation: if rotation.is_finite() {
            normalize_rotation(rotation)
        } else {
            rotation
        },
        scale: number("scale", DEFAULT_SCALE)?,
        crop,
    };

    let band = asset_type.band();
    let stored_z = match read_number(&config, "zIndex").map_err(&unparseable)? {
        Some(z) if z.is_finite() => Some(z.round() as i64),
        Some(_) => return Err(unparseable("zIndex is not finite".to_string())),
        None => row.z_index,
    };
    let z_index = match stored_z {
        None => band.slot(page.count_of_type(asset_type)),
        Some(z) => {
            let clamped = band.clamp(z.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
            if clamped as i64 != z {
                warnings.push(ConversionWarning::ZIndexClamped {
                    asset_id: row.id.clone(),
                    from: z,
                    to: clamped,
                });
            }
            clamped
        }
    };

    let content = row
        .url
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| text_field(&config, "text"))
        .or_else(|| text_field(&config, "content"))
        .unwrap_or_default();

    let asset = Asset {
        id: row.id.clone(),
        asset_type,
        content,
        position,
        size,
        transform,
        z_index,
        extra: Default::default(),
    };
    validate_asset(&asset).map_err(|reason| ConversionWarning::InvalidAsset {
        asset_id: row.id.clone(),
        reason,
    })?;
    Ok(asset)
}

/// Reads a number that may have been stored as a JSON number or a numeric
/// string.
fn read_number(config: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{} is out of range", key)),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("{} is not a number: {:?}", key, s)),
        Some(other) => Err(format!("{} is not a number: {}", key, other)),
    }
}

fn text_field(config: &Map<String, Value>, key: &str) -> Option<String> {
    config
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
