//! Canonical album document.
//!
//! Every adapter produces these types and every consumer reads them; the
//! on-disk shapes never leak past the adapter boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of content an asset carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    #[serde(alias = "photo")]
    Image,
    Video,
    Text,
    Sticker,
    Frame,
    Ribbon,
}

impl AssetType {
    pub const ALL: [AssetType; 6] = [
        AssetType::Image,
        AssetType::Video,
        AssetType::Text,
        AssetType::Sticker,
        AssetType::Frame,
        AssetType::Ribbon,
    ];

    /// Parse the legacy `asset_type` column. Older rows used `photo` for images.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" | "photo" => Some(AssetType::Image),
            "video" => Some(AssetType::Video),
            "text" => Some(AssetType::Text),
            "sticker" => Some(AssetType::Sticker),
            "frame" => Some(AssetType::Frame),
            "ribbon" => Some(AssetType::Ribbon),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssetType::Image => "image",
            AssetType::Video => "video",
            AssetType::Text => "text",
            AssetType::Sticker => "sticker",
            AssetType::Frame => "frame",
            AssetType::Ribbon => "ribbon",
        }
    }

    /// The z-index band reserved for this type.
    pub fn band(&self) -> ZBand {
        match self {
            AssetType::Image => ZBand::new(PHOTO_BAND, VIDEO_BAND),
            AssetType::Video => ZBand::new(VIDEO_BAND, TEXT_BAND),
            AssetType::Text => ZBand::new(TEXT_BAND, FRAME_BAND),
            AssetType::Frame => ZBand::new(FRAME_BAND, RIBBON_BAND),
            AssetType::Ribbon => ZBand::new(RIBBON_BAND, STICKER_BAND),
            AssetType::Sticker => ZBand::new(STICKER_BAND, STICKER_BAND + BAND_WIDTH),
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// =============================================================================
// Z-index bands
// =============================================================================

pub const BACKGROUND_BAND: i32 = 0;
pub const PHOTO_BAND: i32 = 10;
pub const VIDEO_BAND: i32 = 15;
pub const TEXT_BAND: i32 = 20;
pub const FRAME_BAND: i32 = 30;
pub const RIBBON_BAND: i32 = 40;
pub const STICKER_BAND: i32 = 50;
const BAND_WIDTH: i32 = 10;

/// Half-open range `[base, ceiling)` of z-index values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZBand {
    pub base: i32,
    pub ceiling: i32,
}

impl ZBand {
    const fn new(base: i32, ceiling: i32) -> Self {
        Self { base, ceiling }
    }

    pub fn contains(&self, z: i32) -> bool {
        z >= self.base && z < self.ceiling
    }

    pub fn clamp(&self, z: i32) -> i32 {
        z.clamp(self.base, self.ceiling - 1)
    }

    /// Z-index for the `order`-th asset of the band on a page. Once the band
    /// is full, later assets share its top slot and keep insertion order.
    pub fn slot(&self, order: usize) -> i32 {
        let width = (self.ceiling - self.base) as usize;
        self.base + order.min(width - 1) as i32
    }
}

impl fmt::Display for ZBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.base, self.ceiling)
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Percentage of page width/height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transform {
    /// Degrees in `[0, 360)`.
    pub rotation: f64,
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            crop: None,
        }
    }
}

/// Map any finite angle into `[0, 360)`.
pub fn normalize_rotation(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

// =============================================================================
// Backgrounds
// =============================================================================

pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradientStop {
    pub color: String,
    /// Position along the gradient, `0.0..=1.0`.
    pub offset: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum BackgroundConfig {
    Solid { color: String },
    Image { url: String },
    Gradient { angle: f64, stops: Vec<GradientStop> },
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        BackgroundConfig::Solid {
            color: DEFAULT_BACKGROUND_COLOR.to_string(),
        }
    }
}

// =============================================================================
// Document tree
// =============================================================================

/// Fields written by newer clients that this version does not model. They
/// are carried through edits and written back unchanged.
pub type ExtraFields = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    /// URL for media assets, text body for text assets.
    pub content: String,
    pub position: Position,
    pub size: Size,
    pub transform: Transform,
    pub z_index: i32,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub page_number: u32,
    pub background: BackgroundConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    pub assets: Vec<Asset>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Page {
    /// Assets sorted by z-index, insertion order breaking ties.
    pub fn assets_in_render_order(&self) -> Vec<&Asset> {
        let mut assets: Vec<&Asset> = self.assets.iter().collect();
        assets.sort_by_key(|a| a.z_index);
        assets
    }

    pub fn count_of_type(&self, asset_type: AssetType) -> usize {
        self.assets
            .iter()
            .filter(|a| a.asset_type == asset_type)
            .count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeoTag {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbumMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub hashtags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geotag: Option<GeoTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub published: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Album {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub metadata: AlbumMetadata,
    pub pages: Vec<Page>,
}

impl Album {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            metadata: AlbumMetadata::default(),
            pages: Vec::new(),
        }
    }

    pub fn page(&self, page_number: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }

    pub fn page_mut(&mut self, page_number: u32) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.page_number == page_number)
    }

    pub fn asset_mut(&mut self, asset_id: &str) -> Option<&mut Asset> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.assets.iter_mut())
            .find(|a| a.id == asset_id)
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.pages.iter().flat_map(|p| p.assets.iter())
    }

    pub fn asset_count(&self) -> usize {
        self.pages.iter().map(|p| p.assets.len()).sum()
    }

    /// Rewrite page numbers as `1..=N` following the current vector order.
    /// Returns true when any number changed.
    pub fn renumber_pages(&mut self) -> bool {
        let mut changed = false;
        for (index, page) in self.pages.iter_mut().enumerate() {
            let expected = index as u32 + 1;
            if page.page_number != expected {
                page.page_number = expected;
                changed = true;
            }
        }
        changed
    }
}
