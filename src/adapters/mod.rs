mod detector;
mod legacy_adapter;
mod unified_adapter;
mod warnings;

pub use detector::{SchemaDetector, SchemaVariant};
pub use legacy_adapter::{
    LegacyAdapter, DEFAULT_HEIGHT, DEFAULT_ROTATION, DEFAULT_SCALE, DEFAULT_WIDTH,
};
pub use unified_adapter::{CacheStatus, LayoutSummary, UnifiedAdapter};
pub use warnings::{ConversionError, ConversionWarning, Converted};

#[cfg(test)]
mod proptests;
