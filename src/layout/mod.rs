mod commands;
mod cover;
mod model;
mod validation;

pub use commands::{
    add_asset, add_page, delete_page, insert_page, move_page, remove_asset, set_asset_z_index,
    set_background, set_title, update_asset_content, update_asset_geometry, update_metadata,
    NewAsset,
};
pub use cover::resolve_cover;
pub use model::*;
pub use validation::{
    validate_album, validate_asset, validate_page, validate_page_numbers, ValidationError,
    ValidationResult,
};

#[cfg(test)]
pub(crate) mod test_util;
