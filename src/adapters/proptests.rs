use super::{LegacyAdapter, UnifiedAdapter};
use crate::album_store::{LegacyAssetRow, LegacyLayout, LegacyPageRow};
use crate::layout::test_util::arb_album;
use crate::layout::{delete_page, validate_page_numbers, Album};
use proptest::prelude::*;
use serde_json::{json, Value};

fn assert_bands(album: &Album) {
    for asset in album.assets() {
        assert!(
            asset.asset_type.band().contains(asset.z_index),
            "{} z={} outside {}",
            asset.asset_type,
            asset.z_index,
            asset.asset_type.band()
        );
    }
}

fn arb_config_number() -> BoxedStrategy<Value> {
    prop_oneof![
        Just(Value::Null),
        (-100..300_i32).prop_map(|v| json!(v)),
        (0..10_000_u32).prop_map(|v| json!(v as f64 / 100.0)),
        (0..300_u32).prop_map(|v| Value::String(v.to_string())),
    ]
    .boxed()
}

prop_compose! {
    fn arb_config()
    (
        x in arb_config_number(),
        y in arb_config_number(),
        width in arb_config_number(),
        height in arb_config_number(),
        rotation in arb_config_number(),
        scale in arb_config_number(),
        z in prop_oneof![Just(Value::Null), (-10..80_i32).prop_map(|v| json!(v))],
        broken in proptest::bool::weighted(0.1),
    ) -> Option<String> {
        if broken {
            return Some("{\"x\": ".to_string());
        }
        let mut config = serde_json::Map::new();
        for (key, value) in [
            ("x", x), ("y", y), ("width", width), ("height", height),
            ("rotation", rotation), ("scale", scale), ("zIndex", z),
        ] {
            if !value.is_null() {
                config.insert(key.to_string(), value);
            }
        }
        Some(Value::Object(config).to_string())
    }
}

prop_compose! {
    fn arb_asset_row(page_count: usize)
    (
        page in 0..page_count + 1,
        asset_type in prop_oneof![
            Just("image"), Just("photo"), Just("video"), Just("text"),
            Just("sticker"), Just("frame"), Just("ribbon"), Just("hologram"),
        ],
        config in arb_config(),
        z_index in proptest::option::of(-10..80_i64),
        url in "[a-z]{0,8}",
    ) -> LegacyAssetRow {
        LegacyAssetRow {
            id: String::new(),
            // one past the last page produces orphans
            page_id: format!("p{}", page),
            url: Some(url),
            asset_type: asset_type.to_string(),
            config,
            z_index,
        }
    }
}

fn arb_legacy_layout() -> BoxedStrategy<LegacyLayout> {
    proptest::collection::vec(0..6_i64, 1..4)
        .prop_flat_map(|page_numbers| {
            let page_count = page_numbers.len();
            (
                Just(page_numbers),
                proptest::collection::vec(arb_asset_row(page_count), 0..10),
            )
        })
        .prop_map(|(page_numbers, mut assets)| {
            for (i, asset) in assets.iter_mut().enumerate() {
                asset.id = format!("x{}", i);
            }
            LegacyLayout {
                album_id: "legacy-prop".to_string(),
                title: "Legacy".to_string(),
                metadata: None,
                pages: page_numbers
                    .into_iter()
                    .enumerate()
                    .map(|(i, page_number)| LegacyPageRow {
                        id: format!("p{}", i),
                        album_id: "legacy-prop".to_string(),
                        page_number,
                        template_id: None,
                        background_color: None,
                        background_image: None,
                    })
                    .collect(),
                assets,
            }
        })
        .boxed()
}

proptest! {
    #[test]
    fn test_unified_round_trip(album in arb_album()) {
        let layout = UnifiedAdapter::to_layout_json(&album).unwrap();
        let converted = UnifiedAdapter::from_layout_json(&layout).unwrap();

        prop_assert!(converted.warnings.is_empty());
        prop_assert_eq!(&converted.album, &album);
        prop_assert_eq!(UnifiedAdapter::to_layout_json(&converted.album).unwrap(), layout);
    }

    #[test]
    fn test_legacy_migration_is_lossless(rows in arb_legacy_layout()) {
        let legacy = LegacyAdapter::from_legacy_rows(&rows).unwrap().album;
        assert_bands(&legacy);
        prop_assert!(validate_page_numbers(&legacy.pages).is_ok());

        let layout = UnifiedAdapter::to_layout_json(&legacy).unwrap();
        let migrated = UnifiedAdapter::from_layout_json(&layout).unwrap();

        prop_assert!(migrated.warnings.is_empty());
        prop_assert_eq!(&migrated.album, &legacy);
        assert_bands(&migrated.album);
    }

    #[test]
    fn test_legacy_write_back_is_stable(rows in arb_legacy_layout()) {
        let first = LegacyAdapter::from_legacy_rows(&rows).unwrap().album;
        let written = LegacyAdapter::to_legacy_rows(&first).unwrap();
        let second = LegacyAdapter::from_legacy_rows(&written).unwrap();

        prop_assert!(second.warnings.is_empty());
        prop_assert_eq!(second.album, first);
    }

    #[test]
    fn test_pages_stay_contiguous_after_delete(album in arb_album(), pick in 0..8_u32) {
        prop_assume!(!album.pages.is_empty());
        let mut album = album;
        let page_number = pick % album.pages.len() as u32 + 1;
        let before = album.pages.len();

        delete_page(&mut album, page_number).unwrap();

        prop_assert_eq!(album.pages.len(), before - 1);
        let numbers: Vec<u32> = album.pages.iter().map(|p| p.page_number).collect();
        let expected: Vec<u32> = (1..=album.pages.len() as u32).collect();
        prop_assert_eq!(numbers, expected);
    }
}
