use super::model::*;
use proptest::prelude::*;

/// Hundredths keep generated values exact through JSON.
fn hundredths(range: std::ops::RangeInclusive<u32>) -> BoxedStrategy<f64> {
    range.prop_map(|v| v as f64 / 100.0).boxed()
}

pub fn arb_asset_type() -> BoxedStrategy<AssetType> {
    prop_oneof![
        Just(AssetType::Image),
        Just(AssetType::Video),
        Just(AssetType::Text),
        Just(AssetType::Sticker),
        Just(AssetType::Frame),
        Just(AssetType::Ribbon),
    ]
    .boxed()
}

fn arb_crop() -> BoxedStrategy<Option<CropRect>> {
    prop_oneof![
        Just(None),
        (0..=50_u32, 0..=50_u32, 1..=50_u32, 1..=50_u32).prop_map(|(x, y, w, h)| Some(CropRect {
            x: x as f64,
            y: y as f64,
            width: w as f64,
            height: h as f64,
        })),
    ]
    .boxed()
}

pub fn arb_background() -> BoxedStrategy<BackgroundConfig> {
    prop_oneof![
        "#[0-9a-f]{6}".prop_map(|color| BackgroundConfig::Solid { color }),
        "[a-z]{1,8}".prop_map(|name| BackgroundConfig::Image {
            url: format!("https://cdn/{}.png", name)
        }),
        (0..360_u32, "#[0-9a-f]{6}", "#[0-9a-f]{6}").prop_map(|(angle, from, to)| {
            BackgroundConfig::Gradient {
                angle: angle as f64,
                stops: vec![
                    GradientStop {
                        color: from,
                        offset: 0.0,
                    },
                    GradientStop {
                        color: to,
                        offset: 1.0,
                    },
                ],
            }
        }),
    ]
    .boxed()
}

prop_compose! {
    /// An asset with a placeholder id; [`arb_album`] assigns unique ids.
    pub fn arb_asset()
    (
        asset_type in arb_asset_type(),
        content in "[a-z0-9]{0,12}",
        x in hundredths(0..=10_000),
        y in hundredths(0..=10_000),
        width in hundredths(1..=10_000),
        height in hundredths(1..=10_000),
        rotation in hundredths(0..=35_999),
        scale in hundredths(1..=400),
        crop in arb_crop(),
        z_offset in 0..10_i32,
    ) -> Asset {
        let band = asset_type.band();
        Asset {
            id: String::new(),
            asset_type,
            content,
            position: Position { x, y },
            size: Size { width, height },
            transform: Transform { rotation, scale, crop },
            z_index: band.clamp(band.base + z_offset),
            extra: Default::default(),
        }
    }
}

prop_compose! {
    pub fn arb_page()
    (
        background in arb_background(),
        template_id in proptest::option::of("[a-z]{1,6}"),
        assets in proptest::collection::vec(arb_asset(), 0..6),
    ) -> Page {
        Page {
            id: String::new(),
            page_number: 0,
            background,
            template_id,
            assets,
            extra: Default::default(),
        }
    }
}

prop_compose! {
    /// A valid album: contiguous pages, unique ids, every asset in band.
    pub fn arb_album()
    (
        title in "[A-Za-z ]{1,20}",
        category in proptest::option::of("[a-z]{3,8}"),
        hashtags in proptest::collection::vec("[a-z]{2,8}", 0..3),
        pages in proptest::collection::vec(arb_page(), 0..4),
    ) -> Album {
        let mut album = Album::new("album-prop", title);
        album.metadata.category = category;
        album.metadata.hashtags = hashtags;
        for (page_index, mut page) in pages.into_iter().enumerate() {
            page.id = format!("page-{}", page_index);
            page.page_number = page_index as u32 + 1;
            for (asset_index, asset) in page.assets.iter_mut().enumerate() {
                asset.id = format!("asset-{}-{}", page_index, asset_index);
            }
            album.pages.push(page);
        }
        album
    }
}
