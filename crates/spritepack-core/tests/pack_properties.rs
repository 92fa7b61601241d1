use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use spritepack_core::prelude::*;

fn sprites(sizes: &[(u32, u32)]) -> Vec<Sprite> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let shade = (i * 13 % 251) as u8;
            Sprite::new(format!("s{i}"), RgbaImage::from_pixel(w, h, Rgba([shade, 40, 90, 255])))
        })
        .collect()
}

fn arb_mode() -> impl Strategy<Value = PackingMode> {
    prop_oneof![
        Just(PackingMode::Optimal),
        Just(PackingMode::Smart),
        Just(PackingMode::Preserve),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_sprite_lands_once_without_overlap(
        sizes in prop::collection::vec((1u32..=64, 1u32..=64), 1..30),
        padding in 0u32..=4,
        mode in arb_mode(),
    ) {
        let opts = PackingOptions::builder()
            .padding(padding)
            .with_max_dimensions(256, 256)
            .packing_mode(mode)
            .compression_quality(CompressionQuality::Fast)
            .formats(Vec::<String>::new())
            .build();
        let out = pack(sprites(&sizes), opts).unwrap();
        prop_assert_eq!(out.total_sprites, sizes.len());

        let mut seen: Vec<usize> = out.placed().map(|(_, p)| p.sprite.original_index).collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..sizes.len()).collect::<Vec<_>>());

        for sheet in &out.sheets {
            prop_assert!(sheet.width <= 256 && sheet.height <= 256);
            let mut padded: Vec<Rect> = Vec::new();
            for p in sheet.placed(&out.sprites) {
                let r = p.rect();
                prop_assert!(r.x >= padding && r.y >= padding);
                prop_assert!(r.x + r.w <= sheet.width && r.y + r.h <= sheet.height);
                padded.push(Rect::new(r.x - padding, r.y - padding, r.w + 2 * padding, r.h + 2 * padding));
            }
            for (i, a) in padded.iter().enumerate() {
                for b in &padded[i + 1..] {
                    prop_assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
                }
            }
            prop_assert!(sheet.used_area(&out.sprites) <= sheet.area());
        }
    }
}
