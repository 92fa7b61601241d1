use image::{Rgba, RgbaImage};
use spritepack_core::trim::{TrimSelector, compute_trim_rect, matches_any, trim};
use spritepack_core::{PackError, PackingOptions, Rect, Sprite, pack};

/// `size x size` image with a `border`-pixel transparent frame around an opaque block.
fn bordered(size: u32, border: u32) -> RgbaImage {
    let mut img = RgbaImage::new(size, size);
    for y in border..size - border {
        for x in border..size - border {
            img.put_pixel(x, y, Rgba([200, 40, 40, 255]));
        }
    }
    img
}

fn opts_with(trim_only: &[&str], trim_except: &[&str]) -> PackingOptions {
    PackingOptions::builder()
        .trim(true)
        .trim_only(trim_only.iter().copied())
        .trim_except(trim_except.iter().copied())
        .build()
}

#[test]
fn trim_rect_tracks_alpha_bounds() {
    let mut img = RgbaImage::new(16, 12);
    img.put_pixel(3, 2, Rgba([0, 0, 0, 1]));
    img.put_pixel(9, 7, Rgba([255, 255, 255, 255]));
    assert_eq!(compute_trim_rect(&img), Some(Rect::new(3, 2, 7, 6)));
    assert_eq!(compute_trim_rect(&RgbaImage::new(5, 5)), None);
}

#[test]
fn trim_reports_offsets_and_original_size() {
    let t = trim(&bordered(70, 10)).unwrap();
    assert_eq!(t.image.dimensions(), (50, 50));
    assert_eq!((t.offset_x, t.offset_y), (10, 10));
    assert_eq!((t.original_width, t.original_height), (70, 70));
    assert!(t.image.pixels().all(|p| p[3] == 255));
}

#[test]
fn trim_fails_on_fully_transparent_image() {
    let err = trim(&RgbaImage::new(8, 8)).unwrap_err();
    assert!(matches!(err, PackError::FullyTransparentImage));
}

#[test]
fn trim_only_takes_precedence_over_trim_except() {
    let sel = TrimSelector::from_options(&opts_with(&["*walk*"], &["*walk*"])).unwrap();
    assert!(sel.should_trim("hero_walk_0"));
    assert!(!sel.should_trim("hero_idle_0"));
}

#[test]
fn trim_except_excludes_matches() {
    let sel = TrimSelector::from_options(&opts_with(&[], &["ui_*"])).unwrap();
    assert!(!sel.should_trim("ui_button"));
    assert!(sel.should_trim("walk_0"));
}

#[test]
fn no_patterns_trims_everything_and_disabled_trims_nothing() {
    let sel = TrimSelector::from_options(&opts_with(&[], &[])).unwrap();
    assert!(sel.should_trim("anything"));

    let off = PackingOptions::builder().trim_only(["*"]).build();
    let sel = TrimSelector::from_options(&off).unwrap();
    assert!(!sel.should_trim("anything"));
}

#[test]
fn patterns_without_wildcards_match_exactly() {
    let pats = vec!["walk".to_string()];
    assert!(matches_any("walk", &pats).unwrap());
    assert!(!matches_any("walk_0", &pats).unwrap());
    assert!(!matches_any("walk", &[]).unwrap());
}

#[test]
fn invalid_pattern_is_reported() {
    let err = TrimSelector::from_options(&opts_with(&["walk[0-"], &[])).unwrap_err();
    match err {
        PackError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "walk[0-"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn pack_trims_only_selected_sprites() {
    let sprites = vec![
        Sprite::new("walk_0", bordered(70, 10)),
        Sprite::new("idle_0", bordered(70, 10)),
    ];
    let out = pack(sprites, opts_with(&["*walk*"], &[])).unwrap();

    let walk = &out.sprites[0];
    assert_eq!(walk.name, "walk_0");
    assert!(walk.trimmed);
    assert_eq!((walk.width(), walk.height()), (50, 50));
    assert_eq!((walk.original_width, walk.original_height), (70, 70));
    assert_eq!((walk.trim_offset_x, walk.trim_offset_y), (10, 10));

    let idle = &out.sprites[1];
    assert_eq!(idle.name, "idle_0");
    assert!(!idle.trimmed);
    assert_eq!((idle.width(), idle.height()), (70, 70));
    assert_eq!(out.stats().num_trimmed, 1);
}

#[test]
fn fully_transparent_selected_sprite_fails_the_batch() {
    let sprites = vec![
        Sprite::new("walk_0", bordered(16, 2)),
        Sprite::new("walk_1", RgbaImage::new(16, 16)),
    ];
    let err = pack(sprites, opts_with(&[], &[])).unwrap_err();
    match &err {
        PackError::FullyTransparentSprite { name } => assert_eq!(name, "walk_1"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("walk_1"));
}

#[test]
fn transparent_sprite_outside_selection_is_packed_as_is() {
    let sprites = vec![
        Sprite::new("walk_0", bordered(16, 2)),
        Sprite::new("blank", RgbaImage::new(16, 16)),
    ];
    let out = pack(sprites, opts_with(&["walk*"], &[])).unwrap();
    assert_eq!(out.sprites[1].width(), 16);
    assert!(!out.sprites[1].trimmed);
}
