use image::RgbaImage;
use spritepack_core::order::smart_chunk_size;
use spritepack_core::{PackingMode, Sprite, packing_order};

fn by_heights(heights: &[u32]) -> Vec<Sprite> {
    heights
        .iter()
        .enumerate()
        .map(|(i, &h)| Sprite::new(format!("s{i}"), RgbaImage::new(4, h)))
        .collect()
}

#[test]
fn preserve_is_identity() {
    let sprites = by_heights(&[50, 200, 100, 10]);
    assert_eq!(packing_order(&sprites, PackingMode::Preserve), [0, 1, 2, 3]);
}

#[test]
fn optimal_sorts_descending_and_keeps_ties_stable() {
    let sprites = by_heights(&[10, 30, 20, 30, 10]);
    assert_eq!(packing_order(&sprites, PackingMode::Optimal), [1, 3, 2, 0, 4]);
}

#[test]
fn smart_sorts_within_positional_chunks() {
    // 12 sprites -> chunks of 10 and 2
    let heights = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 50, 60];
    let order = packing_order(&by_heights(&heights), PackingMode::Smart);
    assert_eq!(order, [9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 11, 10]);
}

#[test]
fn smart_never_moves_sprites_across_chunks() {
    let heights: Vec<u32> = (0..45).map(|i| 1 + (i * 37) % 64).collect();
    let order = packing_order(&by_heights(&heights), PackingMode::Smart);
    let chunk = smart_chunk_size(heights.len());
    assert_eq!(chunk, 15);
    for (pos, &idx) in order.iter().enumerate() {
        assert_eq!(pos / chunk, idx / chunk);
    }
    for part in order.chunks(chunk) {
        assert!(part.windows(2).all(|w| heights[w[0]] >= heights[w[1]]));
    }
}

#[test]
fn smart_chunk_size_thresholds() {
    assert_eq!(smart_chunk_size(1), 10);
    assert_eq!(smart_chunk_size(29), 10);
    assert_eq!(smart_chunk_size(30), 15);
    assert_eq!(smart_chunk_size(100), 15);
    assert_eq!(smart_chunk_size(101), 20);
}

#[test]
fn single_sprite_and_empty_inputs() {
    assert_eq!(packing_order(&by_heights(&[7]), PackingMode::Smart), [0]);
    assert!(packing_order(&[], PackingMode::Optimal).is_empty());
}
