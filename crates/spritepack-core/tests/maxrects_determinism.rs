use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng};
use spritepack_core::model::Rect;
use spritepack_core::packer::MaxRectsPacker;

fn run(sizes: &[(u32, u32)], padding: u32) -> Vec<Option<Rect>> {
    let mut p = MaxRectsPacker::new(512, 512, padding);
    sizes.iter().map(|&(w, h)| p.insert(w, h)).collect()
}

#[test]
fn identical_sequences_give_identical_layouts() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let sizes: Vec<(u32, u32)> = (0..200)
        .map(|_| (rng.gen_range(4..=48), rng.gen_range(4..=48)))
        .collect();
    let a = run(&sizes, 2);
    let b = run(&sizes, 2);
    assert_eq!(a, b);
    assert!(a.iter().any(|r| r.is_some()));
}

fn arb_sizes() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..=96, 1u32..=96), 1..60)
}

proptest! {
    #[test]
    fn padded_rects_never_overlap(sizes in arb_sizes(), padding in 0u32..=4) {
        let mut p = MaxRectsPacker::new(300, 300, padding);
        let mut placed: Vec<Rect> = Vec::new();
        for (w, h) in sizes {
            if let Some(r) = p.insert(w, h) {
                prop_assert_eq!((r.w, r.h), (w, h));
                placed.push(r);
            }
        }
        let used = p.used();
        prop_assert_eq!(used.len(), placed.len());
        for (i, a) in used.iter().enumerate() {
            prop_assert!(a.right_ex() <= 300 && a.bottom_ex() <= 300);
            // the sprite sits inside its padded slot
            let s = placed[i];
            prop_assert_eq!((s.x - a.x, s.y - a.y), (padding, padding));
            for b in &used[i + 1..] {
                prop_assert!(!a.intersects(b), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn placed_area_fits_in_sheet(sizes in arb_sizes()) {
        let mut p = MaxRectsPacker::new(200, 200, 0);
        let area: u64 = sizes
            .iter()
            .filter_map(|&(w, h)| p.insert(w, h))
            .map(|r| r.area())
            .sum();
        prop_assert!(area <= 200 * 200);
    }
}
