use spritepack_core::model::Rect;
use spritepack_core::packer::MaxRectsPacker;

fn disjoint(rects: &[Rect]) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if rects[i].intersects(&rects[j]) {
                return false;
            }
        }
    }
    true
}

#[test]
fn maxrects_disjoint_on_small_set() {
    let mut p = MaxRectsPacker::new(256, 256, 0);
    let sizes = [
        (64, 64),
        (32, 64),
        (64, 32),
        (48, 48),
        (16, 80),
        (80, 16),
        (40, 40),
        (30, 50),
        (50, 30),
    ];
    let mut placed = Vec::new();
    for (w, h) in sizes {
        let r = p.insert(w, h).expect("small set fits in 256x256");
        assert_eq!((r.w, r.h), (w, h));
        assert!(r.right_ex() <= 256 && r.bottom_ex() <= 256);
        placed.push(r);
    }
    assert!(disjoint(&placed));
    assert!(disjoint(p.used()));
}

#[test]
fn padding_offsets_placement_and_reserves_border() {
    let mut p = MaxRectsPacker::new(128, 128, 3);
    let first = p.insert(10, 20).unwrap();
    assert_eq!((first.x, first.y), (3, 3));
    assert_eq!(p.used()[0], Rect::new(0, 0, 16, 26));

    // padded rectangles (not just sprites) must stay disjoint
    for _ in 0..20 {
        if p.insert(10, 20).is_none() {
            break;
        }
    }
    assert!(disjoint(p.used()));
}

#[test]
fn first_insert_lands_at_origin_and_bssf_picks_tighter_side() {
    let mut p = MaxRectsPacker::new(256, 256, 2);
    let a = p.insert(100, 100).unwrap();
    assert_eq!((a.x, a.y), (2, 2));
    // right strip (152 wide) and bottom strip (152 tall) tie on short side;
    // the first free rect (right remainder) wins.
    let b = p.insert(50, 50).unwrap();
    assert_eq!((b.x, b.y), (106, 2));

    // only the strip under the second column is still free
    let mut q = MaxRectsPacker::new(256, 256, 0);
    q.insert(100, 256).unwrap();
    q.insert(256 - 100, 200).unwrap();
    let c = q.insert(150, 20).unwrap();
    assert_eq!((c.x, c.y), (100, 200));
}

#[test]
fn insert_returns_none_when_box_cannot_fit() {
    let mut p = MaxRectsPacker::new(64, 64, 0);
    assert!(p.insert(65, 10).is_none());
    assert!(p.insert(64, 64).is_some());
    assert!(p.insert(1, 1).is_none());

    // padding counts against the sheet
    let mut q = MaxRectsPacker::new(64, 64, 1);
    assert!(q.insert(63, 63).is_none());
    assert!(q.insert(62, 62).is_some());
}

#[test]
fn free_list_has_no_contained_rects() {
    let mut p = MaxRectsPacker::new(512, 512, 1);
    for i in 0..60u32 {
        let _ = p.insert(8 + (i * 7) % 40, 8 + (i * 13) % 40);
    }
    let free = p.free_rects();
    for i in 0..free.len() {
        for j in 0..free.len() {
            if i != j {
                assert!(
                    !(free[j].contains(&free[i]) && free[i] != free[j]),
                    "free rect {:?} is contained in {:?}",
                    free[i],
                    free[j]
                );
            }
        }
    }
    assert_eq!(p.free_list_len(), free.len());
}
