use crate::model::Rect;

/// MaxRects bin packer using the Best Short Side Fit heuristic.
///
/// Every sprite reserves `padding` pixels on each side. The free list holds
/// maximal free rectangles; after each placement intersecting free rects are
/// split into their remainders and any rect contained in another is pruned.
/// Given the same insertion sequence the result is always identical.
#[derive(Debug, Clone)]
pub struct MaxRectsPacker {
    width: u32,
    height: u32,
    padding: u32,
    free: Vec<Rect>,
    used: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
            free: vec![Rect::new(0, 0, width, height)],
            used: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Places a `width x height` sprite and returns its unpadded rectangle,
    /// or `None` when no free rectangle can hold the padded box.
    pub fn insert(&mut self, width: u32, height: u32) -> Option<Rect> {
        let pw = width.checked_add(self.padding.checked_mul(2)?)?;
        let ph = height.checked_add(self.padding.checked_mul(2)?)?;
        let slot = self.find_position(pw, ph)?;
        self.place_rect(&slot);
        Some(Rect::new(
            slot.x + self.padding,
            slot.y + self.padding,
            width,
            height,
        ))
    }

    /// Padded rectangles reserved so far, in insertion order.
    pub fn used(&self) -> &[Rect] {
        &self.used
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        let mut best_short = u32::MAX;
        let mut best_long = u32::MAX;
        let mut best: Option<Rect> = None;

        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            let leftover_h = fr.w - w;
            let leftover_v = fr.h - h;
            let short_fit = leftover_h.min(leftover_v);
            let long_fit = leftover_h.max(leftover_v);
            // perfect fit early-out
            if short_fit == 0 && long_fit == 0 {
                return Some(Rect::new(fr.x, fr.y, w, h));
            }
            if short_fit < best_short || (short_fit == best_short && long_fit < best_long) {
                best_short = short_fit;
                best_long = long_fit;
                best = Some(Rect::new(fr.x, fr.y, w, h));
            }
        }
        best
    }

    fn place_rect(&mut self, node: &Rect) {
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in &self.free {
            if fr.intersects(node) {
                split_free_node(fr, node, &mut new_free);
            } else {
                new_free.push(*fr);
            }
        }
        self.free = new_free;
        self.prune_free_list();
        self.used.push(*node);
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

/// Pushes the left, right, top and bottom remainders of `fr` around `node`.
fn split_free_node(fr: &Rect, node: &Rect, out: &mut Vec<Rect>) {
    let fr_x2 = fr.right_ex();
    let fr_y2 = fr.bottom_ex();
    let n_x2 = node.right_ex();
    let n_y2 = node.bottom_ex();

    // left
    if node.x > fr.x && node.x < fr_x2 {
        out.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
    }
    // right
    if n_x2 < fr_x2 {
        out.push(Rect::new(n_x2, fr.y, fr_x2 - n_x2, fr.h));
    }
    // top
    if node.y > fr.y && node.y < fr_y2 {
        out.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
    }
    // bottom
    if n_y2 < fr_y2 {
        out.push(Rect::new(fr.x, n_y2, fr.w, fr_y2 - n_y2));
    }
}
