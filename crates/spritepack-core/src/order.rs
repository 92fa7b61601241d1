use crate::config::PackingMode;
use crate::model::Sprite;

/// Returns the sequence of indices into `sprites` to feed the packer.
///
/// - `Preserve`: input order
/// - `Optimal`: stable descending sort by height
/// - `Smart`: positional chunks (see [`smart_chunk_size`]), each sorted by descending height
///
/// Sorts are stable, so equal heights keep their relative input order.
pub fn packing_order(sprites: &[Sprite], mode: PackingMode) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sprites.len()).collect();
    let by_height_desc = |a: &usize, b: &usize| sprites[*b].height().cmp(&sprites[*a].height());
    match mode {
        PackingMode::Preserve => {}
        PackingMode::Optimal => order.sort_by(by_height_desc),
        PackingMode::Smart => {
            if order.len() > 1 {
                let chunk = smart_chunk_size(order.len());
                for part in order.chunks_mut(chunk) {
                    part.sort_by(by_height_desc);
                }
            }
        }
    }
    order
}

/// Chunk size used by `Smart` ordering for `n` sprites: 10 below 30, 20 above 100, else 15.
pub fn smart_chunk_size(n: usize) -> usize {
    if n < 30 {
        10
    } else if n > 100 {
        20
    } else {
        15
    }
}
