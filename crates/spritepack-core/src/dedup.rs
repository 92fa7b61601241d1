use crate::model::{NameMapping, Sprite};
use std::collections::HashMap;
use tracing::debug;

/// Number of leading content bytes folded into the bucket key.
const HASH_PREFIX_LEN: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct DedupOptions {
    /// Keep a frame that repeats the immediately preceding frame so animation holds keep their timing.
    pub preserve_animation_hold: bool,
}

/// Collapses byte-identical sprites with default options.
///
/// See [`deduplicate_with`].
pub fn deduplicate(sprites: Vec<Sprite>) -> (Vec<Sprite>, NameMapping) {
    deduplicate_with(sprites, DedupOptions::default())
}

/// Collapses byte-identical sprites into one canonical entry each.
///
/// Sprites are bucketed by `(width, height, first 100 content bytes)` and
/// confirmed with a full byte comparison. The first occurrence stays canonical
/// and keeps its input position as `original_index`. The returned mapping has
/// one entry per input name (canonical names map to themselves).
pub fn deduplicate_with(sprites: Vec<Sprite>, opts: DedupOptions) -> (Vec<Sprite>, NameMapping) {
    let total = sprites.len();
    let mut buckets: HashMap<(u32, u32, Vec<u8>), Vec<usize>> = HashMap::new();
    let mut mapping = NameMapping::with_capacity(total);
    let mut unique: Vec<Sprite> = Vec::with_capacity(total);
    let mut previous: Option<usize> = None;

    for (i, mut sprite) in sprites.into_iter().enumerate() {
        sprite.original_index = i;
        let bytes = sprite.content_bytes();
        let key = (
            sprite.width(),
            sprite.height(),
            bytes[..bytes.len().min(HASH_PREFIX_LEN)].to_vec(),
        );
        let canonical = buckets
            .get(&key)
            .and_then(|cands| cands.iter().copied().find(|&u| unique[u].content_bytes() == bytes));
        // `previous` is the entry the preceding input frame resolved to
        let holds = opts.preserve_animation_hold
            && previous.is_some_and(|p| {
                let prev = &unique[p];
                prev.width() == sprite.width()
                    && prev.height() == sprite.height()
                    && prev.content_bytes() == bytes
            });

        match canonical {
            Some(u) if !holds => {
                debug!(duplicate = %sprite.name, canonical = %unique[u].name, "collapsed duplicate sprite");
                mapping.insert(sprite.name, unique[u].name.clone());
                previous = Some(u);
            }
            _ => {
                let u = unique.len();
                mapping.insert(sprite.name.clone(), sprite.name.clone());
                buckets.entry(key).or_default().push(u);
                unique.push(sprite);
                previous = Some(u);
            }
        }
    }
    (unique, mapping)
}
