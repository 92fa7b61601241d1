use crate::compositing::{NoRecompression, Recompressor, draw_over, encode_png};
use crate::config::{HARD_MAX_DIMENSION, MAX_SHEETS, PackingOptions};
use crate::error::{PackError, Result};
use crate::export::{ExportContext, OutputFormat};
use crate::model::{PackingResult, Placement, Sheet, Sprite};
use crate::order::packing_order;
use crate::packer::MaxRectsPacker;
use crate::trim::{TrimSelector, trim};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Overhead applied to raw sprite area when estimating a sheet size.
const AREA_OVERHEAD: f64 = 1.2;

/// Packs `sprites` into one or more sheets without a secondary re-compression pass.
///
/// See [`pack_with`].
pub fn pack(sprites: Vec<Sprite>, options: PackingOptions) -> Result<PackingResult> {
    pack_with(sprites, options, &NoRecompression)
}

#[instrument(skip_all, fields(sprites = sprites.len()))]
/// Packs `sprites` into sheets, composites and encodes each sheet, then
/// renders every requested metadata format.
///
/// Steps:
/// - each sprite's `original_index` becomes its position in `sprites`
/// - oversized sprites are downscaled when `auto_resize` is set
/// - trimming runs for the sprites selected by the trim options
/// - sprites are fed to the packer in the order of `packing_mode`
/// - sheets are filled one at a time until every sprite is placed
///
/// Every failure aborts the whole batch; no partial result is returned.
pub fn pack_with(
    mut sprites: Vec<Sprite>,
    options: PackingOptions,
    recompressor: &dyn Recompressor,
) -> Result<PackingResult> {
    options.validate()?;
    if sprites.is_empty() {
        return Err(PackError::EmptyInput);
    }
    if let Some(s) = sprites.iter().find(|s| s.width() == 0 || s.height() == 0) {
        return Err(PackError::InvalidInput(format!(
            "sprite '{}' has zero size ({}x{})",
            s.name,
            s.width(),
            s.height()
        )));
    }

    let total_sprites = sprites.len();
    for (i, sprite) in sprites.iter_mut().enumerate() {
        sprite.original_index = i;
    }

    if options.auto_resize {
        auto_resize(&mut sprites, &options);
    }

    let selector = TrimSelector::from_options(&options)?;
    for sprite in sprites.iter_mut() {
        if selector.should_trim(&sprite.name) {
            apply_trim(sprite)?;
        }
    }

    let order = packing_order(&sprites, options.packing_mode);
    let (max_w, max_h) = sheet_limits(&sprites, &options);
    debug!(max_w, max_h, mode = ?options.packing_mode, "sheet limits");

    let mut sheets: Vec<Sheet> = Vec::new();
    let mut remaining = order;
    while !remaining.is_empty() {
        let (sheet, unpacked) =
            pack_single_sheet(&sprites, &remaining, max_w, max_h, &options, recompressor)?;
        let Some(sheet) = sheet else {
            return Err(capacity_error(&sprites, &remaining, max_w, max_h, &options));
        };
        debug!(
            sheet = sheets.len(),
            width = sheet.width,
            height = sheet.height,
            placed = sheet.placements.len(),
            deferred = unpacked.len(),
            "sheet packed"
        );
        sheets.push(sheet);
        remaining = unpacked;
        if !remaining.is_empty() && sheets.len() >= MAX_SHEETS {
            return Err(PackError::TooManySplits { max: MAX_SHEETS });
        }
    }

    let ctx = ExportContext {
        sheets: &sheets,
        sprites: &sprites,
        name_mapping: &options.name_mapping,
        image_path: options.image_path(),
        sheet_name: &options.sheet_name,
    };
    let mut formats = BTreeMap::new();
    for name in &options.output_formats {
        let format: OutputFormat = name.parse()?;
        formats.insert(name.clone(), format.encode(&ctx)?);
    }

    let warnings = size_warnings(&sheets, options.original_size);
    for w in &warnings {
        warn!("{w}");
    }

    let result = PackingResult {
        sheets,
        sprites,
        formats,
        total_sprites,
        warnings,
    };
    info!("{}", result.stats().summary());
    Ok(result)
}

fn apply_trim(sprite: &mut Sprite) -> Result<()> {
    let trimmed = trim(&sprite.image).map_err(|e| match e {
        PackError::FullyTransparentImage => PackError::FullyTransparentSprite {
            name: sprite.name.clone(),
        },
        other => other,
    })?;
    sprite.image = trimmed.image;
    sprite.trimmed = true;
    sprite.trim_offset_x = trimmed.offset_x;
    sprite.trim_offset_y = trimmed.offset_y;
    sprite.original_width = trimmed.original_width;
    sprite.original_height = trimmed.original_height;
    Ok(())
}

/// Downscales sprites that exceed the usable sheet area, keeping aspect ratio.
fn auto_resize(sprites: &mut [Sprite], options: &PackingOptions) {
    let usable = |max: u32| {
        let limit = if max == 0 { HARD_MAX_DIMENSION } else { max };
        limit.saturating_sub(options.padding * 2).max(1)
    };
    let (usable_w, usable_h) = (usable(options.max_width), usable(options.max_height));
    for sprite in sprites.iter_mut() {
        let (w, h) = (sprite.width(), sprite.height());
        if w <= usable_w && h <= usable_h {
            continue;
        }
        let scale = (usable_w as f64 / w as f64).min(usable_h as f64 / h as f64);
        let nw = ((w as f64 * scale).floor() as u32).clamp(1, usable_w);
        let nh = ((h as f64 * scale).floor() as u32).clamp(1, usable_h);
        info!(sprite = %sprite.name, from = %format!("{w}x{h}"), to = %format!("{nw}x{nh}"), "auto-resized sprite");
        sprite.image = imageops::resize(&sprite.image, nw, nh, FilterType::Lanczos3);
        sprite.buffer.clear();
        sprite.original_width = nw;
        sprite.original_height = nh;
    }
}

/// Sheet dimensions handed to every packer pass.
///
/// A configured max wins. A max of 0 derives a square size from the padded
/// sprite area (x1.2), never smaller than the largest padded side, rounded to
/// a power of two when requested and capped at `HARD_MAX_DIMENSION`.
fn sheet_limits(sprites: &[Sprite], options: &PackingOptions) -> (u32, u32) {
    if options.max_width > 0 && options.max_height > 0 {
        return (options.max_width, options.max_height);
    }
    let pad = options.padding as u64 * 2;
    let total_area: u64 = sprites
        .iter()
        .map(|s| (s.width() as u64 + pad) * (s.height() as u64 + pad))
        .sum();
    let largest_side = sprites
        .iter()
        .map(|s| s.width().max(s.height()) as u64 + pad)
        .max()
        .unwrap_or(0);
    let mut estimate = (((total_area as f64).sqrt() * AREA_OVERHEAD) as u64).max(largest_side);
    estimate = estimate.min(HARD_MAX_DIMENSION as u64);
    let mut estimate = estimate as u32;
    if options.power_of_two {
        estimate = next_pow2(estimate).min(HARD_MAX_DIMENSION);
    }
    let pick = |max: u32| if max > 0 { max } else { estimate };
    (pick(options.max_width), pick(options.max_height))
}

#[instrument(skip_all, fields(remaining = order.len()))]
/// Packs as many of `order` as fit into one sheet.
///
/// Returns `None` when not a single sprite fits; the second element lists
/// the deferred sprite indices in their original feed order.
fn pack_single_sheet(
    sprites: &[Sprite],
    order: &[usize],
    max_w: u32,
    max_h: u32,
    options: &PackingOptions,
    recompressor: &dyn Recompressor,
) -> Result<(Option<Sheet>, Vec<usize>)> {
    let mut packer = MaxRectsPacker::new(max_w, max_h, options.padding);
    let mut placements: Vec<Placement> = Vec::new();
    let mut unpacked: Vec<usize> = Vec::new();

    for &index in order {
        let sprite = &sprites[index];
        match packer.insert(sprite.width(), sprite.height()) {
            Some(r) => placements.push(Placement {
                index,
                x: r.x,
                y: r.y,
            }),
            None => unpacked.push(index),
        }
    }
    if placements.is_empty() {
        return Ok((None, unpacked));
    }

    let mut used_w = 0;
    let mut used_h = 0;
    for p in &placements {
        let s = &sprites[p.index];
        used_w = used_w.max(p.x + s.width());
        used_h = used_h.max(p.y + s.height());
    }
    let (mut width, mut height) = (used_w, used_h);
    if options.power_of_two {
        width = next_pow2(used_w).min(max_w);
        height = next_pow2(used_h).min(max_h);
    }

    let mut canvas = RgbaImage::new(width, height);
    for p in &placements {
        draw_over(&mut canvas, &sprites[p.index].image, p.x, p.y);
    }
    let png = encode_png(&canvas, options.compression_quality)?;
    let png = maybe_recompress(png, options, recompressor);

    let used_area: u64 = placements.iter().map(|p| sprites[p.index].area()).sum();
    let total_area = width as u64 * height as u64;
    let efficiency = if total_area > 0 {
        used_area as f64 / total_area as f64
    } else {
        0.0
    };

    let sheet = Sheet {
        width,
        height,
        placements,
        image: canvas,
        png,
        efficiency,
    };
    Ok((Some(sheet), unpacked))
}

/// Keeps the re-compressed bytes only when they are non-empty and strictly smaller.
fn maybe_recompress(png: Vec<u8>, options: &PackingOptions, recompressor: &dyn Recompressor) -> Vec<u8> {
    match recompressor.recompress(&png, options.compression_quality.recompress_level()) {
        Ok(smaller) if !smaller.is_empty() && smaller.len() < png.len() => {
            debug!(before = png.len(), after = smaller.len(), "re-compression applied");
            smaller
        }
        Ok(_) => png,
        Err(e) => {
            debug!(error = %e, "re-compression failed; keeping encoder output");
            png
        }
    }
}

/// Builds the diagnostic for a pass that could not place anything.
fn capacity_error(
    sprites: &[Sprite],
    remaining: &[usize],
    max_w: u32,
    max_h: u32,
    options: &PackingOptions,
) -> PackError {
    let mut largest_w = 0;
    let mut largest_h = 0;
    let mut largest_name = String::new();
    for &i in remaining {
        let s = &sprites[i];
        if s.width() > largest_w || s.height() > largest_h {
            largest_w = s.width();
            largest_h = s.height();
            largest_name = s.name.clone();
        }
    }

    if largest_w > HARD_MAX_DIMENSION || largest_h > HARD_MAX_DIMENSION {
        return PackError::OversizedSprite {
            name: largest_name,
            width: largest_w,
            height: largest_h,
            cap: HARD_MAX_DIMENSION,
        };
    }

    let (suggested_width, suggested_height) = suggest_dimensions(
        (largest_w, largest_h),
        (max_w, max_h),
        options.power_of_two,
    );
    PackError::CapacityExceeded {
        name: largest_name,
        width: largest_w,
        height: largest_h,
        max_width: max_w,
        max_height: max_h,
        suggested_width,
        suggested_height,
    }
}

/// Sheet size to suggest for a sprite of `sprite` size: the sprite x1.2 (never
/// below the current limits), rounded to a power of two or up to a multiple of
/// 512, capped at `HARD_MAX_DIMENSION`.
pub fn suggest_dimensions(sprite: (u32, u32), current: (u32, u32), pow2: bool) -> (u32, u32) {
    let suggest = |dim: u32, limit: u32| {
        let desired = (dim as f64 * AREA_OVERHEAD) as u32;
        let s = limit.max(desired).min(HARD_MAX_DIMENSION);
        let rounded = if pow2 { next_pow2(s) } else { s.div_ceil(512) * 512 };
        rounded.min(HARD_MAX_DIMENSION)
    };
    (suggest(sprite.0, current.0), suggest(sprite.1, current.1))
}

/// Emits the size-inflation warning when encoded sheets outgrow the inputs.
fn size_warnings(sheets: &[Sheet], original_size: Option<u64>) -> Vec<String> {
    let Some(original) = original_size.filter(|&n| n > 0) else {
        return Vec::new();
    };
    let output: u64 = sheets.iter().map(|s| s.png.len() as u64).sum();
    if output <= original {
        return Vec::new();
    }
    let increase = (output - original) as f64 / original as f64 * 100.0;
    vec![format!(
        "Output size ({}) is {:.1}% larger than input ({}). Consider adjusting compression settings or dimensions.",
        format_bytes(output),
        increase,
        format_bytes(original),
    )]
}

/// Formats a byte count as `B`, `KB` or `MB` with one decimal.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

pub fn next_pow2(mut v: u32) -> u32 {
    if v <= 1 {
        return 1;
    }
    v -= 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v + 1
}
