use crate::config::PackingOptions;
use crate::error::{PackError, Result};
use crate::model::Rect;
use globset::{Glob, GlobSet, GlobSetBuilder};
use image::RgbaImage;

/// Result of trimming one image to its opaque bounding box.
#[derive(Debug, Clone)]
pub struct TrimmedImage {
    pub image: RgbaImage,
    /// Pixels removed from the left edge.
    pub offset_x: u32,
    /// Pixels removed from the top edge.
    pub offset_y: u32,
    pub original_width: u32,
    pub original_height: u32,
}

/// Returns the tightest rectangle containing every pixel with alpha > 0,
/// or `None` when the image has no such pixel.
pub fn compute_trim_rect(rgba: &RgbaImage) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let opaque = |x: u32, y: u32| rgba.get_pixel(x, y)[3] > 0;
    let column_empty = |x: u32, y1: u32, y2: u32| (y1..=y2).all(|y| !opaque(x, y));
    let row_empty = |y: u32, x1: u32, x2: u32| (x1..=x2).all(|x| !opaque(x, y));

    let mut x1 = 0;
    let mut y1 = 0;
    let mut x2 = w - 1;
    let mut y2 = h - 1;
    // left
    while x1 < w && column_empty(x1, 0, h - 1) {
        x1 += 1;
    }
    if x1 >= w {
        return None;
    }
    // right
    while x2 > x1 && column_empty(x2, 0, h - 1) {
        x2 -= 1;
    }
    // top
    while y1 < h && row_empty(y1, x1, x2) {
        y1 += 1;
    }
    // bottom
    while y2 > y1 && row_empty(y2, x1, x2) {
        y2 -= 1;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Crops `image` to its opaque bounding box.
///
/// Fails with `FullyTransparentImage` when no pixel has alpha > 0.
pub fn trim(image: &RgbaImage) -> Result<TrimmedImage> {
    let bounds = compute_trim_rect(image).ok_or(PackError::FullyTransparentImage)?;
    let cropped = image::imageops::crop_imm(image, bounds.x, bounds.y, bounds.w, bounds.h).to_image();
    Ok(TrimmedImage {
        image: cropped,
        offset_x: bounds.x,
        offset_y: bounds.y,
        original_width: image.width(),
        original_height: image.height(),
    })
}

/// Decides per sprite name whether trimming applies.
///
/// `trim_only` wins over `trim_except`; with neither, every sprite is trimmed.
#[derive(Debug, Clone)]
pub struct TrimSelector {
    enabled: bool,
    only: Option<GlobSet>,
    except: Option<GlobSet>,
}

impl TrimSelector {
    pub fn from_options(opts: &PackingOptions) -> Result<Self> {
        Ok(Self {
            enabled: opts.trim_transparency,
            only: build_glob_set(&opts.trim_only)?,
            except: build_glob_set(&opts.trim_except)?,
        })
    }

    pub fn should_trim(&self, name: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if let Some(only) = &self.only {
            return only.is_match(name);
        }
        if let Some(except) = &self.except {
            return !except.is_match(name);
        }
        true
    }
}

/// Returns true if `name` matches any of `patterns` (`*` matches any run of characters).
pub fn matches_any(name: &str, patterns: &[String]) -> Result<bool> {
    Ok(build_glob_set(patterns)?.is_some_and(|set| set.is_match(name)))
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| PackError::InvalidPattern {
            pattern: pat.clone(),
            reason: e.to_string(),
        })?;
        b.add(glob);
    }
    let set = b.build().map_err(|e| PackError::InvalidPattern {
        pattern: patterns.join(","),
        reason: e.to_string(),
    })?;
    Ok(Some(set))
}
