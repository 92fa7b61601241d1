use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Original sprite name -> canonical sprite name.
pub type NameMapping = HashMap<String, String>;

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Exclusive right edge (`x + w`).
    pub fn right_ex(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn bottom_ex(&self) -> u32 {
        self.y + self.h
    }
    /// Returns true if `r` is fully inside `self` (edges may touch).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right_ex() <= self.right_ex() && r.bottom_ex() <= self.bottom_ex()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right_ex()
            && other.x < self.right_ex()
            && self.y < other.bottom_ex()
            && other.y < self.bottom_ex()
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// A sprite to be packed: decoded pixels plus trim bookkeeping.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// Identity used in every output format.
    pub name: String,
    /// Current pixels (post-trim once preprocessing ran).
    pub image: RgbaImage,
    /// Encoded bytes the sprite was decoded from; may be empty.
    pub buffer: Vec<u8>,
    pub trimmed: bool,
    /// Pixels cut from the left edge by trimming.
    pub trim_offset_x: u32,
    /// Pixels cut from the top edge by trimming.
    pub trim_offset_y: u32,
    /// Width before trimming.
    pub original_width: u32,
    /// Height before trimming.
    pub original_height: u32,
    /// Position in the caller-supplied input.
    pub original_index: usize,
}

impl Sprite {
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self::with_buffer(name, image, Vec::new())
    }

    pub fn with_buffer(name: impl Into<String>, image: RgbaImage, buffer: Vec<u8>) -> Self {
        let (w, h) = image.dimensions();
        Self {
            name: name.into(),
            image,
            buffer,
            trimmed: false,
            trim_offset_x: 0,
            trim_offset_y: 0,
            original_width: w,
            original_height: h,
            original_index: 0,
        }
    }

    /// Decodes `bytes` (any format the `image` crate reads) and keeps them for deduplication.
    pub fn from_encoded(name: impl Into<String>, bytes: Vec<u8>) -> crate::error::Result<Self> {
        let image = image::load_from_memory(&bytes)?.to_rgba8();
        Ok(Self::with_buffer(name, image, bytes))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Bytes compared by deduplication: the encoded buffer, or raw RGBA when none was kept.
    pub fn content_bytes(&self) -> &[u8] {
        if self.buffer.is_empty() {
            self.image.as_raw()
        } else {
            &self.buffer
        }
    }
}

/// Where one sprite of the sprite table landed on a sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement {
    /// Index into the sprite table (equals the sprite's `original_index`).
    pub index: usize,
    pub x: u32,
    pub y: u32,
}

/// Borrowed view joining a placement with its sprite.
#[derive(Debug, Clone, Copy)]
pub struct PlacedSprite<'a> {
    pub sprite: &'a Sprite,
    pub x: u32,
    pub y: u32,
}

impl PlacedSprite<'_> {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.sprite.width(), self.sprite.height())
    }
}

/// One composited spritesheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub width: u32,
    pub height: u32,
    /// Placements in insertion order.
    pub placements: Vec<Placement>,
    pub image: RgbaImage,
    /// Encoded PNG bytes of `image`.
    pub png: Vec<u8>,
    /// Used sprite area / sheet area.
    pub efficiency: f64,
}

impl Sheet {
    /// Iterates placements in insertion order, resolved against `sprites`.
    pub fn placed<'a>(&'a self, sprites: &'a [Sprite]) -> impl Iterator<Item = PlacedSprite<'a>> + 'a {
        self.placements.iter().map(move |p| PlacedSprite {
            sprite: &sprites[p.index],
            x: p.x,
            y: p.y,
        })
    }

    pub fn used_area(&self, sprites: &[Sprite]) -> u64 {
        self.placed(sprites).map(|p| p.sprite.area()).sum()
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Output of a packing run.
#[derive(Debug, Clone)]
pub struct PackingResult {
    pub sheets: Vec<Sheet>,
    /// Sprite table (post-trim) in input order; `Placement::index` points here.
    pub sprites: Vec<Sprite>,
    /// Format name -> encoded metadata.
    pub formats: BTreeMap<String, Vec<u8>>,
    pub total_sprites: usize,
    /// Non-fatal, human-readable notices.
    pub warnings: Vec<String>,
}

impl PackingResult {
    /// Placed sprites across all sheets as `(sheet index, view)`, sheet by sheet.
    pub fn placed(&self) -> impl Iterator<Item = (usize, PlacedSprite<'_>)> + '_ {
        self.sheets
            .iter()
            .enumerate()
            .flat_map(move |(i, s)| s.placed(&self.sprites).map(move |p| (i, p)))
    }

    /// Computes packing statistics for this result.
    pub fn stats(&self) -> PackStats {
        let mut total_sheet_area = 0u64;
        let mut used_sprite_area = 0u64;
        let mut num_sprites = 0;
        let mut num_trimmed = 0;
        let mut encoded_bytes = 0u64;
        for sheet in &self.sheets {
            total_sheet_area += sheet.area();
            encoded_bytes += sheet.png.len() as u64;
            for p in sheet.placed(&self.sprites) {
                num_sprites += 1;
                used_sprite_area += p.sprite.area();
                if p.sprite.trimmed {
                    num_trimmed += 1;
                }
            }
        }
        let occupancy = if total_sheet_area > 0 {
            used_sprite_area as f64 / total_sheet_area as f64
        } else {
            0.0
        };
        PackStats {
            num_sheets: self.sheets.len(),
            num_sprites,
            total_sheet_area,
            used_sprite_area,
            occupancy,
            num_trimmed,
            encoded_bytes,
        }
    }
}

/// Statistics about packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_sheets: usize,
    /// Unique sprites placed (duplicates collapsed by dedup count once).
    pub num_sprites: usize,
    pub total_sheet_area: u64,
    pub used_sprite_area: u64,
    /// used_sprite_area / total_sheet_area (0.0 to 1.0).
    pub occupancy: f64,
    pub num_trimmed: usize,
    /// Sum of encoded sheet sizes.
    pub encoded_bytes: u64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sheets: {}, Sprites: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px², Trimmed: {}, Size: {}",
            self.num_sheets,
            self.num_sprites,
            self.occupancy * 100.0,
            self.total_sheet_area,
            self.used_sprite_area,
            self.num_trimmed,
            crate::pipeline::format_bytes(self.encoded_bytes),
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_sheet_area.saturating_sub(self.used_sprite_area)
    }
}

/// One `SubTexture` record read back from Sparrow XML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameData {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Negative of the left trim offset.
    pub frame_x: i32,
    /// Negative of the top trim offset.
    pub frame_y: i32,
    /// Untrimmed width; 0 when the frame was not trimmed.
    pub frame_width: u32,
    /// Untrimmed height; 0 when the frame was not trimmed.
    pub frame_height: u32,
}
