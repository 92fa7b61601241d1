use image::codecs::png::CompressionType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Absolute per-axis limit for sheets and sprites, in pixels.
pub const HARD_MAX_DIMENSION: u32 = 12288;
/// Runaway guard: a pack never produces more sheets than this.
pub const MAX_SHEETS: usize = 10;
/// Largest accepted padding between sprites.
pub const MAX_PADDING: u32 = 32;
/// Image path written into Sparrow XML when none is configured.
pub const DEFAULT_IMAGE_PATH: &str = "spritesheet.png";
/// Base name of sheet files referenced by metadata (`<name>-<i>.png`).
pub const DEFAULT_SHEET_NAME: &str = "spritesheet";

/// Order in which sprites are fed to the packer.
///   - `Optimal` sorts everything by height (densest, order discarded)
///   - `Smart` sorts fixed-size positional chunks by height
///   - `Preserve` keeps the input order
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackingMode {
    Optimal,
    #[default]
    Smart,
    Preserve,
}

impl FromStr for PackingMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "optimal" => Ok(Self::Optimal),
            "smart" => Ok(Self::Smart),
            "preserve" => Ok(Self::Preserve),
            _ => Err(()),
        }
    }
}

/// PNG compression tier for encoded sheets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompressionQuality {
    Fast,
    #[default]
    Balanced,
    Best,
}

impl FromStr for CompressionQuality {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "best" => Ok(Self::Best),
            _ => Err(()),
        }
    }
}

impl CompressionQuality {
    /// Parses a tier name; anything unrecognized falls back to `Balanced`.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Base compressor setting used when encoding the sheet.
    pub fn png_compression(self) -> CompressionType {
        match self {
            Self::Fast => CompressionType::Fast,
            Self::Balanced => CompressionType::Default,
            Self::Best => CompressionType::Best,
        }
    }

    /// Level handed to the secondary re-compressor.
    pub fn recompress_level(self) -> u8 {
        match self {
            Self::Fast => 1,
            Self::Balanced => 2,
            Self::Best => 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackingOptions {
    /// Pixels reserved on every side of each sprite.
    pub padding: u32,
    /// Round final sheet dimensions up to powers of two (capped at the max).
    pub power_of_two: bool,
    /// Trim transparent borders; narrowed by `trim_only` / `trim_except`.
    pub trim_transparency: bool,
    /// Glob patterns; when non-empty only matching sprites are trimmed.
    pub trim_only: Vec<String>,
    /// Glob patterns; matching sprites are not trimmed. Ignored when `trim_only` is set.
    pub trim_except: Vec<String>,
    /// Maximum sheet width in pixels (0 = derive from sprite area).
    pub max_width: u32,
    /// Maximum sheet height in pixels (0 = derive from sprite area).
    pub max_height: u32,
    /// Format names to generate (json, css, csv, xml, sparrow, texturepacker, cocos2d, unity, godot).
    pub output_formats: Vec<String>,
    /// Accepted for compatibility. Sprites are never rotated.
    pub allow_rotation: bool,
    /// Downscale sprites that cannot fit in a sheet instead of failing.
    pub auto_resize: bool,
    /// Original sprite name -> canonical name, as produced by `deduplicate`.
    pub name_mapping: HashMap<String, String>,
    pub packing_mode: PackingMode,
    pub compression_quality: CompressionQuality,
    /// Image path referenced by Sparrow XML.
    pub image_path: Option<String>,
    /// Sheets are referenced by metadata as `<sheet_name>-<i>.png`.
    pub sheet_name: String,
    /// Total byte size of the inputs; enables the size-inflation warning.
    pub original_size: Option<u64>,
}

impl Default for PackingOptions {
    fn default() -> Self {
        Self {
            padding: 2,
            power_of_two: false,
            trim_transparency: false,
            trim_only: Vec::new(),
            trim_except: Vec::new(),
            max_width: 2048,
            max_height: 2048,
            output_formats: vec!["json".into()],
            allow_rotation: false,
            auto_resize: false,
            name_mapping: HashMap::new(),
            packing_mode: PackingMode::default(),
            compression_quality: CompressionQuality::default(),
            image_path: None,
            sheet_name: DEFAULT_SHEET_NAME.into(),
            original_size: None,
        }
    }
}

impl PackingOptions {
    /// Validates the option ranges the packer relies on.
    ///
    /// Returns an error if:
    /// - padding exceeds `MAX_PADDING`
    /// - a max dimension exceeds `HARD_MAX_DIMENSION`
    /// - padding alone would consume a configured max dimension
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::PackError;

        if self.padding > MAX_PADDING {
            return Err(PackError::InvalidConfig(format!(
                "padding ({}) must be between 0 and {}",
                self.padding, MAX_PADDING
            )));
        }
        if self.max_width > HARD_MAX_DIMENSION || self.max_height > HARD_MAX_DIMENSION {
            return Err(PackError::InvalidConfig(format!(
                "max sheet dimensions {}x{} exceed the limit of {}x{}",
                self.max_width, self.max_height, HARD_MAX_DIMENSION, HARD_MAX_DIMENSION
            )));
        }
        let total_padding = self.padding.saturating_mul(2);
        let too_small = |dim: u32| dim != 0 && dim <= total_padding;
        if too_small(self.max_width) || too_small(self.max_height) {
            return Err(PackError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no usable space in {}x{}",
                self.padding, self.max_width, self.max_height
            )));
        }
        Ok(())
    }

    /// Image path for formats that embed one.
    pub fn image_path(&self) -> &str {
        self.image_path.as_deref().unwrap_or(DEFAULT_IMAGE_PATH)
    }

    /// Create a fluent builder for `PackingOptions`.
    pub fn builder() -> PackingOptionsBuilder {
        PackingOptionsBuilder::new()
    }
}

/// Builder for `PackingOptions` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackingOptionsBuilder {
    opts: PackingOptions,
}

impl PackingOptionsBuilder {
    pub fn new() -> Self {
        Self {
            opts: PackingOptions::default(),
        }
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.opts.padding = v;
        self
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.opts.max_width = w;
        self.opts.max_height = h;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.opts.power_of_two = v;
        self
    }
    pub fn trim(mut self, v: bool) -> Self {
        self.opts.trim_transparency = v;
        self
    }
    pub fn trim_only<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.trim_only = patterns.into_iter().map(Into::into).collect();
        self
    }
    pub fn trim_except<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.trim_except = patterns.into_iter().map(Into::into).collect();
        self
    }
    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.output_formats = formats.into_iter().map(Into::into).collect();
        self
    }
    pub fn auto_resize(mut self, v: bool) -> Self {
        self.opts.auto_resize = v;
        self
    }
    pub fn name_mapping(mut self, v: HashMap<String, String>) -> Self {
        self.opts.name_mapping = v;
        self
    }
    pub fn packing_mode(mut self, v: PackingMode) -> Self {
        self.opts.packing_mode = v;
        self
    }
    pub fn compression_quality(mut self, v: CompressionQuality) -> Self {
        self.opts.compression_quality = v;
        self
    }
    pub fn image_path(mut self, v: impl Into<String>) -> Self {
        self.opts.image_path = Some(v.into());
        self
    }
    pub fn sheet_name(mut self, v: impl Into<String>) -> Self {
        self.opts.sheet_name = v.into();
        self
    }
    pub fn original_size(mut self, v: Option<u64>) -> Self {
        self.opts.original_size = v;
        self
    }
    pub fn build(self) -> PackingOptions {
        self.opts
    }
}
