//! Core library for packing sprite frames into spritesheets.
//!
//! - Packer: MaxRects with Best-Short-Side-Fit and per-sprite padding
//! - Preprocessing: selective trimming, content deduplication, frame-order strategies
//! - Orchestration: sheet sizing, multi-sheet splitting, PNG encoding, capacity diagnostics
//! - Metadata: JSON, CSS, CSV, XML, Sparrow, TexturePacker, Cocos2d, Unity and Godot
//! - Import: Sparrow XML parsing and frame extraction for re-packing existing atlases
//!
//! Quick example:
//! ```ignore
//! use spritepack_core::{PackingOptions, Sprite, deduplicate, pack};
//! # fn main() -> anyhow::Result<()> {
//! let sprites = vec![
//!     Sprite::from_encoded("walk_0.png", std::fs::read("walk_0.png")?)?,
//!     Sprite::from_encoded("walk_1.png", std::fs::read("walk_1.png")?)?,
//! ];
//! let (unique, mapping) = deduplicate(sprites);
//! let opts = PackingOptions::builder()
//!     .formats(["json", "sparrow"])
//!     .name_mapping(mapping)
//!     .build();
//! let out = pack(unique, opts)?;
//! println!("sheets: {}", out.sheets.len());
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod dedup;
pub mod error;
pub mod export;
pub mod export_plist;
pub mod export_xml;
pub mod import;
pub mod model;
pub mod order;
pub mod packer;
pub mod pipeline;
pub mod trim;

pub use compositing::{NoRecompression, Recompressor};
pub use config::*;
pub use dedup::{DedupOptions, deduplicate, deduplicate_with};
pub use error::*;
pub use export::{ExportContext, OutputFormat, sheet_file_name};
pub use import::{extract_frames, parse_sparrow_xml};
pub use model::*;
pub use order::packing_order;
pub use packer::*;
pub use pipeline::{format_bytes, pack, pack_with};
pub use trim::{TrimSelector, TrimmedImage, trim};

/// Convenience prelude for common types and functions.
/// Importing `spritepack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{CompressionQuality, PackingMode, PackingOptions, PackingOptionsBuilder};
    pub use crate::model::{FrameData, PackStats, PackingResult, Placement, Rect, Sheet, Sprite};
    pub use crate::{
        OutputFormat, PackError, Recompressor, deduplicate, extract_frames, pack, pack_with,
        parse_sparrow_xml,
    };
}
