use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no sprites provided")]
    EmptyInput,
    #[error(
        "frame '{name}' is fully transparent after trimming. Disable trimTransparency or check source image"
    )]
    FullyTransparentSprite { name: String },
    #[error("image is fully transparent after trimming")]
    FullyTransparentImage,
    #[error(
        "failed to pack sprites - sprite '{name}' is {width}x{height} pixels, which exceeds the maximum sheet size of {cap}x{cap}. Individual sprites must fit within sheet dimensions. Either resize the sprite or enable autoResize to automatically resize oversized sprites"
    )]
    OversizedSprite {
        name: String,
        width: u32,
        height: u32,
        cap: u32,
    },
    #[error(
        "failed to pack sprites - largest sprite '{name}' is {width}x{height} pixels, but max sheet dimensions are {max_width}x{max_height}. Try increasing maxWidth and maxHeight to {suggested_width}x{suggested_height}"
    )]
    CapacityExceeded {
        name: String,
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
        suggested_width: u32,
        suggested_height: u32,
    },
    #[error("too many atlas splits (more than {max} sheets) - consider increasing max dimensions")]
    TooManySplits { max: usize },
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("no sheets to export as {format}")]
    NoSheets { format: String },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid trim pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("failed to parse Sparrow XML: {0}")]
    Parse(String),
    #[error(
        "frame '{name}' ({x},{y} {width}x{height}) lies outside the {sheet_width}x{sheet_height} sheet"
    )]
    FrameOutOfBounds {
        name: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        sheet_width: u32,
        sheet_height: u32,
    },
    #[error("re-compression failed: {0}")]
    Recompress(String),
}

pub type Result<T> = std::result::Result<T, PackError>;
