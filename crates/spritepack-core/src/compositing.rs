use crate::config::CompressionQuality;
use crate::error::Result;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, Pixel, RgbaImage};

/// Alpha-composites `src` over `canvas` with its top-left at `(dx, dy)`.
///
/// Pixels falling outside the canvas are clipped.
pub fn draw_over(canvas: &mut RgbaImage, src: &RgbaImage, dx: u32, dy: u32) {
    let (cw, ch) = canvas.dimensions();
    if dx >= cw || dy >= ch {
        return;
    }
    let rw = src.width().min(cw - dx);
    let rh = src.height().min(ch - dy);
    for yy in 0..rh {
        for xx in 0..rw {
            let px = *src.get_pixel(xx, yy);
            if px[3] == 0 {
                continue;
            }
            canvas.get_pixel_mut(dx + xx, dy + yy).blend(&px);
        }
    }
}

/// Encodes `image` as PNG at the base compression level of `quality`.
pub fn encode_png(image: &RgbaImage, quality: CompressionQuality) -> Result<Vec<u8>> {
    encode_png_with(image, quality.png_compression())
}

pub(crate) fn encode_png_with(image: &RgbaImage, compression: CompressionType) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Secondary lossless pass over an already encoded PNG.
///
/// `level` is 1 (fast) to 3 (best). Failures never fail a pack: the
/// orchestrator keeps the pre-pass bytes.
pub trait Recompressor {
    fn recompress(&self, png: &[u8], level: u8) -> Result<Vec<u8>>;
}

/// Recompressor that always hands back the input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRecompression;

impl Recompressor for NoRecompression {
    fn recompress(&self, png: &[u8], _level: u8) -> Result<Vec<u8>> {
        Ok(png.to_vec())
    }
}

impl<F> Recompressor for F
where
    F: Fn(&[u8], u8) -> Result<Vec<u8>>,
{
    fn recompress(&self, png: &[u8], level: u8) -> Result<Vec<u8>> {
        self(png, level)
    }
}
