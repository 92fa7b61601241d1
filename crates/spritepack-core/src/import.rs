//! Reading an existing Sparrow/Starling atlas back into loose sprites.

use crate::compositing::encode_png_with;
use crate::error::{PackError, Result};
use crate::model::{FrameData, Sprite};
use image::RgbaImage;
use image::codecs::png::CompressionType;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::str::FromStr;

/// Parses the `SubTexture` children of a Sparrow `TextureAtlas` document.
///
/// Missing numeric attributes default to 0. The root element must be
/// `TextureAtlas`.
pub fn parse_sparrow_xml(xml: &[u8]) -> Result<Vec<FrameData>> {
    let text = std::str::from_utf8(xml).map_err(|e| PackError::Parse(e.to_string()))?;
    let mut reader = Reader::from_str(text);
    let mut frames = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event().map_err(|e| PackError::Parse(e.to_string()))? {
            Event::Start(e) => {
                visit_element(&e, depth, &mut seen_root, &mut frames)?;
                depth += 1;
            }
            Event::Empty(e) => visit_element(&e, depth, &mut seen_root, &mut frames)?,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }
    if !seen_root {
        return Err(PackError::Parse("missing TextureAtlas root element".into()));
    }
    Ok(frames)
}

fn visit_element(
    e: &BytesStart<'_>,
    depth: usize,
    seen_root: &mut bool,
    frames: &mut Vec<FrameData>,
) -> Result<()> {
    let name = e.name();
    match (depth, name.as_ref()) {
        (0, b"TextureAtlas") => *seen_root = true,
        (0, other) => {
            return Err(PackError::Parse(format!(
                "expected element TextureAtlas but found {}",
                String::from_utf8_lossy(other)
            )));
        }
        (1, b"SubTexture") => frames.push(parse_sub_texture(e)?),
        _ => {}
    }
    Ok(())
}

fn parse_sub_texture(e: &BytesStart<'_>) -> Result<FrameData> {
    let mut frame = FrameData::default();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| PackError::Parse(err.to_string()))?;
        let value = attr
            .unescape_value()
            .map_err(|err| PackError::Parse(err.to_string()))?;
        match attr.key.as_ref() {
            b"name" => frame.name = value.into_owned(),
            b"x" => frame.x = parse_attr(&value, "x")?,
            b"y" => frame.y = parse_attr(&value, "y")?,
            b"width" => frame.width = parse_attr(&value, "width")?,
            b"height" => frame.height = parse_attr(&value, "height")?,
            b"frameX" => frame.frame_x = parse_attr(&value, "frameX")?,
            b"frameY" => frame.frame_y = parse_attr(&value, "frameY")?,
            b"frameWidth" => frame.frame_width = parse_attr(&value, "frameWidth")?,
            b"frameHeight" => frame.frame_height = parse_attr(&value, "frameHeight")?,
            _ => {}
        }
    }
    Ok(frame)
}

fn parse_attr<T: FromStr>(value: &str, attr: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PackError::Parse(format!("attribute {attr}=\"{value}\" is not a valid number")))
}

/// Crops every frame out of `sheet` into a standalone sprite.
///
/// Each sprite keeps a fast-encoded PNG buffer (so it can be deduplicated),
/// takes its position in `frames` as `original_index`, and restores trim
/// metadata when the frame records an untrimmed size.
pub fn extract_frames(sheet: &RgbaImage, frames: &[FrameData]) -> Result<Vec<Sprite>> {
    let (sw, sh) = sheet.dimensions();
    let mut sprites = Vec::with_capacity(frames.len());
    for (i, f) in frames.iter().enumerate() {
        let fits_x = f.x as u64 + f.width as u64 <= sw as u64;
        let fits_y = f.y as u64 + f.height as u64 <= sh as u64;
        if !fits_x || !fits_y {
            return Err(PackError::FrameOutOfBounds {
                name: f.name.clone(),
                x: f.x,
                y: f.y,
                width: f.width,
                height: f.height,
                sheet_width: sw,
                sheet_height: sh,
            });
        }
        let image = image::imageops::crop_imm(sheet, f.x, f.y, f.width, f.height).to_image();
        let buffer = encode_png_with(&image, CompressionType::Fast)?;
        let mut sprite = Sprite::with_buffer(f.name.clone(), image, buffer);
        sprite.original_index = i;
        if f.frame_width > 0 && f.frame_height > 0 {
            sprite.trimmed = true;
            sprite.trim_offset_x = f.frame_x.saturating_neg().max(0) as u32;
            sprite.trim_offset_y = f.frame_y.saturating_neg().max(0) as u32;
            sprite.original_width = f.frame_width;
            sprite.original_height = f.frame_height;
        }
        sprites.push(sprite);
    }
    Ok(sprites)
}
