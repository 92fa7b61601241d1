use crate::error::Result;
use crate::export::{ExportContext, OutputFormat};
use std::collections::HashMap;
use std::fmt::Write as _;

/// `<spritesheets>` with one `<sheet>` per sheet and one `<sprite>` per placement.
pub fn to_xml(ctx: &ExportContext<'_>) -> String {
    let mut s = String::from("<spritesheets>\n");
    for (i, sheet) in ctx.sheets.iter().enumerate() {
        let _ = writeln!(
            s,
            "  <sheet index=\"{}\" width=\"{}\" height=\"{}\" efficiency=\"{}\">",
            i, sheet.width, sheet.height, sheet.efficiency
        );
        for p in ctx.placed(sheet) {
            let _ = writeln!(
                s,
                "    <sprite name=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>",
                xml_escape(&p.sprite.name),
                p.x,
                p.y,
                p.sprite.width(),
                p.sprite.height()
            );
        }
        s.push_str("  </sheet>\n");
    }
    s.push_str("</spritesheets>\n");
    s
}

struct SubTexture<'a> {
    name: &'a str,
    original_index: usize,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    /// `(frameX, frameY, frameWidth, frameHeight)` for trimmed sprites.
    frame: Option<(i64, i64, u32, u32)>,
}

/// Sparrow/Starling `TextureAtlas` for the first sheet.
///
/// Every name that deduplication folded into a placed sprite gets its own
/// `SubTexture` sharing that sprite's geometry. Entries are ordered by
/// `(original_index, name)`. Trimmed sprites carry `frameX/frameY` (negated
/// trim offsets) and `frameWidth/frameHeight` (untrimmed size).
pub fn to_sparrow(ctx: &ExportContext<'_>) -> Result<String> {
    let sheet = ctx.first_sheet(OutputFormat::Sparrow)?;

    let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
    for (original, canonical) in ctx.name_mapping {
        aliases.entry(canonical.as_str()).or_default().push(original.as_str());
    }
    for names in aliases.values_mut() {
        names.sort_unstable();
    }

    let mut entries: Vec<SubTexture<'_>> = Vec::new();
    for p in ctx.placed(sheet) {
        let sprite = p.sprite;
        let names = match aliases.get(sprite.name.as_str()) {
            Some(names) if !names.is_empty() => names.clone(),
            _ => vec![sprite.name.as_str()],
        };
        let frame = sprite.trimmed.then(|| {
            (
                -(sprite.trim_offset_x as i64),
                -(sprite.trim_offset_y as i64),
                sprite.original_width,
                sprite.original_height,
            )
        });
        for name in names {
            entries.push(SubTexture {
                name,
                original_index: sprite.original_index,
                x: p.x,
                y: p.y,
                width: sprite.width(),
                height: sprite.height(),
                frame,
            });
        }
    }
    entries.sort_by(|a, b| {
        a.original_index
            .cmp(&b.original_index)
            .then_with(|| a.name.cmp(b.name))
    });

    let mut s = format!("<TextureAtlas imagePath=\"{}\">\n", xml_escape(ctx.image_path));
    for e in &entries {
        let _ = write!(
            s,
            "  <SubTexture name=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"",
            xml_escape(e.name),
            e.x,
            e.y,
            e.width,
            e.height
        );
        if let Some((fx, fy, fw, fh)) = e.frame {
            let _ = write!(
                s,
                " frameX=\"{fx}\" frameY=\"{fy}\" frameWidth=\"{fw}\" frameHeight=\"{fh}\""
            );
        }
        s.push_str("/>\n");
    }
    s.push_str("</TextureAtlas>\n");
    Ok(s)
}

/// TexturePacker generic XML for the first sheet; trimmed sprites add `oX oY oW oH`.
pub fn to_texturepacker(ctx: &ExportContext<'_>) -> Result<String> {
    let sheet = ctx.first_sheet(OutputFormat::TexturePacker)?;
    let mut s = format!(
        "<TextureAtlas imagePath=\"{}\" width=\"{}\" height=\"{}\">\n",
        xml_escape(&ctx.sheet_file(0)),
        sheet.width,
        sheet.height
    );
    for p in ctx.placed(sheet) {
        let sprite = p.sprite;
        let _ = write!(
            s,
            "  <sprite n=\"{}\" x=\"{}\" y=\"{}\" w=\"{}\" h=\"{}\"",
            xml_escape(&sprite.name),
            p.x,
            p.y,
            sprite.width(),
            sprite.height()
        );
        if sprite.trimmed {
            let _ = write!(
                s,
                " oX=\"{}\" oY=\"{}\" oW=\"{}\" oH=\"{}\"",
                sprite.trim_offset_x, sprite.trim_offset_y, sprite.original_width, sprite.original_height
            );
        }
        s.push_str("/>\n");
    }
    s.push_str("</TextureAtlas>\n");
    Ok(s)
}

pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
