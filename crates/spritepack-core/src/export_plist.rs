use crate::error::Result;
use crate::export::{ExportContext, OutputFormat};
use crate::export_xml::xml_escape;

/// Cocos2d property list (format 2) for the first sheet.
///
/// Each frame dict holds `frame {{x,y},{w,h}}`, `offset {dx,dy}` and
/// `sourceSize {w,h}`. For trimmed sprites the offset is the centered
/// difference `(original - trimmed) / 2` and the source size is the
/// untrimmed size; untrimmed sprites get `{0,0}` and their own size.
pub fn to_cocos2d(ctx: &ExportContext<'_>) -> Result<String> {
    let sheet = ctx.first_sheet(OutputFormat::Cocos2d)?;
    let mut s = String::new();
    s.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>frames</key>
	<dict>
"#);
    for p in ctx.placed(sheet) {
        let sprite = p.sprite;
        let (w, h) = (sprite.width(), sprite.height());
        let (offset, source) = if sprite.trimmed {
            (
                (
                    sprite.original_width.saturating_sub(w) / 2,
                    sprite.original_height.saturating_sub(h) / 2,
                ),
                (sprite.original_width, sprite.original_height),
            )
        } else {
            ((0, 0), (w, h))
        };
        s.push_str(&format!(
            "\t\t<key>{}</key>\n\t\t<dict>\n\t\t\t<key>frame</key>\n\t\t\t<string>{{{{{},{}}},{{{},{}}}}}</string>\n\t\t\t<key>offset</key>\n\t\t\t<string>{{{},{}}}</string>\n\t\t\t<key>sourceSize</key>\n\t\t\t<string>{{{},{}}}</string>\n\t\t</dict>\n",
            xml_escape(&sprite.name),
            p.x, p.y, w, h,
            offset.0, offset.1,
            source.0, source.1,
        ));
    }
    s.push_str("\t</dict>\n");
    s.push_str(&format!(
        "\t<key>metadata</key>\n\t<dict>\n\t\t<key>format</key>\n\t\t<integer>2</integer>\n\t\t<key>textureFileName</key>\n\t\t<string>{}</string>\n\t\t<key>size</key>\n\t\t<string>{{{},{}}}</string>\n\t</dict>\n",
        xml_escape(&ctx.sheet_file(0)),
        sheet.width,
        sheet.height
    ));
    s.push_str("</dict>\n</plist>\n");
    Ok(s)
}
