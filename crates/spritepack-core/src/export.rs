use crate::error::{PackError, Result};
use crate::model::{NameMapping, PlacedSprite, Sheet, Sprite};
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

/// Metadata formats a pack can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Css,
    Csv,
    Xml,
    Sparrow,
    TexturePacker,
    Cocos2d,
    Unity,
    Godot,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 9] = [
        OutputFormat::Json,
        OutputFormat::Css,
        OutputFormat::Csv,
        OutputFormat::Xml,
        OutputFormat::Sparrow,
        OutputFormat::TexturePacker,
        OutputFormat::Cocos2d,
        OutputFormat::Unity,
        OutputFormat::Godot,
    ];

    /// Lowercase name accepted by `FromStr` and used as the key in `PackingResult::formats`.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Css => "css",
            OutputFormat::Csv => "csv",
            OutputFormat::Xml => "xml",
            OutputFormat::Sparrow => "sparrow",
            OutputFormat::TexturePacker => "texturepacker",
            OutputFormat::Cocos2d => "cocos2d",
            OutputFormat::Unity => "unity",
            OutputFormat::Godot => "godot",
        }
    }

    /// File extension (with dot) for the rendered document.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json | OutputFormat::Unity => ".json",
            OutputFormat::Css => ".css",
            OutputFormat::Csv => ".csv",
            OutputFormat::Xml | OutputFormat::Sparrow | OutputFormat::TexturePacker => ".xml",
            OutputFormat::Cocos2d => ".plist",
            OutputFormat::Godot => ".tres",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            OutputFormat::Json => "Generic JSON with sheets and sprite coordinates",
            OutputFormat::Css => "CSS sprite classes with background positions",
            OutputFormat::Csv => "CSV table (name, sheet, x, y, width, height)",
            OutputFormat::Xml => "Generic XML with sheets and sprites",
            OutputFormat::Sparrow => "Sparrow/Starling TextureAtlas XML (HaxeFlixel, FNF)",
            OutputFormat::TexturePacker => "TexturePacker generic XML",
            OutputFormat::Cocos2d => "Cocos2d property list",
            OutputFormat::Unity => "Unity / TexturePacker JSON array",
            OutputFormat::Godot => "Godot AtlasTexture resource (.tres)",
        }
    }

    /// True for formats that describe every sheet; the rest only describe `sheets[0]`.
    pub fn is_multi_sheet(self) -> bool {
        matches!(
            self,
            OutputFormat::Json | OutputFormat::Css | OutputFormat::Csv | OutputFormat::Xml
        )
    }

    /// Renders this format for a finished pack.
    pub fn encode(self, ctx: &ExportContext<'_>) -> Result<Vec<u8>> {
        match self {
            OutputFormat::Json => to_json(ctx),
            OutputFormat::Css => Ok(to_css(ctx).into_bytes()),
            OutputFormat::Csv => Ok(to_csv(ctx).into_bytes()),
            OutputFormat::Xml => Ok(crate::export_xml::to_xml(ctx).into_bytes()),
            OutputFormat::Sparrow => crate::export_xml::to_sparrow(ctx).map(String::into_bytes),
            OutputFormat::TexturePacker => {
                crate::export_xml::to_texturepacker(ctx).map(String::into_bytes)
            }
            OutputFormat::Cocos2d => crate::export_plist::to_cocos2d(ctx).map(String::into_bytes),
            OutputFormat::Unity => to_unity(ctx),
            OutputFormat::Godot => to_godot(ctx).map(String::into_bytes),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = PackError;
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.name() == lower)
            .ok_or_else(|| PackError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a serializer reads from a finished pack.
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub sheets: &'a [Sheet],
    /// Sprite table the sheets' placements index into.
    pub sprites: &'a [Sprite],
    pub name_mapping: &'a NameMapping,
    /// Image path written by formats that embed one (Sparrow).
    pub image_path: &'a str,
    /// Base name of the sheet files the other formats reference.
    pub sheet_name: &'a str,
}

impl<'a> ExportContext<'a> {
    /// The sheet single-sheet formats describe.
    pub fn first_sheet(&self, format: OutputFormat) -> Result<&'a Sheet> {
        self.sheets.first().ok_or_else(|| PackError::NoSheets {
            format: format.name().to_string(),
        })
    }

    /// Placed sprites of sheet `sheet`, in insertion order.
    pub fn placed(&self, sheet: &'a Sheet) -> impl Iterator<Item = PlacedSprite<'a>> + 'a {
        sheet.placed(self.sprites)
    }

    /// File name of sheet `index`, e.g. `spritesheet-0.png`.
    pub fn sheet_file(&self, index: usize) -> String {
        sheet_file_name(self.sheet_name, index)
    }
}

/// `<base>-<index>.png`, the name sheets are written under.
pub fn sheet_file_name(base: &str, index: usize) -> String {
    format!("{base}-{index}.png")
}

fn efficiency_percent(sheet: &Sheet) -> String {
    format!("{:.2}%", sheet.efficiency * 100.0)
}

#[derive(Serialize)]
struct JsonSheet {
    efficiency: String,
    height: u32,
    index: usize,
    width: u32,
}

#[derive(Serialize)]
struct JsonSprite<'a> {
    name: &'a str,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    sheet: usize,
}

#[derive(Serialize)]
struct JsonDoc<'a> {
    sheets: Vec<JsonSheet>,
    sprites: Vec<JsonSprite<'a>>,
}

/// `{ sheets: [{efficiency, height, index, width}], sprites: [{name, x, y, width, height, sheet}] }`
pub fn to_json(ctx: &ExportContext<'_>) -> Result<Vec<u8>> {
    let mut doc = JsonDoc {
        sheets: Vec::with_capacity(ctx.sheets.len()),
        sprites: Vec::new(),
    };
    for (i, sheet) in ctx.sheets.iter().enumerate() {
        doc.sheets.push(JsonSheet {
            efficiency: efficiency_percent(sheet),
            height: sheet.height,
            index: i,
            width: sheet.width,
        });
        for p in ctx.placed(sheet) {
            doc.sprites.push(JsonSprite {
                name: &p.sprite.name,
                x: p.x,
                y: p.y,
                width: p.sprite.width(),
                height: p.sprite.height(),
                sheet: i,
            });
        }
    }
    Ok(serde_json::to_vec_pretty(&doc)?)
}

/// One `.sprite-<name>` rule per placed sprite; `.` and spaces in names become `-`.
pub fn to_css(ctx: &ExportContext<'_>) -> String {
    let mut s = String::new();
    for (i, sheet) in ctx.sheets.iter().enumerate() {
        let file = ctx.sheet_file(i);
        let _ = write!(
            s,
            "/* Spritesheet {} - {}x{} - {} efficient */\n\n",
            i,
            sheet.width,
            sheet.height,
            efficiency_percent(sheet)
        );
        for p in ctx.placed(sheet) {
            let class = p.sprite.name.replace(['.', ' '], "-");
            let _ = write!(
                s,
                ".sprite-{class} {{\n  background-image: url('{file}');\n  background-position: -{}px -{}px;\n  width: {}px;\n  height: {}px;\n}}\n\n",
                p.x,
                p.y,
                p.sprite.width(),
                p.sprite.height()
            );
        }
    }
    s
}

/// Header `name,sheet,x,y,width,height`, one row per placed sprite.
pub fn to_csv(ctx: &ExportContext<'_>) -> String {
    let mut s = String::from("name,sheet,x,y,width,height\n");
    for (i, sheet) in ctx.sheets.iter().enumerate() {
        for p in ctx.placed(sheet) {
            let _ = writeln!(
                s,
                "{},{},{},{},{},{}",
                csv_field(&p.sprite.name),
                i,
                p.x,
                p.y,
                p.sprite.width(),
                p.sprite.height()
            );
        }
    }
    s
}

/// Quotes a CSV field when it contains a delimiter, quote or line break, or starts with whitespace.
fn csv_field(field: &str) -> String {
    let needs_quotes = field.contains([',', '"', '\n', '\r'])
        || field.starts_with([' ', '\t']);
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[derive(Serialize)]
struct UnityRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

#[derive(Serialize)]
struct UnitySize {
    w: u32,
    h: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnityFrame<'a> {
    filename: &'a str,
    frame: UnityRect,
    source_size: UnitySize,
}

#[derive(Serialize)]
struct UnityMeta {
    image: String,
    size: UnitySize,
    scale: &'static str,
}

#[derive(Serialize)]
struct UnityDoc<'a> {
    frames: Vec<UnityFrame<'a>>,
    meta: UnityMeta,
}

/// TexturePacker JSON-array layout as read by Unity importers; first sheet only.
pub fn to_unity(ctx: &ExportContext<'_>) -> Result<Vec<u8>> {
    let sheet = ctx.first_sheet(OutputFormat::Unity)?;
    let frames = ctx
        .placed(sheet)
        .map(|p| UnityFrame {
            filename: &p.sprite.name,
            frame: UnityRect {
                x: p.x,
                y: p.y,
                w: p.sprite.width(),
                h: p.sprite.height(),
            },
            source_size: UnitySize {
                w: p.sprite.width(),
                h: p.sprite.height(),
            },
        })
        .collect();
    let doc = UnityDoc {
        frames,
        meta: UnityMeta {
            image: ctx.sheet_file(0),
            size: UnitySize {
                w: sheet.width,
                h: sheet.height,
            },
            scale: "1",
        },
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}

/// Godot `.tres` with one `ext_resource` for the sheet and one `sub_resource` per sprite.
pub fn to_godot(ctx: &ExportContext<'_>) -> Result<String> {
    let sheet = ctx.first_sheet(OutputFormat::Godot)?;
    let mut s = String::from("[gd_resource type=\"AtlasTexture\" format=2]\n\n");
    let _ = write!(
        s,
        "[ext_resource path=\"res://{}\" type=\"Texture\" id=1]\n\n",
        ctx.sheet_file(0)
    );
    for (i, p) in ctx.placed(sheet).enumerate() {
        let _ = write!(
            s,
            "[sub_resource type=\"AtlasTexture\" id={}]\natlas = ExtResource( 1 )\nregion = Rect2( {}, {}, {}, {} )\n\n",
            i + 1,
            p.x,
            p.y,
            p.sprite.width(),
            p.sprite.height()
        );
    }
    Ok(s)
}
