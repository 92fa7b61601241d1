use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use spritepack_core::{
    CompressionQuality, NoRecompression, OutputFormat, PackError, PackingMode, PackingOptions,
    Recompressor, Sprite, deduplicate, extract_frames, pack_with, parse_sparrow_xml,
    sheet_file_name,
};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "spritepack",
    about = "Pack sprite frames into spritesheets with engine metadata",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack a file or directory of frames into spritesheets
    Pack(PackArgs),
    /// Split a Sparrow atlas (sheet PNG + XML) back into frame PNGs
    Unpack(UnpackArgs),
    /// List the supported metadata formats
    Formats,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name: sheets are written as <name>-<i>.png
    #[arg(short, long, default_value = "spritesheet", help_heading = "Input/Output")]
    name: String,
    /// YAML options file; its values override the flags below
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Padding on every side of each sprite (0..=32)
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    padding: u32,
    /// Max sheet width (0 = derive from sprite area)
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_width: u32,
    /// Max sheet height (0 = derive from sprite area)
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_height: u32,
    /// Round sheet dims up to powers of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Packing order: optimal | smart | preserve
    #[arg(long, default_value = "smart", help_heading = "Layout")]
    mode: String,
    /// Downscale sprites that do not fit in a sheet
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    auto_resize: bool,

    // Image Processing
    /// Trim transparent borders
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    trim: bool,
    /// Only trim sprites whose name matches one of these globs
    #[arg(long, help_heading = "Image Processing")]
    trim_only: Vec<String>,
    /// Trim every sprite except those matching these globs
    #[arg(long, help_heading = "Image Processing")]
    trim_except: Vec<String>,
    /// Collapse byte-identical frames into one packed sprite
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    dedup: bool,
    /// PNG compression: fast | balanced | best
    #[arg(long, default_value = "balanced", help_heading = "Image Processing")]
    quality: String,
    /// Run sheets through `oxipng` (must be on PATH); failures keep the original PNG
    #[arg(long, default_value_t = false, help_heading = "Image Processing")]
    oxipng: bool,

    // Export
    /// Metadata formats, comma separated (see `spritepack formats`)
    #[arg(long, value_delimiter = ',', default_value = "json", help_heading = "Export")]
    formats: Vec<String>,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged options (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Dry run: pack and report stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct UnpackArgs {
    /// Sheet image
    sheet: PathBuf,
    /// Sparrow/Starling XML describing the sheet
    atlas: PathBuf,
    /// Output directory for the frame PNGs
    #[arg(short, long, default_value = "frames")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Unpack(args) => run_unpack(args),
        Commands::Formats => {
            for f in OutputFormat::ALL {
                println!("{:<14} {:<7} {}", f.name(), f.extension(), f.description());
            }
            Ok(())
        }
    }
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut opts = options_from_args(cli)?;
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.apply(&mut opts)
            .with_context(|| format!("apply config {}", path.display()))?;
    }
    opts.validate()?;

    if cli.print_config {
        println!("{}", serde_yaml::to_string(&opts)?);
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let (mut sprites, input_bytes) = load_sprites_with_progress(&cli.input, &paths, show_progress)?;
    info!(count = sprites.len(), bytes = input_bytes, "loaded input images");
    opts.original_size = Some(input_bytes);

    if cli.dedup {
        let (unique, mapping) = deduplicate(sprites);
        info!(
            unique = unique.len(),
            total = mapping.len(),
            "deduplicated frames"
        );
        sprites = unique;
        opts.name_mapping = mapping;
    }

    let formats = opts.output_formats.clone();
    let sheet_name = opts.sheet_name.clone();
    let out = if cli.oxipng {
        pack_with(sprites, opts, &OxipngProcess::default())?
    } else {
        pack_with(sprites, opts, &NoRecompression)?
    };

    for w in &out.warnings {
        warn!("{w}");
    }
    let stats = out.stats();
    info!(
        sheets = stats.num_sheets,
        sprites = stats.num_sprites,
        used_area = stats.used_sprite_area,
        total_area = stats.total_sheet_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    if cli.dry_run {
        println!("{}", stats.summary());
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    for (i, sheet) in out.sheets.iter().enumerate() {
        let png_path = cli.out_dir.join(sheet_file_name(&sheet_name, i));
        fs::write(&png_path, &sheet.png)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, width = sheet.width, height = sheet.height, "wrote sheet");
    }
    for (file, bytes) in metadata_files(&sheet_name, &formats, &out.formats)? {
        let path = cli.out_dir.join(file);
        fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        info!(?path, "wrote metadata");
    }
    if let Some(stats_path) = &cli.export_stats {
        fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("write {}", stats_path.display()))?;
    }
    Ok(())
}

fn options_from_args(cli: &PackArgs) -> anyhow::Result<PackingOptions> {
    let mode: PackingMode = cli
        .mode
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown packing mode: {}", cli.mode))?;
    Ok(PackingOptions::builder()
        .padding(cli.padding)
        .with_max_dimensions(cli.max_width, cli.max_height)
        .pow2(cli.pow2)
        .trim(cli.trim || !cli.trim_only.is_empty() || !cli.trim_except.is_empty())
        .trim_only(cli.trim_only.iter().cloned())
        .trim_except(cli.trim_except.iter().cloned())
        .formats(cli.formats.iter().map(|s| s.trim().to_string()))
        .auto_resize(cli.auto_resize)
        .packing_mode(mode)
        .compression_quality(CompressionQuality::parse_or_default(&cli.quality))
        .image_path(sheet_file_name(&cli.name, 0))
        .sheet_name(cli.name.clone())
        .build())
}

/// File names for the rendered formats. Formats sharing an extension get the
/// format name folded in (`<name>.<format>.xml`).
fn metadata_files<'a>(
    name: &str,
    requested: &[String],
    rendered: &'a std::collections::BTreeMap<String, Vec<u8>>,
) -> anyhow::Result<Vec<(String, &'a [u8])>> {
    let parsed: Vec<OutputFormat> = requested
        .iter()
        .map(|s| s.parse())
        .collect::<Result<_, PackError>>()?;
    let mut per_ext: HashMap<&str, usize> = HashMap::new();
    for f in &parsed {
        *per_ext.entry(f.extension()).or_default() += 1;
    }
    let mut files = Vec::new();
    for (key, f) in requested.iter().zip(parsed) {
        let Some(bytes) = rendered.get(key) else {
            continue;
        };
        let file = if per_ext.get(f.extension()).copied().unwrap_or(0) > 1 {
            format!("{}.{}{}", name, f.name(), f.extension())
        } else {
            format!("{}{}", name, f.extension())
        };
        files.push((file, bytes.as_slice()));
    }
    Ok(files)
}

fn run_unpack(args: &UnpackArgs) -> anyhow::Result<()> {
    let sheet = image::open(&args.sheet)
        .with_context(|| format!("open {}", args.sheet.display()))?
        .to_rgba8();
    let xml = fs::read(&args.atlas).with_context(|| format!("read {}", args.atlas.display()))?;
    let frames = parse_sparrow_xml(&xml)?;
    let sprites = extract_frames(&sheet, &frames)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    for sprite in &sprites {
        let path = args.out_dir.join(frame_file_name(&sprite.name));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &sprite.buffer).with_context(|| format!("write {}", path.display()))?;
    }
    info!(frames = sprites.len(), out_dir = ?args.out_dir, "unpacked atlas");
    Ok(())
}

/// Relative PNG path for a frame name; parent and root components are dropped.
fn frame_file_name(name: &str) -> PathBuf {
    let mut path: PathBuf = Path::new(name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if path.as_os_str().is_empty() {
        path.push("frame");
    }
    let mut file = path.into_os_string();
    file.push(".png");
    PathBuf::from(file)
}

/// Re-compresses sheets by piping them through the `oxipng` binary.
#[derive(Debug, Clone)]
struct OxipngProcess {
    binary: PathBuf,
}

impl Default for OxipngProcess {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("oxipng"),
        }
    }
}

impl Recompressor for OxipngProcess {
    fn recompress(&self, png: &[u8], level: u8) -> spritepack_core::Result<Vec<u8>> {
        let mut child = Command::new(&self.binary)
            .args(["-o", &level.to_string(), "--strip", "all", "--stdout", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PackError::Recompress("oxipng stdin unavailable".into()))?;
        let (written, output) = std::thread::scope(|s| {
            let writer = s.spawn(move || stdin.write_all(png));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PackError::Recompress("oxipng writer panicked".into())),
        }
        let output = output?;
        if !output.status.success() {
            return Err(PackError::Recompress(format!(
                "oxipng exited with {}",
                output.status
            )));
        }
        Ok(output.stdout)
    }
}

fn build_glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_glob_set(include)?;
    let exc_set = build_glob_set(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(p: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Sprite name: path relative to the input root, `/`-separated, without extension.
fn sprite_name(root: &Path, p: &Path) -> String {
    let rel = p.strip_prefix(root).unwrap_or(p);
    let rel = if rel.as_os_str().is_empty() { p } else { rel };
    let stem = rel.with_extension("");
    let name = stem.to_string_lossy().replace('\\', "/");
    if name.is_empty() {
        p.to_string_lossy().into_owned()
    } else {
        name
    }
}

fn load_sprites_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<(Vec<Sprite>, u64)> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    let mut total_bytes = 0u64;
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_sprite(root, p) {
            Ok(sprite) => {
                total_bytes += sprite.buffer.len() as u64;
                list.push(sprite);
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok((list, total_bytes))
}

fn load_sprite(root: &Path, p: &Path) -> anyhow::Result<Sprite> {
    let bytes = fs::read(p).with_context(|| format!("read {}", p.display()))?;
    Ok(Sprite::from_encoded(sprite_name(root, p), bytes)?)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

/// Options file; every field is optional and overrides the matching flag.
///
/// Keys match the `--print-config` output, so a printed config loads back as is.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct YamlConfig {
    padding: Option<u32>,
    power_of_two: Option<bool>,
    trim_transparency: Option<bool>,
    trim_only: Option<Vec<String>>,
    trim_except: Option<Vec<String>>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    output_formats: Option<Vec<String>>,
    allow_rotation: Option<bool>,
    auto_resize: Option<bool>,
    name_mapping: Option<HashMap<String, String>>,
    packing_mode: Option<String>,
    compression_quality: Option<String>,
    image_path: Option<String>,
    sheet_name: Option<String>,
    original_size: Option<u64>,
}

impl YamlConfig {
    fn apply(self, opts: &mut PackingOptions) -> anyhow::Result<()> {
        if let Some(v) = self.padding {
            opts.padding = v;
        }
        if let Some(v) = self.power_of_two {
            opts.power_of_two = v;
        }
        if let Some(v) = self.trim_transparency {
            opts.trim_transparency = v;
        }
        if let Some(v) = self.trim_only {
            opts.trim_only = v;
        }
        if let Some(v) = self.trim_except {
            opts.trim_except = v;
        }
        if let Some(v) = self.max_width {
            opts.max_width = v;
        }
        if let Some(v) = self.max_height {
            opts.max_height = v;
        }
        if let Some(v) = self.output_formats {
            opts.output_formats = v;
        }
        if let Some(v) = self.allow_rotation {
            opts.allow_rotation = v;
        }
        if let Some(v) = self.auto_resize {
            opts.auto_resize = v;
        }
        if let Some(v) = self.name_mapping {
            opts.name_mapping = v;
        }
        if let Some(v) = self.packing_mode {
            opts.packing_mode = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown packing mode: {v}"))?;
        }
        if let Some(v) = self.compression_quality {
            opts.compression_quality = CompressionQuality::parse_or_default(&v);
        }
        if let Some(v) = self.image_path {
            opts.image_path = Some(v);
        }
        if let Some(v) = self.sheet_name {
            opts.sheet_name = v;
        }
        if let Some(v) = self.original_size {
            opts.original_size = Some(v);
        }
        Ok(())
    }
}
