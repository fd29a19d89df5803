// ============================================================================
// NinePatchFE CLI: headless nine-patch export and icon batch tools
// ============================================================================
//
// Usage examples:
//   ninepatchfe --input button.png                              (guide-border button.9.png)
//   ninepatchfe -i button.png --mode compiled --stretch-x 12,52 --pad-x 8,56
//   ninepatchfe -i "ui/*.png" --mode guides --output-dir out/ --format tga
//   ninepatchfe -i button.9.png --mode inspect
//   ninepatchfe -i panel.png --mode stretch --target 400x120
//   ninepatchfe -i "icons/*.png" --mode resize --size 64 --output-dir small/
//   ninepatchfe -i "icons/*.png" --mode tint --color "#ff8800" --opacity 0.4
//   ninepatchfe -i "icons/*.png" --mode background --background bg.png --icon-scale 0.6
//   ninepatchfe -i "icons/*.png" --mode batch --background bg.png --invert --color "#0066ff"
//
// No GUI is opened in CLI mode. Everything runs synchronously on the current
// thread.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use image::RgbaImage;

use crate::codec::{self, MetadataBlock};
use crate::geometry::GeometryModel;
use crate::io::{self, SaveFormat};
use crate::ops::compositor::{self, Interpolation};
use crate::ops::export::{self, ExportMode};
use crate::ops::icon_tools::{self, BackgroundOptions, TintOptions};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Write the guide-border `.9.png` (1-pixel border with black guides).
    Guides,
    /// Write a compiled `.9.png` carrying an npTc chunk.
    Compiled,
    /// Print the chunk list and nine-patch record of a PNG.
    Inspect,
    /// Render the nine-slice stretch to a target size.
    Stretch,
    /// Fit into a transparent square.
    Resize,
    /// Overlay a flat colour on the visible content.
    Tint,
    /// Composite each icon onto a 192px background.
    Background,
    /// Background, invert and scale, then a colour overlay (default opacity 0.4).
    Batch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<FilterArg> for Interpolation {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::Nearest  => Interpolation::Nearest,
            FilterArg::Bilinear => Interpolation::Bilinear,
            FilterArg::Bicubic  => Interpolation::Bicubic,
            FilterArg::Lanczos3 => Interpolation::Lanczos3,
        }
    }
}

/// NinePatchFE headless processor.
#[derive(Parser, Debug)]
#[command(
    name = "ninepatchfe",
    about = "NinePatchFE headless nine-patch exporter and icon batch tool",
    long_about = "Export Android-style nine-patch images and run simple icon batch\n\
                  operations without opening the GUI.\n\n\
                  Example:\n  \
                  ninepatchfe --input button.png --mode compiled --stretch-x 12,52\n  \
                  ninepatchfe -i \"icons/*.png\" --mode resize --size 64 --output-dir out/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "ui/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// What to do with each input.
    #[arg(short, long, value_enum, default_value_t = Mode::Guides)]
    pub mode: Mode,

    /// Horizontal stretch span as START,END image pixels (default 30%..70%).
    #[arg(long, value_name = "A,B")]
    pub stretch_x: Option<String>,

    /// Vertical stretch span as START,END (default 30%..70%).
    #[arg(long, value_name = "A,B")]
    pub stretch_y: Option<String>,

    /// Horizontal content span as START,END (default 10%..90%).
    #[arg(long, value_name = "A,B")]
    pub pad_x: Option<String>,

    /// Vertical content span as START,END (default 10%..90%).
    #[arg(long, value_name = "A,B")]
    pub pad_y: Option<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, bmp, tga. Compiled output is always png.
    /// When omitted, inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Edge length for --mode resize.
    #[arg(long, default_value_t = 128)]
    pub size: u32,

    /// Target WIDTHxHEIGHT for --mode stretch.
    #[arg(long, value_name = "WxH")]
    pub target: Option<String>,

    /// Overlay colour for --mode tint and batch.
    #[arg(long, default_value = "#0066ff")]
    pub color: String,

    /// Overlay opacity for --mode tint (default 0.5) and batch (default 0.4).
    #[arg(long, value_name = "0..1")]
    pub opacity: Option<f32>,

    /// Background image for --mode background and batch.
    #[arg(long, value_name = "FILE")]
    pub background: Option<PathBuf>,

    /// Icon size relative to the background (above 1 crops).
    #[arg(long, default_value_t = 1.0)]
    pub icon_scale: f32,

    /// Fill the icon square instead of letterboxing.
    #[arg(long)]
    pub cover: bool,

    /// Invert icon colours before compositing.
    #[arg(long)]
    pub invert: bool,

    /// Resampling filter.
    #[arg(long, value_enum, default_value_t = FilterArg::Bilinear)]
    pub filter: FilterArg,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Settings resolved once before the per-file loop.
struct Job {
    mode: Mode,
    format: SaveFormat,
    interpolation: Interpolation,
    guides: GuideArgs,
    target: Option<(u32, u32)>,
    tint: [u8; 3],
    background: Option<RgbaImage>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct GuideArgs {
    stretch_x: Option<(i64, i64)>,
    stretch_y: Option<(i64, i64)>,
    pad_x: Option<(i64, i64)>,
    pad_y: Option<(i64, i64)>,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo(args.verbose);
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let job = match prepare_job(&args) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    crate::log_info!("{} input(s), mode {:?}, filter {:?}", total, job.mode, job.interpolation);

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        if job.mode == Mode::Inspect {
            match inspect(input_path) {
                Ok(report) => print!("{}", report),
                Err(e) => {
                    eprintln!("  error: {}", e);
                    any_failure = true;
                }
            }
            continue;
        }

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            job.mode,
            job.format,
        ) else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &job, &args) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn prepare_job(args: &CliArgs) -> Result<Job, String> {
    let guides = GuideArgs {
        stretch_x: args.stretch_x.as_deref().map(parse_span).transpose()?,
        stretch_y: args.stretch_y.as_deref().map(parse_span).transpose()?,
        pad_x: args.pad_x.as_deref().map(parse_span).transpose()?,
        pad_y: args.pad_y.as_deref().map(parse_span).transpose()?,
    };
    let format = match args.mode {
        Mode::Compiled => SaveFormat::Png,
        _ => parse_format(args.format.as_deref(), args.output.as_deref())?,
    };
    let target = match (args.mode, args.target.as_deref()) {
        (Mode::Stretch, None) => return Err("--mode stretch needs --target WxH".to_string()),
        (_, Some(t)) => Some(parse_size(t)?),
        (_, None) => None,
    };
    let tint = icon_tools::parse_hex_color(&args.color)?;
    let background = match (args.mode, &args.background) {
        (Mode::Background | Mode::Batch, None) => {
            return Err("--mode background/batch needs --background FILE".to_string());
        }
        (Mode::Background | Mode::Batch, Some(path)) => Some(io::load_source(path)?),
        _ => None,
    };
    Ok(Job {
        mode: args.mode,
        format,
        interpolation: args.filter.into(),
        guides,
        target,
        tint,
        background,
    })
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, job: &Job, args: &CliArgs) -> Result<(), String> {
    let source = io::load_source(input).map_err(|e| format!("load failed: {}", e))?;

    let bytes = match job.mode {
        Mode::Guides | Mode::Compiled => {
            let geometry = build_geometry(source.width(), source.height(), &job.guides);
            let mode = if job.mode == Mode::Compiled { ExportMode::Compiled } else { ExportMode::GuideBorder };
            export::export(Some(&source), Some(&geometry), mode, job.format).map_err(|e| e.to_string())?
        }
        Mode::Stretch => {
            let geometry = build_geometry(source.width(), source.height(), &job.guides);
            let (tw, th) = job.target.unwrap_or(source.dimensions());
            let out = compositor::compose_to_size(&source, &geometry, tw, th, job.interpolation);
            io::encode_image(&out, job.format)?
        }
        Mode::Resize => {
            let out = icon_tools::resize_contain(&source, args.size, job.interpolation);
            io::encode_image(&out, job.format)?
        }
        Mode::Tint => {
            let out = icon_tools::tint(&source, job.tint, args.opacity.unwrap_or(0.5));
            io::encode_image(&out, job.format)?
        }
        Mode::Background | Mode::Batch => {
            let background = job
                .background
                .as_ref()
                .ok_or_else(|| "no background image loaded".to_string())?;
            let tint = (job.mode == Mode::Batch).then(|| TintOptions {
                rgb: job.tint,
                opacity: args.opacity.unwrap_or(icon_tools::BATCH_TINT_OPACITY),
            });
            let options = BackgroundOptions {
                scale: args.icon_scale,
                cover: args.cover,
                invert: args.invert,
                tint,
                interpolation: job.interpolation,
            };
            let out = icon_tools::add_background(&source, background, &options);
            io::encode_image(&out, job.format)?
        }
        Mode::Inspect => return Err("inspect does not write files".to_string()),
    };

    io::write_bytes(output, &bytes).map_err(|e| format!("save failed: {}", e))
}

/// Chunk list plus the decoded record, if any.
fn inspect(input: &Path) -> Result<String, String> {
    let bytes = std::fs::read(input).map_err(|e| format!("read failed: {}", e))?;
    let chunks = codec::extract_chunks(&bytes).map_err(|e| e.to_string())?;
    let (w, h) = codec::ihdr_dimensions(&chunks).map_err(|e| e.to_string())?;

    let mut report = format!("  {}x{} px, {} chunks:", w, h, chunks.len());
    for chunk in &chunks {
        report.push_str(&format!(" {}({})", chunk.name, chunk.data.len()));
    }
    report.push('\n');

    match codec::read_metadata(&bytes).map_err(|e| e.to_string())? {
        Some(block) => report.push_str(&describe_record(&block, w, h)),
        None => report.push_str("  no nine-patch record\n"),
    }
    Ok(report)
}

fn describe_record(block: &MetadataBlock, w: u32, h: u32) -> String {
    let g = GeometryModel::from_metadata(w, h, block);
    format!(
        "  stretch x {}..{} (insets {}/{})\n  stretch y {}..{} (insets {}/{})\n  padding {}/{}/{}/{} (l/r/t/b)\n",
        g.h_stretch().start,
        g.h_stretch().end,
        block.stretch_left,
        block.stretch_right,
        g.v_stretch().start,
        g.v_stretch().end,
        block.stretch_top,
        block.stretch_bottom,
        block.pad_left,
        block.pad_right,
        block.pad_top,
        block.pad_bottom,
    )
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// `"40,60"` -> `(40, 60)`. Values are clamped later against the image.
fn parse_span(s: &str) -> Result<(i64, i64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected START,END but got '{}'", s))?;
    let a = a.trim().parse::<i64>().map_err(|_| format!("bad start in '{}'", s))?;
    let b = b.trim().parse::<i64>().map_err(|_| format!("bad end in '{}'", s))?;
    Ok((a, b))
}

/// `"400x120"` -> `(400, 120)`.
fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .to_lowercase()
        .split_once('x')
        .map(|(w, h)| (w.trim().to_string(), h.trim().to_string()))
        .ok_or_else(|| format!("expected WIDTHxHEIGHT but got '{}'", s))?;
    let w = w.parse::<u32>().map_err(|_| format!("bad width in '{}'", s))?;
    let h = h.parse::<u32>().map_err(|_| format!("bad height in '{}'", s))?;
    if w == 0 || h == 0 {
        return Err(format!("target size must be non-zero: '{}'", s));
    }
    Ok((w, h))
}

/// Default guides with any explicit spans applied (and clamped).
fn build_geometry(width: u32, height: u32, guides: &GuideArgs) -> GeometryModel {
    let mut g = GeometryModel::new(width, height);
    if let Some((a, b)) = guides.stretch_x {
        g.set_stretch_x(a, b);
    }
    if let Some((a, b)) = guides.stretch_y {
        g.set_stretch_y(a, b);
    }
    if let Some((a, b)) = guides.pad_x {
        g.set_pad_x(a, b);
    }
    if let Some((a, b)) = guides.pad_y {
        g.set_pad_y(a, b);
    }
    g
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> Result<SaveFormat, String> {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f)
            .ok_or_else(|| format!("unsupported format '{}' (use png, bmp or tga)", f));
    }
    Ok(output.map(SaveFormat::from_path).unwrap_or_default())
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input name)
/// 3. Fallback: next to the input
///    (nine-patch modes use the `.9.<ext>` convention; other modes append
///    `_out` when the name would collide with the input)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    mode: Mode,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let file_name = match mode {
        Mode::Guides | Mode::Compiled => {
            export::nine_patch_file_name(&input.file_name()?.to_string_lossy(), ext)
        }
        _ => format!("{}.{}", input.file_stem()?.to_string_lossy(), ext),
    };

    if let Some(dir) = output_dir {
        return Some(dir.join(file_name));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(&file_name);
    if candidate == input {
        let stem = input.file_stem()?.to_string_lossy().into_owned();
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Guide;

    #[test]
    fn spans_and_sizes_parse() {
        assert_eq!(parse_span("40,60"), Ok((40, 60)));
        assert_eq!(parse_span(" -5 , 900 "), Ok((-5, 900)));
        assert!(parse_span("40").is_err());
        assert!(parse_span("a,b").is_err());
        assert_eq!(parse_size("400x120"), Ok((400, 120)));
        assert_eq!(parse_size("64X64"), Ok((64, 64)));
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("big").is_err());
    }

    #[test]
    fn explicit_spans_are_clamped() {
        let guides = GuideArgs {
            stretch_x: Some((40, 60)),
            pad_y: Some((-20, 500)),
            ..Default::default()
        };
        let g = build_geometry(100, 100, &guides);
        assert_eq!(g.h_stretch(), Guide { start: 40, end: 60 });
        assert_eq!(g.v_stretch(), Guide { start: 30, end: 70 });
        assert_eq!(g.v_pad(), Guide { start: 0, end: 100 });
    }

    #[test]
    fn output_paths_follow_mode() {
        let input = Path::new("ui/button.png");
        assert_eq!(
            build_output_path(input, None, None, Mode::Guides, SaveFormat::Png),
            Some(PathBuf::from("ui/button.9.png"))
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), Mode::Compiled, SaveFormat::Png),
            Some(PathBuf::from("out/button.9.png"))
        );
        assert_eq!(
            build_output_path(input, None, None, Mode::Resize, SaveFormat::Png),
            Some(PathBuf::from("ui/button_out.png"))
        );
        assert_eq!(
            build_output_path(input, None, None, Mode::Tint, SaveFormat::Tga),
            Some(PathBuf::from("ui/button.tga"))
        );
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), None, Mode::Guides, SaveFormat::Png),
            Some(PathBuf::from("x.png"))
        );
    }

    #[test]
    fn formats_resolve_from_flag_or_output() {
        assert_eq!(parse_format(Some("TGA"), None), Ok(SaveFormat::Tga));
        assert!(parse_format(Some("jpeg"), None).is_err());
        assert_eq!(parse_format(None, Some(Path::new("a.bmp"))), Ok(SaveFormat::Bmp));
        assert_eq!(parse_format(None, None), Ok(SaveFormat::Png));
    }

    #[test]
    fn clap_accepts_the_documented_flags() {
        let args = CliArgs::try_parse_from([
            "ninepatchfe", "-i", "a.png", "b.png", "--mode", "compiled", "--stretch-x", "1,2",
            "--output-dir", "out", "--filter", "lanczos3",
        ])
        .unwrap();
        assert_eq!(args.input, vec!["a.png", "b.png"]);
        assert_eq!(args.mode, Mode::Compiled);
        assert_eq!(args.stretch_x.as_deref(), Some("1,2"));
        assert_eq!(args.filter, FilterArg::Lanczos3);

        assert!(CliArgs::try_parse_from(["ninepatchfe"]).is_err());
    }

    #[test]
    fn stretch_and_background_need_their_inputs() {
        let args = CliArgs::try_parse_from(["ninepatchfe", "-i", "a.png", "--mode", "stretch"]).unwrap();
        assert!(prepare_job(&args).is_err());
        let args = CliArgs::try_parse_from(["ninepatchfe", "-i", "a.png", "--mode", "background"]).unwrap();
        assert!(prepare_job(&args).is_err());
        let args = CliArgs::try_parse_from(["ninepatchfe", "-i", "a.png", "--mode", "batch"]).unwrap();
        assert!(prepare_job(&args).is_err());
        let args = CliArgs::try_parse_from(["ninepatchfe", "-i", "a.png", "--color", "nope"]).unwrap();
        assert!(prepare_job(&args).is_err());
    }

    #[test]
    fn inspect_reports_the_record() {
        let block = MetadataBlock {
            stretch_left: 40,
            stretch_right: 40,
            stretch_top: 40,
            stretch_bottom: 40,
            pad_left: 10,
            pad_right: 10,
            pad_top: 10,
            pad_bottom: 10,
        };
        let text = describe_record(&block, 100, 100);
        assert!(text.contains("stretch x 40..60"));
        assert!(text.contains("padding 10/10/10/10"));
    }
}
