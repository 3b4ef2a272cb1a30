// ============================================================================
// socialsync CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   socialsync photo.png                                   (writes socialsync-image.png)
//   socialsync photo.jpg --filter sepia --brightness 120 -o out.jpeg --quality medium
//   socialsync shots/*.jpg --output-dir processed/ --format png --size pinterest
//   socialsync banner.png --text "Summer Sale" --text "50% off" --text-size 48 --text-color "#FF0000"
//
// Every input goes through a fresh EditingSession: upload, filter controls,
// text layers, then export.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::ExportSize;
use crate::config::{EngineConfig, config_file_path};
use crate::error::EditorResult;
use crate::io::{ExportFormat, ExportOptions, ExportedImage, Quality};
use crate::layers::StyleFilter;
use crate::session::EditingSession;
use crate::state::{FontFamily, HexColor, NEUTRAL_ADJUSTMENT};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// socialsync headless image editor.
///
/// Apply filters and text overlays to images and export them as PNG or JPEG.
#[derive(Parser, Debug)]
#[command(
    name = "socialsync",
    about = "Headless social media image editor",
    long_about = "Apply style filters, brightness/contrast and text overlays to images\n\
                  and export them as PNG or JPEG.\n\n\
                  Example:\n  \
                  socialsync photo.jpg --filter vintage --text \"Hello\" -o post.png\n  \
                  socialsync shots/*.jpg --output-dir out/ --size pinterest"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(required = true, num_args = 1.., value_name = "INPUT")]
    pub inputs: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png or jpeg.
    /// When omitted, the format is inferred from --output's extension, then the config.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Export quality: high, medium, low, or a value in (0, 1].
    #[arg(short, long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Brightness slider, 0–200 (100 = unchanged).
    #[arg(long, default_value_t = NEUTRAL_ADJUSTMENT as i32, value_name = "0-200")]
    pub brightness: i32,

    /// Contrast slider, 0–200 (100 = unchanged).
    #[arg(long, default_value_t = NEUTRAL_ADJUSTMENT as i32, value_name = "0-200")]
    pub contrast: i32,

    /// Style filter: grayscale, sepia, invert, vintage, none.
    #[arg(long, value_name = "FILTER")]
    pub filter: Option<String>,

    /// Text overlay. Repeat for several layers; they stack downwards from the centre.
    #[arg(short, long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// Font size for --text, 8–72.
    #[arg(long, value_name = "PX")]
    pub text_size: Option<u32>,

    /// Text color as #RRGGBB.
    #[arg(long, value_name = "#RRGGBB")]
    pub text_color: Option<String>,

    /// Font family: Arial, "Times New Roman", "Courier New", Georgia, Verdana.
    #[arg(long, value_name = "FAMILY")]
    pub text_font: Option<String>,

    /// Output size: canvas, original, pinterest, or WIDTHxHEIGHT.
    #[arg(long, value_name = "SIZE")]
    pub size: Option<String>,

    /// Pixel density multiplier for canvas-sized exports (1–4).
    #[arg(long, value_name = "RATIO")]
    pub pixel_ratio: Option<f32>,

    /// Configuration file (defaults to $XDG_CONFIG_HOME/socialsync/config.json).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging and per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Per-file edits resolved from the arguments and config.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchJob {
    pub options: ExportOptions,
    pub brightness: i32,
    pub contrast: i32,
    pub filter: Option<StyleFilter>,
    pub texts: Vec<String>,
    pub text_size: u32,
    pub text_color: HexColor,
    pub text_font: FontFamily,
}

impl BatchJob {
    pub fn from_args(args: &CliArgs, config: &EngineConfig) -> EditorResult<Self> {
        let mut options = config.export.options();
        options.format = parse_format(args.format.as_deref(), args.output.as_deref(), config.export.format)?;
        if let Some(q) = &args.quality {
            options.quality = q.parse::<Quality>()?;
        }
        if let Some(size) = &args.size {
            options.size = size.parse::<ExportSize>()?;
        }
        if let Some(ratio) = args.pixel_ratio {
            options.pixel_ratio = ratio;
        }

        let filter = match &args.filter {
            Some(name) => StyleFilter::parse(name)?,
            None => None,
        };
        let text_color = match &args.text_color {
            Some(c) => c.parse::<HexColor>()?,
            None => config.text.color,
        };
        let text_font = match &args.text_font {
            Some(f) => f.parse::<FontFamily>()?,
            None => config.text.font,
        };

        Ok(Self {
            options,
            brightness: args.brightness,
            contrast: args.contrast,
            filter,
            texts: args.text.clone(),
            text_size: args.text_size.unwrap_or(config.text.size),
            text_color,
            text_font,
        })
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let (mut config, ignored) = match &args.config {
        Some(path) => match EngineConfig::load_from(path) {
            Ok(c) => (c, None),
            Err(e) => {
                eprintln!("error: could not load config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::load_or_default(&config_file_path()),
    };
    if args.verbose {
        config.logging.level = "debug".to_string();
    }
    crate::logger::init(&config.logging);
    // Reported only now so it reaches the subscriber
    if let Some(e) = ignored {
        tracing::warn!("Ignoring config at {}: {}", config_file_path().display(), e);
    }

    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.inputs);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir
    if inputs.len() > 1 && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given; use --output-dir to specify a destination\n\
             directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let job = match BatchJob::from_args(&args, &config) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();
        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            &config.export.file_prefix,
            job.options.format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, &config, &job) {
            Ok(exported) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({}x{}, {:.0}ms)",
                        output_path.display(),
                        exported.width,
                        exported.height,
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

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(input: &Path, output: &Path, config: &EngineConfig, job: &BatchJob) -> EditorResult<ExportedImage> {
    // -- Step 1: Upload --------------------------------------------------
    let bytes = std::fs::read(input)?;
    let mut session = EditingSession::new(config.clone())?;
    session.upload(mime_for_path(input), &bytes)?;

    // -- Step 2: Filter controls -----------------------------------------
    session.select_filter(job.filter)?;
    session.set_brightness(job.brightness)?;
    session.set_contrast(job.contrast)?;

    // -- Step 3: Text layers ---------------------------------------------
    session.set_text_size(job.text_size)?;
    session.set_text_color(&job.text_color.to_string())?;
    session.set_text_font(job.text_font.name())?;
    let (cx, cy) = session.scene().center();
    let line_height = job.text_size as f32 * 1.5;
    for (i, text) in job.texts.iter().enumerate() {
        session.set_pending_text(text.as_str());
        session.add_text_at(cx, cy + i as f32 * line_height)?;
    }

    // -- Step 4: Export --------------------------------------------------
    let exported = session.export(&job.options)?;
    std::fs::write(output, &exported.bytes)?;
    Ok(exported)
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
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
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

/// Declared MIME type for a file, from its extension.
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Choose the [`ExportFormat`] from the `--format` string or infer it from the
/// output file extension. Falls back to `default` when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>, default: ExportFormat) -> EditorResult<ExportFormat> {
    if let Some(f) = format_arg {
        return f.parse();
    }

    let inferred = output
        .and_then(|out| out.extension())
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<ExportFormat>().ok());
    Ok(inferred.unwrap_or(default))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: `<prefix>-image.<ext>` in the current directory
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    prefix: &str,
    format: ExportFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    if let Some(dir) = output_dir {
        let stem = input.file_stem()?.to_string_lossy().into_owned();
        return Some(dir.join(format!("{}.{}", stem, format.extension())));
    }

    Some(PathBuf::from(crate::io::export_file_name(prefix, format)))
}
