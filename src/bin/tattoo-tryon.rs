use std::fmt;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};

use tattoo_tryon::compose::{BlendMode, OverlayStyle};
use tattoo_tryon::keying::{CONTRAST_RANGE, DEFAULT_CONTRAST, DEFAULT_TOLERANCE};
use tattoo_tryon::{
    render_preview, save_png, upload, FailureKind, Operation, ProcessOptions, ProcessResult,
    StencilEngine, Trace, Transform,
};

#[derive(Parser)]
#[command(
    name = "tattoo-tryon",
    about = "Prepare generated tattoo images and preview them with gesture transforms",
    version,
    after_help = "Simple usage: tattoo-tryon remove-bg <image>  (writes <image>_keyed.png)\n\n\
                  Logging follows RUST_LOG; --verbose and --quiet change the default level."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Make the near-white background of an image (or directory) transparent
    RemoveBg {
        #[command(flatten)]
        io: InputOutput,

        /// Per-channel tolerance below 255 still counted as white
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: u8,

        /// Write output even when no background pixel was found
        #[arg(short, long)]
        force: bool,
    },

    /// Adjust stencil contrast (50-250%) and flatten onto white
    Contrast {
        #[command(flatten)]
        io: InputOutput,

        /// Contrast in percent
        #[arg(short, long, default_value_t = DEFAULT_CONTRAST)]
        percent: u32,
    },

    /// Composite a tattoo onto a photo or camera frame
    Preview(PreviewArgs),

    /// Show the user-facing message for a generation failure text
    ExplainError {
        /// Raw failure text
        text: String,
    },
}

#[derive(Args)]
struct InputOutput {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PreviewArgs {
    /// Tattoo image to overlay
    overlay: PathBuf,

    /// Background photo or camera frame
    frame: PathBuf,

    /// Output PNG (default: {frame}_preview.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replay a recorded touch session to obtain the transform
    #[arg(long, conflicts_with_all = ["translate_x", "translate_y", "scale", "rotate"])]
    trace: Option<PathBuf>,

    /// Horizontal translation in pixels
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    translate_x: f64,

    /// Vertical translation in pixels
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    translate_y: f64,

    /// Uniform scale
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Rotation in degrees, clockwise
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate: f64,

    /// Overlay opacity (0.0-1.0)
    #[arg(long, default_value_t = 0.85)]
    opacity: f64,

    /// How overlay colors combine with the frame
    #[arg(long, value_enum, default_value_t = Blend::Multiply)]
    blend: Blend,

    /// Keep the overlay's white background instead of keying it out
    #[arg(long)]
    no_key: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Blend {
    Normal,
    Multiply,
}

impl From<Blend> for BlendMode {
    fn from(b: Blend) -> Self {
        match b {
            Blend::Normal => BlendMode::Normal,
            Blend::Multiply => BlendMode::Multiply,
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        fail("Cannot specify both --verbose and --quiet");
    }
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::RemoveBg {
            io,
            tolerance,
            force,
        } => {
            let opts = ProcessOptions {
                force,
                verbose: cli.verbose,
                quiet: cli.quiet,
            };
            run_batch(Operation::RemoveBackground { tolerance }, &io, &opts);
        }
        Command::Contrast { io, percent } => {
            if !CONTRAST_RANGE.contains(&percent) {
                fail("Contrast must be between 50 and 250 percent");
            }
            let opts = ProcessOptions {
                force: false,
                verbose: cli.verbose,
                quiet: cli.quiet,
            };
            run_batch(Operation::Contrast { percent }, &io, &opts);
        }
        Command::Preview(args) => run_preview(&args),
        Command::ExplainError { text } => {
            let kind = FailureKind::classify(&text);
            println!("[{kind}] {}", kind.user_message());
        }
    }
}

fn run_batch(operation: Operation, io: &InputOutput, opts: &ProcessOptions) {
    let engine = match StencilEngine::new(operation) {
        Ok(e) => e,
        Err(e) => fail(&e.to_string()),
    };

    let input_path = io.input.as_path();
    if !input_path.exists() {
        fail(&format!("Input path does not exist: {}", input_path.display()));
    }

    let results = if input_path.is_dir() {
        let Some(output_dir) = &io.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: tattoo-tryon <command> <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(input_path, output_dir, opts)
    } else {
        let output_path = io
            .output
            .clone()
            .unwrap_or_else(|| operation.default_output(input_path));
        vec![engine.process_file(input_path, &output_path, opts)]
    };

    let mut tally = Tally::default();
    for r in &results {
        report(r, opts);
        tally.record(r);
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!("\n{tally}");
    }

    if tally.failed > 0 {
        process::exit(1);
    }
}

/// Per-batch outcome counts.
#[derive(Default)]
struct Tally {
    written: usize,
    skipped: usize,
    failed: usize,
    keyed_pixels: usize,
}

impl Tally {
    fn record(&mut self, result: &ProcessResult) {
        if result.skipped {
            self.skipped += 1;
        } else if result.success {
            self.written += 1;
            self.keyed_pixels += result.keyed_pixels;
        } else {
            self.failed += 1;
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Summary] {} written", self.written)?;
        if self.keyed_pixels > 0 {
            write!(f, " ({} pixels keyed)", self.keyed_pixels)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        let total = self.written + self.skipped + self.failed;
        write!(f, " of {total}")
    }
}

fn load_transform(args: &PreviewArgs) -> Transform {
    if let Some(path) = &args.trace {
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|e| fail(&format!("Failed to read trace {}: {e}", path.display())));
        let trace: Trace = text.parse().unwrap_or_else(|e| fail(&format!("{e}")));
        debug!("replaying {} touch event(s)", trace.events.len());
        trace.replay()
    } else {
        Transform {
            translate_x: args.translate_x,
            translate_y: args.translate_y,
            scale: args.scale,
            rotation: args.rotate,
        }
    }
}

fn run_preview(args: &PreviewArgs) {
    if !(0.0..=1.0).contains(&args.opacity) {
        fail("Opacity must be between 0.0 and 1.0");
    }

    let transform = load_transform(args);
    info!("overlay transform: {transform}");

    let open = |path: &Path| {
        image::open(path).unwrap_or_else(|e| {
            debug!("{}: {e}", path.display());
            fail(&format!(
                "{}: {}",
                path.display(),
                FailureKind::CorruptImage.user_message()
            ))
        })
    };
    let overlay = open(&args.overlay).to_rgba8();
    let frame = open(&args.frame).to_rgb8();

    let style = OverlayStyle {
        opacity: args.opacity,
        blend: args.blend.into(),
    };
    let key = (!args.no_key).then_some(DEFAULT_TOLERANCE);

    let preview = match render_preview(&frame, &overlay, &transform, &style, key) {
        Ok(p) => p,
        Err(e) => fail(&e.to_string()),
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| upload::default_output_path(&args.frame, "preview"));
    if let Err(e) = save_png(&image::DynamicImage::ImageRgb8(preview), &output) {
        fail(&format!("Failed to save: {e}"));
    }
    info!("preview written to {}", output.display());
}

fn report(result: &ProcessResult, opts: &ProcessOptions) {
    let name = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().into_owned(),
    );

    match (result.success, result.skipped) {
        (false, _) => {
            eprintln!("[FAIL] {name}: {}", result.message);
            if opts.verbose {
                eprintln!("  cause: {}", result.detail);
            }
        }
        _ if opts.quiet => {}
        (true, true) => eprintln!("[SKIP] {name}: {}", result.message),
        (true, false) => eprintln!("[OK] {name}: {}", result.message),
    }
}
