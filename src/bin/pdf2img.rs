//! CLI binary for pdf2img.
//!
//! A thin shim over the library crate: `serve` runs the HTTP front end,
//! `convert` writes one artifact to disk, `inspect` prints metadata.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img::config::{DEFAULT_DPI, MAX_DPI, MIN_DPI};
use pdf2img::pipeline::input::source_name_for;
use pdf2img::server::{run_server, ServerConfig};
use pdf2img::{
    convert_to_dir, inspect, ConversionConfig, ConversionProgressCallback, ConversionRequest,
    OutputFormat, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the PDF loads, then a bar
/// that advances once per rendered page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// When the previous page finished, for per-page timings.
    last_page: Mutex<Instant>,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            last_page: Mutex::new(Instant::now()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Rendering");
        self.bar.reset_eta();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        if let Ok(mut last) = self.last_page.lock() {
            *last = Instant::now();
        }
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Rendering {total_pages} pages…"))
        ));
    }

    fn on_page_rendered(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let elapsed_ms = match self.last_page.lock() {
            Ok(mut last) => {
                let ms = last.elapsed().as_millis();
                *last = Instant::now();
                ms
            }
            Err(_) => 0,
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&format!("{:>7} KiB", bytes / 1024)),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, artifact_name: &str, artifact_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} packaged {} {}",
            green("✔"),
            bold(artifact_name),
            dim(&format!("({} KiB)", artifact_bytes / 1024)),
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the upload service on port 5000
  pdf2img serve

  # Single-page PDF → report.png in the current directory
  pdf2img convert report.pdf

  # Multi-page deck → out/deck_images.zip of JPEGs at 150 DPI
  pdf2img convert deck.pdf -o out --format jpg --dpi 150

  # Always produce a ZIP, even for one page
  pdf2img convert scan.pdf --zip

  # Convert from URL
  pdf2img convert https://example.com/paper.pdf --format svg

  # Print PDF metadata as JSON
  pdf2img inspect report.pdf --json

ENVIRONMENT VARIABLES:
  PDF2IMG_HOST, PDF2IMG_PORT   Server bind address
  PDF2IMG_DPI, PDF2IMG_FORMAT  Defaults for conversions
  PDF2IMG_MAX_UPLOAD_MB        Largest accepted upload
  PDFIUM_LIB_PATH              Path to libpdfium (file or directory)
  RUST_LOG                     Overrides the log filter
"#;

/// Convert PDF pages to PNG, JPEG or SVG images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Convert PDF pages to PNG, JPEG or SVG images",
    long_about = "Render every page of a PDF to an image. One-page documents produce a single \
image; longer documents produce a ZIP archive with one image per page. Run as an HTTP \
upload service with `serve` or convert local files and URLs directly.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP upload service.
    Serve(ServeArgs),
    /// Convert a local PDF or URL and write the artifact to disk.
    Convert(ConvertArgs),
    /// Print PDF metadata without rendering.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "PDF2IMG_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PDF2IMG_PORT", default_value_t = 5000)]
    port: u16,

    /// DPI used when a request omits `dpi`.
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(MIN_DPI as i64..=MAX_DPI as i64))]
    default_dpi: u32,

    /// Format used when a request omits `format`: png, jpg, svg.
    #[arg(long, env = "PDF2IMG_FORMAT", default_value = "png", value_parser = parse_format)]
    default_format: OutputFormat,

    /// Largest accepted upload in MiB.
    #[arg(long, env = "PDF2IMG_MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,

    #[command(flatten)]
    render: RenderArgs,
}

/// Rendering limits shared by `serve` and `convert`.
#[derive(Args, Debug)]
struct RenderArgs {
    /// Cap on the longest rendered edge, in pixels.
    #[arg(long, env = "PDF2IMG_MAX_RENDERED_PIXELS", default_value_t = 10_000)]
    max_rendered_pixels: u32,

    /// JPEG quality (1–100).
    #[arg(long, env = "PDF2IMG_JPEG_QUALITY", default_value_t = 90)]
    jpeg_quality: u8,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "PDF2IMG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write the artifact into.
    #[arg(short, long, env = "PDF2IMG_OUTPUT_DIR", default_value = ".")]
    output: PathBuf,

    /// Output format: png, jpg, svg.
    #[arg(short, long, env = "PDF2IMG_FORMAT", default_value = "png", value_parser = parse_format)]
    format: OutputFormat,

    /// Rendering DPI (36–600).
    #[arg(long, env = "PDF2IMG_DPI", default_value_t = DEFAULT_DPI,
          value_parser = clap::value_parser!(u32).range(MIN_DPI as i64..=MAX_DPI as i64))]
    dpi: u32,

    /// Produce a ZIP archive even for a single-page document.
    #[arg(long, env = "PDF2IMG_ZIP")]
    zip: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Print metadata as JSON.
    #[arg(long)]
    json: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "PDF2IMG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse::<OutputFormat>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs during `convert`.
    let show_progress = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Convert(args) => run_convert(args, show_progress, cli.quiet).await,
        Command::Inspect(args) => run_inspect(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        default_dpi: args.default_dpi,
        default_format: args.default_format,
        max_upload_bytes: args.max_upload_mb.saturating_mul(1024 * 1024),
        conversion: build_config(&args.render, None)?,
    };

    run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("Server failed")
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&args.render, progress_cb)?;

    let mut builder = ConversionRequest::builder(source_name_for(&args.input))
        .format(args.format)
        .dpi(args.dpi)
        .force_zip(args.zip);
    if let Some(pwd) = args.password {
        builder = builder.password(pwd);
    }
    let request = builder.build().context("Invalid conversion options")?;

    let (path, stats) = convert_to_dir(&args.input, &args.output, &request, &config)
        .await
        .context("Conversion failed")?;

    if !quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            stats.page_count,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let config = ConversionConfig::builder()
        .download_timeout_secs(args.download_timeout)
        .build()
        .context("Invalid configuration")?;
    let meta = inspect(&args.input, args.password.as_deref(), &config)
        .await
        .context("Failed to inspect PDF")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
        );
        return Ok(());
    }

    println!("File:         {}", args.input);
    if let Some(ref t) = meta.title {
        println!("Title:        {}", t);
    }
    if let Some(ref a) = meta.author {
        println!("Author:       {}", a);
    }
    if let Some(ref s) = meta.subject {
        println!("Subject:      {}", s);
    }
    println!("Pages:        {}", meta.page_count);
    println!("PDF Version:  {}", meta.pdf_version);
    if let Some(ref p) = meta.producer {
        println!("Producer:     {}", p);
    }
    if let Some(ref c) = meta.creator {
        println!("Creator:      {}", c);
    }
    Ok(())
}

/// Map CLI render args to `ConversionConfig`.
fn build_config(args: &RenderArgs, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_rendered_pixels(args.max_rendered_pixels)
        .jpeg_quality(args.jpeg_quality)
        .download_timeout_secs(args.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
