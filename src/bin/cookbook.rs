//! CLI binary for paprika-cookbook.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `CookbookConfig`, publishes the cookbook and prints where it went.
//! With `--serve ADDR` it runs the upload-form web service instead.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use paprika_cookbook::{
    inspect, publish, ConversionProgressCallback, CookbookConfig, PdfEngine, ProgressCallback,
    PublishedCookbook, SortOrder, DEFAULT_AUTHOR,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Live progress bar over archive records, with a log line for each
/// skipped record.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` reports the record count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening archive…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} recipes  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_records: usize) {
        self.activate_bar(total_records);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_records} recipes…"))
        ));
    }

    fn on_record_start(&self, _index: usize, _total: usize, entry: &str) {
        self.bar.set_message(entry.to_string());
    }

    fn on_record_complete(&self, _index: usize, _total: usize, _name: &str) {
        self.bar.inc(1);
    }

    fn on_record_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Record {:>4}/{:<4}  {}",
            red("✗"),
            index,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_records: usize, success_count: usize) {
        let failed = total_records.saturating_sub(success_count);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} recipes read",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} recipes read  ({} skipped)",
                cyan("⚠"),
                bold(&success_count.to_string()),
                total_records,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # HTML + PDF into the current directory
  cookbook Export.paprikarecipes --name "Grandma Rose"

  # HTML only, into ./out
  cookbook Export.paprikarecipes --html-only -o out

  # Use wkhtmltopdf instead of WeasyPrint
  cookbook Export.paprikarecipes --engine wkhtmltopdf

  # Any other renderer; {input} and {output} are substituted
  cookbook Export.paprikarecipes --pdf-command "prince {input} -o {output}"

  # List archive contents without decoding
  cookbook --inspect-only Export.paprikarecipes

  # Run the upload form on port 5000
  cookbook --serve 0.0.0.0:5000

PDF ENGINES:
  weasyprint   (default) full paged-media support, TOC page numbers
  wkhtmltopdf  fast, no TOC page numbers
  chromium     headless Chrome/Chromium print-to-pdf
  none         HTML only

ENVIRONMENT VARIABLES:
  Every flag can also be set as COOKBOOK_<FLAG>, e.g. COOKBOOK_NAME,
  COOKBOOK_ENGINE, COOKBOOK_OUTPUT_DIR. RUST_LOG overrides log levels.
"#;

/// Turn a Paprika recipe export into a printable HTML and PDF cookbook.
#[derive(Parser, Debug)]
#[command(
    name = "cookbook",
    version,
    about = "Turn a Paprika recipe export into a printable HTML and PDF cookbook",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// `.paprikarecipes` file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "serve")]
    input: Option<String>,

    /// Directory for `Cookbook_{id}.html` / `.pdf`
    /// (default: current dir; system temp dir with --serve).
    #[arg(short, long = "output-dir", env = "COOKBOOK_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Name printed on the cover.
    #[arg(long, env = "COOKBOOK_NAME", default_value = DEFAULT_AUTHOR)]
    name: String,

    /// PDF engine: weasyprint, wkhtmltopdf, chromium, none.
    #[arg(long, env = "COOKBOOK_ENGINE", default_value = "weasyprint")]
    engine: String,

    /// Custom renderer command line; overrides --engine.
    #[arg(long, env = "COOKBOOK_PDF_COMMAND")]
    pdf_command: Option<String>,

    /// Kill the PDF renderer after this many seconds.
    #[arg(long, env = "COOKBOOK_RENDER_TIMEOUT", default_value_t = 300)]
    render_timeout: u64,

    /// Skip the PDF; write HTML only.
    #[arg(long, env = "COOKBOOK_HTML_ONLY")]
    html_only: bool,

    /// Downscale photos wider than this (64–4000 px).
    #[arg(long, env = "COOKBOOK_MAX_IMAGE_WIDTH", default_value_t = 600,
          value_parser = clap::value_parser!(u32).range(64..=4000))]
    max_image_width: u32,

    /// JPEG quality for re-encoded photos (1–100).
    #[arg(long, env = "COOKBOOK_JPEG_QUALITY", default_value_t = 70,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Embed photos exactly as found in the archive.
    #[arg(long, env = "COOKBOOK_NO_OPTIMIZE")]
    no_optimize: bool,

    /// Photos processed in parallel.
    #[arg(short, long, env = "COOKBOOK_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Recipe order: name, name-ci, archive.
    #[arg(long, env = "COOKBOOK_SORT", default_value = "name")]
    sort: String,

    /// Also print description, total time, categories, rating and source.
    #[arg(long, env = "COOKBOOK_EXTENDED")]
    extended: bool,

    /// Year on the cover (default: current year).
    #[arg(long, env = "COOKBOOK_YEAR")]
    year: Option<i32>,

    /// Print a JSON report instead of the summary.
    #[arg(long, env = "COOKBOOK_JSON")]
    json: bool,

    /// List archive contents only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "COOKBOOK_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "COOKBOOK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "COOKBOOK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "COOKBOOK_QUIET")]
    quiet: bool,

    /// Serve the upload form on this address (e.g. 0.0.0.0:5000).
    #[arg(long, env = "COOKBOOK_SERVE")]
    serve: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are suppressed while the progress bar is drawn.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.serve.is_none();
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

    // ── Server mode ──────────────────────────────────────────────────────
    if let Some(ref addr) = cli.serve {
        let config = build_config(&cli, None)?;
        return run_server(addr, config).await;
    }

    let input = cli
        .input
        .clone()
        .context("An input archive is required unless --serve is given")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let inventory = inspect(&input, &config)
            .await
            .context("Failed to inspect archive")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&inventory).context("Failed to serialize inventory")?
            );
        } else {
            println!("File:     {}", input);
            println!("Recipes:  {}", inventory.recipe_entries.len());
            println!("Images:   {}", inventory.image_entries.len());
            println!("Other:    {}", inventory.other_entries.len());
            for entry in &inventory.recipe_entries {
                println!("  {}", entry);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let published = publish(&input, &config)
        .await
        .context("Cookbook build failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&published).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_summary(&published);
    }

    Ok(())
}

#[cfg(feature = "server")]
async fn run_server(addr: &str, config: CookbookConfig) -> Result<()> {
    paprika_cookbook::server::serve(addr, config)
        .await
        .with_context(|| format!("Server on {addr} failed"))
}

#[cfg(not(feature = "server"))]
async fn run_server(_addr: &str, _config: CookbookConfig) -> Result<()> {
    anyhow::bail!("This build has no web server; rebuild with `--features server`")
}

fn print_summary(published: &PublishedCookbook) {
    let stats = &published.stats;
    eprintln!(
        "{}  {}/{} recipes  {} photos  {}ms",
        if stats.failed == 0 { green("✔") } else { cyan("⚠") },
        stats.parsed,
        stats.total_entries,
        stats.photos_embedded,
        stats.total_duration_ms,
    );
    for record in published.records.iter().filter(|r| !r.is_ok()) {
        if let Some(ref e) = record.error {
            eprintln!("   {} {}", red("skipped"), dim(&e.to_string()));
        }
    }
    println!("{}", published.html_path.display());
    match (&published.pdf_path, &published.pdf_error) {
        (Some(pdf), _) => println!("{}", pdf.display()),
        (None, Some(err)) => eprintln!("{} {}", red("PDF not created:"), err),
        (None, None) => {}
    }
}

/// Map CLI args to `CookbookConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CookbookConfig> {
    let engine = if cli.html_only {
        PdfEngine::Disabled
    } else if let Some(ref line) = cli.pdf_command {
        PdfEngine::from_command_line(line).context("--pdf-command is empty")?
    } else {
        parse_engine(&cli.engine)?
    };

    let output_dir = match (&cli.output_dir, &cli.serve) {
        (Some(dir), _) => dir.clone(),
        (None, Some(_)) => std::env::temp_dir(),
        (None, None) => PathBuf::from("."),
    };

    let mut builder = CookbookConfig::builder()
        .author_name(cli.name.as_str())
        .max_image_width(cli.max_image_width)
        .jpeg_quality(cli.jpeg_quality)
        .optimize_photos(!cli.no_optimize)
        .concurrency(cli.concurrency)
        .sort_order(parse_sort(&cli.sort)?)
        .extended_fields(cli.extended)
        .output_dir(output_dir)
        .pdf_engine(engine)
        .render_timeout_secs(cli.render_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(year) = cli.year {
        builder = builder.year(year);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--engine`.
fn parse_engine(s: &str) -> Result<PdfEngine> {
    PdfEngine::from_name(s).with_context(|| {
        format!("Unknown PDF engine '{s}' (expected weasyprint, wkhtmltopdf, chromium or none)")
    })
}

/// Parse `--sort`.
fn parse_sort(s: &str) -> Result<SortOrder> {
    match s.trim().to_lowercase().as_str() {
        "name" => Ok(SortOrder::Name),
        "name-ci" | "name_ci" | "ci" => Ok(SortOrder::NameCaseInsensitive),
        "archive" | "none" => Ok(SortOrder::Archive),
        other => anyhow::bail!("Unknown sort order '{other}' (expected name, name-ci or archive)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engines_parse() {
        assert_eq!(parse_engine("weasyprint").unwrap(), PdfEngine::WeasyPrint);
        assert_eq!(parse_engine("NONE").unwrap(), PdfEngine::Disabled);
        assert!(parse_engine("prince").is_err());
    }

    #[test]
    fn sort_orders_parse() {
        assert_eq!(parse_sort("name").unwrap(), SortOrder::Name);
        assert_eq!(parse_sort("Name-CI").unwrap(), SortOrder::NameCaseInsensitive);
        assert_eq!(parse_sort("archive").unwrap(), SortOrder::Archive);
        assert!(parse_sort("rating").is_err());
    }

    #[test]
    fn cli_flags_map_to_config() {
        let cli = Cli::parse_from([
            "cookbook",
            "export.paprikarecipes",
            "--name",
            "Ana",
            "--html-only",
            "--sort",
            "archive",
            "--year",
            "2020",
            "-o",
            "out",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.author_name, "Ana");
        assert_eq!(config.pdf_engine, PdfEngine::Disabled);
        assert_eq!(config.sort_order, SortOrder::Archive);
        assert_eq!(config.effective_year(), 2020);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn pdf_command_overrides_engine() {
        let cli = Cli::parse_from([
            "cookbook",
            "x.paprikarecipes",
            "--engine",
            "chromium",
            "--pdf-command",
            "prince {input} -o {output}",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(
            config.pdf_engine,
            PdfEngine::Command {
                program: "prince".into(),
                args: vec!["{input}".into(), "-o".into(), "{output}".into()],
            }
        );
    }

    #[test]
    fn serve_needs_no_input() {
        let cli = Cli::parse_from(["cookbook", "--serve", "127.0.0.1:0"]);
        assert!(cli.input.is_none());
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.output_dir, std::env::temp_dir());
    }
}
