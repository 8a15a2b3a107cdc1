//! Configuration types for building a cookbook.
//!
//! All behaviour is controlled through [`CookbookConfig`], built via its
//! [`CookbookConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config between the CLI and the web form, and to log
//! exactly what a run was asked to do.

use crate::error::CookbookError;
use crate::pipeline::pdf::PdfRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Display name used on the cover when the caller gives none.
pub const DEFAULT_AUTHOR: &str = "A Food Lover";

/// Archive entries ending with this suffix are recipe records.
pub const DEFAULT_RECIPE_SUFFIX: &str = ".paprikarecipe";

/// Configuration for a cookbook build.
///
/// Built via [`CookbookConfig::builder()`] or using
/// [`CookbookConfig::default()`].
///
/// # Example
/// ```rust
/// use paprika_cookbook::{CookbookConfig, PdfEngine};
///
/// let config = CookbookConfig::builder()
///     .author_name("Grandma Rose")
///     .max_image_width(800)
///     .pdf_engine(PdfEngine::Wkhtmltopdf)
///     .build()
///     .unwrap();
/// assert_eq!(config.author_name, "Grandma Rose");
/// ```
#[derive(Clone)]
pub struct CookbookConfig {
    /// Name printed on the cover ("from the kitchen of …") and in the footer.
    pub author_name: String,

    /// Suffix identifying recipe records inside the archive. Default: `.paprikarecipe`.
    pub recipe_suffix: String,

    /// Photos wider than this (in pixels) are downscaled. Range: 64–4000. Default: 600.
    ///
    /// A full-resolution phone photo is 4000 px wide and several megabytes;
    /// a printed sidebar column never needs more than a few hundred pixels.
    pub max_image_width: u32,

    /// JPEG quality for re-encoded photos. Range: 1–100. Default: 70.
    pub jpeg_quality: u8,

    /// Re-encode photos as resized JPEG. Default: true.
    ///
    /// When false, photo bytes are embedded exactly as found in the archive.
    pub optimize_photos: bool,

    /// Number of photos optimised in parallel. Default: 4.
    pub concurrency: usize,

    /// Order of recipes in the table of contents and body. Default: [`SortOrder::Name`].
    pub sort_order: SortOrder,

    /// Render the extra record fields (description, total time, categories,
    /// source) that the classic layout leaves out. Default: false.
    pub extended_fields: bool,

    /// Year printed on the cover. `None` uses the current local year.
    pub year: Option<i32>,

    /// Directory that receives published `Cookbook_{id}.*` files.
    /// Default: the system temp directory.
    pub output_dir: PathBuf,

    /// Which external renderer turns the HTML into a PDF. Default: WeasyPrint.
    pub pdf_engine: PdfEngine,

    /// Pre-constructed renderer. Takes precedence over `pdf_engine`.
    pub pdf_renderer: Option<Arc<dyn PdfRenderer>>,

    /// Kill the renderer after this many seconds. Default: 300.
    ///
    /// WeasyPrint needs roughly a second per photo-heavy recipe page, so a
    /// 200-recipe export can legitimately take minutes.
    pub render_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for per-record events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for CookbookConfig {
    fn default() -> Self {
        Self {
            author_name: DEFAULT_AUTHOR.to_string(),
            recipe_suffix: DEFAULT_RECIPE_SUFFIX.to_string(),
            max_image_width: 600,
            jpeg_quality: 70,
            optimize_photos: true,
            concurrency: 4,
            sort_order: SortOrder::default(),
            extended_fields: false,
            year: None,
            output_dir: std::env::temp_dir(),
            pdf_engine: PdfEngine::default(),
            pdf_renderer: None,
            render_timeout_secs: 300,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for CookbookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookbookConfig")
            .field("author_name", &self.author_name)
            .field("recipe_suffix", &self.recipe_suffix)
            .field("max_image_width", &self.max_image_width)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("optimize_photos", &self.optimize_photos)
            .field("concurrency", &self.concurrency)
            .field("sort_order", &self.sort_order)
            .field("extended_fields", &self.extended_fields)
            .field("year", &self.year)
            .field("output_dir", &self.output_dir)
            .field("pdf_engine", &self.pdf_engine)
            .field(
                "pdf_renderer",
                &self.pdf_renderer.as_ref().map(|r| r.name().to_string()),
            )
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl CookbookConfig {
    /// Create a new builder for `CookbookConfig`.
    pub fn builder() -> CookbookConfigBuilder {
        CookbookConfigBuilder {
            config: Self::default(),
        }
    }

    /// Cover year: the configured override or the current local year.
    pub fn effective_year(&self) -> i32 {
        use chrono::Datelike;
        self.year.unwrap_or_else(|| chrono::Local::now().year())
    }
}

/// Builder for [`CookbookConfig`].
#[derive(Debug)]
pub struct CookbookConfigBuilder {
    config: CookbookConfig,
}

impl CookbookConfigBuilder {
    /// Blank names fall back to [`DEFAULT_AUTHOR`].
    pub fn author_name(mut self, name: impl Into<String>) -> Self {
        self.config.author_name = normalize_author(&name.into());
        self
    }

    pub fn recipe_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.recipe_suffix = suffix.into();
        self
    }

    pub fn max_image_width(mut self, px: u32) -> Self {
        self.config.max_image_width = px.clamp(64, 4000);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn optimize_photos(mut self, v: bool) -> Self {
        self.config.optimize_photos = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.config.sort_order = order;
        self
    }

    pub fn extended_fields(mut self, v: bool) -> Self {
        self.config.extended_fields = v;
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.config.year = Some(year);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn pdf_engine(mut self, engine: PdfEngine) -> Self {
        self.config.pdf_engine = engine;
        self
    }

    pub fn pdf_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.pdf_renderer = Some(renderer);
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CookbookConfig, CookbookError> {
        let c = &self.config;
        if c.recipe_suffix.trim().is_empty() {
            return Err(CookbookError::InvalidConfig(
                "Recipe suffix must not be empty".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(CookbookError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if let PdfEngine::Command { program, .. } = &c.pdf_engine {
            if program.trim().is_empty() {
                return Err(CookbookError::InvalidConfig(
                    "Custom PDF command needs a program".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

/// Trimmed cover name, or [`DEFAULT_AUTHOR`] when blank.
pub fn normalize_author(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_AUTHOR.to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Order of recipes in the finished cookbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// By name, comparing Unicode code points (uppercase sorts before lowercase). (default)
    #[default]
    Name,
    /// By name, ignoring case; ties keep archive order.
    NameCaseInsensitive,
    /// Keep the order records appear in the archive.
    Archive,
}

/// External program used to print the HTML to PDF.
///
/// The stylesheet relies on CSS paged media (`@page` margin boxes and
/// `target-counter()` for table-of-contents page numbers). WeasyPrint
/// supports all of it; the other engines render the same markup without
/// TOC page numbers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PdfEngine {
    /// `weasyprint <html> <pdf>` (default)
    #[default]
    WeasyPrint,
    /// `wkhtmltopdf --quiet --enable-local-file-access <html> <pdf>`
    Wkhtmltopdf,
    /// Headless Chrome/Chromium `--print-to-pdf`.
    Chromium,
    /// Any program; `{input}` and `{output}` in `args` are substituted,
    /// and appended when absent.
    Command { program: String, args: Vec<String> },
    /// Skip the PDF; publish HTML only.
    Disabled,
}

impl PdfEngine {
    /// Parse the CLI spelling of an engine name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "weasyprint" | "weasy" => Some(PdfEngine::WeasyPrint),
            "wkhtmltopdf" | "wkhtml" => Some(PdfEngine::Wkhtmltopdf),
            "chromium" | "chrome" => Some(PdfEngine::Chromium),
            "none" | "off" | "disabled" => Some(PdfEngine::Disabled),
            _ => None,
        }
    }

    /// Parse a whitespace-separated command line into [`PdfEngine::Command`].
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(PdfEngine::Command {
            program,
            args: parts.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_layout() {
        let c = CookbookConfig::default();
        assert_eq!(c.author_name, "A Food Lover");
        assert_eq!(c.recipe_suffix, ".paprikarecipe");
        assert_eq!(c.max_image_width, 600);
        assert_eq!(c.jpeg_quality, 70);
        assert_eq!(c.sort_order, SortOrder::Name);
        assert_eq!(c.pdf_engine, PdfEngine::WeasyPrint);
    }

    #[test]
    fn builder_clamps_values() {
        let c = CookbookConfig::builder()
            .max_image_width(10)
            .jpeg_quality(0)
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.max_image_width, 64);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn blank_author_falls_back_to_default() {
        let c = CookbookConfig::builder().author_name("   ").build().unwrap();
        assert_eq!(c.author_name, DEFAULT_AUTHOR);
        let c = CookbookConfig::builder().author_name(" Ana ").build().unwrap();
        assert_eq!(c.author_name, "Ana");
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let err = CookbookConfig::builder().recipe_suffix("").build().unwrap_err();
        assert!(matches!(err, CookbookError::InvalidConfig(_)));
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = CookbookConfig::builder()
            .pdf_engine(PdfEngine::Command {
                program: " ".into(),
                args: vec![],
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, CookbookError::InvalidConfig(_)));
    }

    #[test]
    fn year_override() {
        let c = CookbookConfig::builder().year(1999).build().unwrap();
        assert_eq!(c.effective_year(), 1999);
    }

    #[test]
    fn engine_names() {
        assert_eq!(PdfEngine::from_name("WeasyPrint"), Some(PdfEngine::WeasyPrint));
        assert_eq!(PdfEngine::from_name("chrome"), Some(PdfEngine::Chromium));
        assert_eq!(PdfEngine::from_name("none"), Some(PdfEngine::Disabled));
        assert_eq!(PdfEngine::from_name("prince"), None);
        assert_eq!(
            PdfEngine::from_command_line("prince {input} -o {output}"),
            Some(PdfEngine::Command {
                program: "prince".into(),
                args: vec!["{input}".into(), "-o".into(), "{output}".into()],
            })
        );
        assert_eq!(PdfEngine::from_command_line("   "), None);
    }
}
