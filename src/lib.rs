//! # paprika-cookbook
//!
//! Turn a Paprika recipe export (`*.paprikarecipes`) into a printable
//! cookbook: one HTML document with a cover, a table of contents and a card
//! per recipe, printed to PDF by an external paged-media renderer.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .paprikarecipes (zip)
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Archive  list `.paprikarecipe` entries (spawn_blocking)
//!  ├─ 3. Decode   gunzip + JSON, lenient field types, text cleanup
//!  ├─ 4. Photos   embedded base64 or loose archive file → resized JPEG
//!  ├─ 5. Order    sort by name
//!  ├─ 6. HTML     cover, TOC, recipe cards
//!  └─ 7. PDF      weasyprint / wkhtmltopdf / chromium / custom command
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paprika_cookbook::{publish, CookbookConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CookbookConfig::builder()
//!         .author_name("Grandma Rose")
//!         .output_dir("out")
//!         .build()?;
//!     let published = publish("Export.paprikarecipes", &config).await?;
//!     println!("{} recipes → {}", published.recipe_count(), published.html_path.display());
//!     if let Some(err) = published.pdf_error {
//!         eprintln!("PDF skipped: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `cookbook` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `server` | on      | Enables [`server`], the upload-form web service (axum + tower-http) |
//!
//! Disable both when using only the library:
//! ```toml
//! paprika-cookbook = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod publish;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CookbookConfig, CookbookConfigBuilder, PdfEngine, SortOrder, DEFAULT_AUTHOR};
pub use convert::{
    build_cookbook, build_cookbook_from_bytes, inspect, publish, publish_from_bytes, publish_sync,
};
pub use error::{CookbookError, RecordError};
pub use output::{
    ArchiveInventory, CookbookOutput, CookbookStats, EmbeddedPhoto, PublishedCookbook, Recipe,
    RecordResult,
};
pub use pipeline::pdf::{CommandRenderer, PdfRenderer};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
