//! Error types for the paprika-cookbook library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CookbookError`] — **Fatal**: the cookbook cannot be built at all
//!   (archive missing or unreadable, no recipe files, every record broken).
//!   Returned as `Err(CookbookError)` from the top-level entry points.
//!
//! * [`RecordError`] — **Non-fatal**: a single recipe record failed to decode
//!   but the rest of the archive is fine. Stored inside
//!   [`crate::output::RecordResult`] so callers can report partial success
//!   instead of losing the whole cookbook to one bad export.
//!
//! A failed PDF render is also non-fatal for [`crate::publish`]: the HTML is
//! still written and the error text travels in
//! [`crate::output::PublishedCookbook::pdf_error`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paprika-cookbook library.
#[derive(Debug, Error)]
pub enum CookbookError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Archive not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a zip container.
    #[error("File is not a zip archive: '{path}'\nFirst bytes: {magic:?}")]
    NotAnArchive { path: PathBuf, magic: [u8; 4] },

    // ── Archive errors ────────────────────────────────────────────────────
    /// The zip central directory is corrupt or the container is unsupported.
    #[error("Error reading archive: {detail}")]
    ArchiveUnreadable { detail: String },

    /// The archive opened fine but holds no entry with the recipe suffix.
    #[error("No {suffix} files found!")]
    NoRecipeFiles { suffix: String },

    /// Every recipe record failed to decode; the cookbook would be empty.
    #[error("No recipes found in file! All {total} records failed.\nFirst error: {first_error}")]
    NoRecipesParsed { total: usize, first_error: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The renderer program could not be started (not installed, not on PATH).
    #[error("PDF renderer '{program}' is not available: {detail}\nInstall it or choose another --engine.")]
    RendererUnavailable { program: String, detail: String },

    /// The renderer ran but reported a failure or produced no PDF.
    #[error("PDF rendering with '{program}' failed: {detail}")]
    PdfRenderFailed { program: String, detail: String },

    /// The renderer exceeded the configured timeout and was killed.
    #[error("PDF rendering with '{program}' timed out after {secs}s\nIncrease --render-timeout.")]
    RenderTimeout { program: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single recipe record.
///
/// Stored in [`crate::output::RecordResult`] when a record fails.
/// The build continues unless ALL records fail.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RecordError {
    /// The entry could not be read out of the archive.
    #[error("{entry}: could not read entry: {detail}")]
    ReadFailed { entry: String, detail: String },

    /// The (possibly decompressed) payload is not UTF-8 text.
    #[error("{entry}: record is not valid UTF-8")]
    NotUtf8 { entry: String },

    /// The payload is text but not a JSON recipe object.
    #[error("{entry}: invalid recipe JSON: {detail}")]
    InvalidJson { entry: String, detail: String },

    /// The record expands past the per-entry size limit.
    #[error("{entry}: record expands past {limit} bytes")]
    TooLarge { entry: String, limit: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_recipe_files_display() {
        let e = CookbookError::NoRecipeFiles {
            suffix: ".paprikarecipe".into(),
        };
        assert_eq!(e.to_string(), "No .paprikarecipe files found!");
    }

    #[test]
    fn no_recipes_parsed_display() {
        let e = CookbookError::NoRecipesParsed {
            total: 3,
            first_error: "a.paprikarecipe: record is not valid UTF-8".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("All 3 records"), "got: {msg}");
        assert!(msg.contains("a.paprikarecipe"));
    }

    #[test]
    fn render_timeout_display() {
        let e = CookbookError::RenderTimeout {
            program: "weasyprint".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("weasyprint"));
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn record_errors_lead_with_entry() {
        let e = RecordError::InvalidJson {
            entry: "Soup.paprikarecipe".into(),
            detail: "expected value".into(),
        };
        assert!(e.to_string().starts_with("Soup.paprikarecipe:"));
        let e = RecordError::TooLarge {
            entry: "Bomb.paprikarecipe".into(),
            limit: 1024,
        };
        assert_eq!(e.to_string(), "Bomb.paprikarecipe: record expands past 1024 bytes");
    }
}
