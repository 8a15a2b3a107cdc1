//! Result types produced by a cookbook build.

use crate::error::RecordError;
use serde::Serialize;
use std::path::PathBuf;

/// One decoded, cleaned recipe ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recipe {
    /// Recipe title; `"Untitled"` when the record has none.
    pub name: String,
    pub prep_time: String,
    pub cook_time: String,
    pub total_time: String,
    pub servings: String,
    /// Non-blank ingredient lines, in record order.
    pub ingredients: Vec<String>,
    /// Non-blank direction lines; each one becomes a numbered step.
    pub directions: Vec<String>,
    pub notes: String,
    pub description: String,
    pub categories: Vec<String>,
    pub source: String,
    pub source_url: String,
    /// Star rating 0–5; zero means unrated.
    pub rating: u8,
    /// Photo ready to inline as a `data:` URI.
    pub photo: Option<EmbeddedPhoto>,
    /// Archive entry the recipe was decoded from.
    pub entry: String,
}

/// A photo encoded for inlining into the HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedPhoto {
    /// MIME type for the `data:` URI, e.g. `image/jpeg`.
    pub mime_type: String,
    /// Base64 payload (standard alphabet, padded).
    #[serde(skip_serializing)]
    pub data_base64: String,
    /// True when the photo was decoded, resized and re-encoded as JPEG.
    pub optimized: bool,
}

impl EmbeddedPhoto {
    /// Render as a `data:` URI for an `<img src>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// Outcome for one recipe entry of the archive.
#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    /// Archive entry name.
    pub entry: String,
    /// Decoded recipe name, when decoding succeeded.
    pub recipe_name: Option<String>,
    /// Whether a photo made it into the document.
    pub has_photo: bool,
    /// Why the record was skipped, if it was.
    pub error: Option<RecordError>,
}

impl RecordResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate numbers for a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CookbookStats {
    /// Entries carrying the recipe suffix.
    pub total_entries: usize,
    pub parsed: usize,
    pub failed: usize,
    pub photos_embedded: usize,
    pub photos_optimized: usize,
    pub html_bytes: usize,
    pub parse_duration_ms: u64,
    pub photo_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The assembled cookbook, before anything is written to disk.
#[derive(Debug, Clone, Serialize)]
pub struct CookbookOutput {
    /// Complete HTML document.
    #[serde(skip_serializing)]
    pub html: String,
    /// Recipes in document order.
    pub recipes: Vec<Recipe>,
    /// Per-entry outcomes in archive order.
    pub records: Vec<RecordResult>,
    pub stats: CookbookStats,
}

impl CookbookOutput {
    /// Records that were skipped.
    pub fn failed_records(&self) -> impl Iterator<Item = &RecordResult> {
        self.records.iter().filter(|r| !r.is_ok())
    }
}

/// Files written by [`crate::publish`].
#[derive(Debug, Clone, Serialize)]
pub struct PublishedCookbook {
    /// Short identifier shared by both file names.
    pub id: String,
    pub html_path: PathBuf,
    /// `None` when PDF rendering was disabled or failed.
    pub pdf_path: Option<PathBuf>,
    /// Renderer failure message when the PDF could not be produced.
    pub pdf_error: Option<String>,
    pub records: Vec<RecordResult>,
    pub stats: CookbookStats,
}

impl PublishedCookbook {
    pub fn recipe_count(&self) -> usize {
        self.stats.parsed
    }

    pub fn html_file_name(&self) -> String {
        file_name_of(&self.html_path)
    }

    pub fn pdf_file_name(&self) -> Option<String> {
        self.pdf_path.as_deref().map(file_name_of)
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// What an archive holds, without decoding any record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveInventory {
    /// Entries with the recipe suffix, in archive order.
    pub recipe_entries: Vec<String>,
    /// Loose image files (candidates for `photo` references).
    pub image_entries: Vec<String>,
    /// Every other file entry.
    pub other_entries: Vec<String>,
}

impl ArchiveInventory {
    pub fn total_entries(&self) -> usize {
        self.recipe_entries.len() + self.image_entries.len() + self.other_entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_format() {
        let p = EmbeddedPhoto {
            mime_type: "image/jpeg".into(),
            data_base64: "AAAA".into(),
            optimized: true,
        };
        assert_eq!(p.data_uri(), "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn photo_payload_is_not_serialised() {
        let p = EmbeddedPhoto {
            mime_type: "image/png".into(),
            data_base64: "c2VjcmV0".into(),
            optimized: false,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(!json.contains("c2VjcmV0"), "got: {json}");
        assert!(json.contains("image/png"));
    }

    #[test]
    fn published_file_names() {
        let p = PublishedCookbook {
            id: "abcd1234".into(),
            html_path: PathBuf::from("/tmp/Cookbook_abcd1234.html"),
            pdf_path: None,
            pdf_error: Some("boom".into()),
            records: vec![],
            stats: CookbookStats::default(),
        };
        assert_eq!(p.html_file_name(), "Cookbook_abcd1234.html");
        assert_eq!(p.pdf_file_name(), None);
    }
}
