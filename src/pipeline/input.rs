//! Input resolution: normalise a user-supplied path or URL to a local archive.
//!
//! `zip::ZipArchive` needs `Read + Seek`, which an HTTP body is not, so URL
//! inputs are downloaded into a `TempDir` that lives as long as the
//! [`ResolvedInput`]. The zip signature is checked before returning so callers
//! get a meaningful error instead of a central-directory parse failure.

use crate::error::CookbookError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Local file header signature; every non-empty zip starts with it.
const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";
/// End-of-central-directory signature; an empty zip is only this record.
const ZIP_EMPTY_MAGIC: [u8; 4] = *b"PK\x05\x06";

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; archive downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the archive regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// True when `magic` is a zip signature.
pub fn is_zip_magic(magic: &[u8]) -> bool {
    magic.len() >= 4 && (magic[..4] == ZIP_MAGIC || magic[..4] == ZIP_EMPTY_MAGIC)
}

/// Resolve the input string to a local archive path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, CookbookError> {
    if input.trim().is_empty() {
        return Err(CookbookError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and zip magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, CookbookError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(CookbookError::FileNotFound { path });
    }
    if path.is_dir() {
        return Err(CookbookError::InvalidInput {
            input: path_str.to_string(),
        });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            let read = f.read(&mut magic).unwrap_or(0);
            if read < 4 || !is_zip_magic(&magic) {
                return Err(CookbookError::NotAnArchive { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CookbookError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(CookbookError::FileNotFound { path });
        }
    }

    debug!("Resolved local archive: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, CookbookError> {
    info!("Downloading archive from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CookbookError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            CookbookError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            CookbookError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(CookbookError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);

    let temp_dir = TempDir::new().map_err(|e| CookbookError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CookbookError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !is_zip_magic(&bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(CookbookError::NotAnArchive {
            path: PathBuf::from(url),
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| CookbookError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.paprikarecipes".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/export.paprikarecipes"));
        assert!(is_url("http://example.com/export.zip"));
        assert!(!is_url("/tmp/export.paprikarecipes"));
        assert!(!is_url("export.zip"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_zip_magic() {
        assert!(is_zip_magic(b"PK\x03\x04rest"));
        assert!(is_zip_magic(b"PK\x05\x06"));
        assert!(!is_zip_magic(b"%PDF-1.7"));
        assert!(!is_zip_magic(b"PK"));
    }

    #[test]
    fn test_extract_filename() {
        assert_eq!(
            extract_filename("https://example.com/files/My%20Recipes.paprikarecipes"),
            "My%20Recipes.paprikarecipes"
        );
        assert_eq!(
            extract_filename("https://example.com/download"),
            "downloaded.paprikarecipes"
        );
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/definitely/not/here.zip", 5).await.err().unwrap();
        assert!(matches!(err, CookbookError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = resolve_input("  ", 5).await.err().unwrap();
        assert!(matches!(err, CookbookError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn non_zip_file_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"{\"name\": \"not a zip\"}").unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5)
            .await
            .err()
            .unwrap();
        match err {
            CookbookError::NotAnArchive { magic, .. } => assert_eq!(&magic, b"{\"na"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn zip_file_resolves_locally() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x05\x06").unwrap();
        f.write_all(&[0u8; 18]).unwrap();
        let resolved = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.path(), f.path());
    }
}
