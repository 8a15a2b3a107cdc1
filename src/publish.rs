//! Published file naming, atomic writes and safe download lookup.
//!
//! Each published cookbook gets a short random id; its files are
//! `Cookbook_{id}.html` and `Cookbook_{id}.pdf` in the output directory.

use crate::error::CookbookError;
use std::path::{Component, Path, PathBuf};

/// First 8 hex characters of a v4 UUID.
pub fn new_document_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

pub fn html_file_name(id: &str) -> String {
    format!("Cookbook_{id}.html")
}

pub fn pdf_file_name(id: &str) -> String {
    format!("Cookbook_{id}.pdf")
}

/// Write `bytes` to `path` via a sibling temp file and rename, so readers
/// never observe a half-written file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CookbookError> {
    let fail = |source: std::io::Error| CookbookError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(fail)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(fail(e));
    }
    Ok(())
}

/// True for names this crate publishes: `Cookbook_{id}.html` or `.pdf`.
pub fn is_published_name(file_name: &str) -> bool {
    let Some(stem) = file_name
        .strip_suffix(".html")
        .or_else(|| file_name.strip_suffix(".pdf"))
    else {
        return false;
    };
    stem.strip_prefix("Cookbook_").is_some_and(|id| {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

/// Resolve a requested download to a file inside `dir`.
///
/// Only a published cookbook name is accepted (see [`is_published_name`]),
/// and only when it is a regular file, not a symlink. Returns `None` for
/// anything else.
pub fn resolve_download(dir: &Path, file_name: &str) -> Option<PathBuf> {
    if !is_published_name(file_name) {
        return None;
    }
    let mut components = Path::new(file_name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == file_name => {}
        _ => return None,
    }
    let path = dir.join(file_name);
    let meta = std::fs::symlink_metadata(&path).ok()?;
    meta.file_type().is_file().then_some(path)
}
