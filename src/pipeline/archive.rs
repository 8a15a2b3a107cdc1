//! Zip access: list entries, read recipe records, find loose photos.
//!
//! Paprika exports are plain zip files named `*.paprikarecipes`. Each entry
//! ending in `.paprikarecipe` is one gzip-compressed JSON record; some
//! third-party exporters add loose image files and reference them from the
//! record's `photo` field instead of embedding the bytes.

use crate::error::CookbookError;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Entries larger than this are never read into memory.
pub const MAX_ENTRY_SIZE: u64 = 64 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// An opened recipe archive.
pub struct RecipeArchive<R: Read + Seek> {
    zip: ZipArchive<R>,
    names: Vec<String>,
}

impl RecipeArchive<BufReader<File>> {
    /// Open an archive on disk.
    pub fn open_path(path: &Path) -> Result<Self, CookbookError> {
        let file = File::open(path).map_err(|e| CookbookError::ArchiveUnreadable {
            detail: format!("{}: {}", path.display(), e),
        })?;
        Self::new(BufReader::new(file))
    }
}

impl RecipeArchive<Cursor<Vec<u8>>> {
    /// Open an archive held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, CookbookError> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> RecipeArchive<R> {
    /// Parse the central directory of `reader`.
    pub fn new(reader: R) -> Result<Self, CookbookError> {
        let zip = ZipArchive::new(reader).map_err(|e| CookbookError::ArchiveUnreadable {
            detail: e.to_string(),
        })?;
        let names = (0..zip.len())
            .filter_map(|i| zip.name_for_index(i))
            .filter(|n| !n.ends_with('/'))
            .map(str::to_string)
            .collect::<Vec<_>>();
        debug!("Archive opened: {} file entries", names.len());
        Ok(Self { zip, names })
    }

    /// All file entries (directories excluded), in archive order.
    pub fn entry_names(&self) -> &[String] {
        &self.names
    }

    /// Entries whose name ends with `suffix`, in archive order.
    pub fn recipe_entries(&self, suffix: &str) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| n.ends_with(suffix))
            .cloned()
            .collect()
    }

    /// Entries that look like image files by extension.
    pub fn image_entries(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| is_image_name(n))
            .cloned()
            .collect()
    }

    /// Read the full contents of one entry.
    ///
    /// Encrypted entries and entries over [`MAX_ENTRY_SIZE`] are errors.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>, String> {
        self.read_with_limit(name, MAX_ENTRY_SIZE)
    }

    fn read_with_limit(&mut self, name: &str, limit: u64) -> Result<Vec<u8>, String> {
        let mut entry = self.zip.by_name(name).map_err(|e| e.to_string())?;
        if entry.encrypted() {
            return Err("entry is password-protected".to_string());
        }
        let size = entry.size();
        if size > limit {
            warn!("Skipping oversized entry {name}: {size} bytes");
            return Err(format!("entry is {size} bytes, limit is {limit} bytes"));
        }
        let mut buf = Vec::with_capacity(size as usize);
        (&mut entry)
            .take(limit + 1)
            .read_to_end(&mut buf)
            .map_err(|e| e.to_string())?;
        if buf.len() as u64 > limit {
            return Err(format!("entry exceeds {limit} bytes"));
        }
        Ok(buf)
    }

    /// Locate a loose file referenced by a record's `photo` field.
    ///
    /// Only the basename of `reference` is considered. An entry whose own
    /// basename matches exactly wins; otherwise the first entry whose name
    /// ends with the basename is returned.
    pub fn find_by_basename(&self, reference: &str) -> Option<String> {
        let target = basename(reference);
        if target.is_empty() {
            return None;
        }
        self.names
            .iter()
            .find(|n| basename(n) == target)
            .or_else(|| self.names.iter().find(|n| n.ends_with(target)))
            .cloned()
    }
}

/// Last path segment, accepting both `/` and `\` separators.
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path).trim()
}

/// True when the name has a known image extension.
pub fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            if name.ends_with('/') {
                writer
                    .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                    .unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn lists_entries_in_archive_order() {
        let bytes = build_zip(&[
            ("b.paprikarecipe", b"{}"),
            ("photos/", b""),
            ("photos/a.jpg", b"jpg"),
            ("a.paprikarecipe", b"{}"),
        ]);
        let archive = RecipeArchive::from_bytes(bytes).unwrap();
        assert_eq!(
            archive.entry_names(),
            &["b.paprikarecipe", "photos/a.jpg", "a.paprikarecipe"]
        );
        assert_eq!(
            archive.recipe_entries(".paprikarecipe"),
            vec!["b.paprikarecipe", "a.paprikarecipe"]
        );
        assert_eq!(archive.image_entries(), vec!["photos/a.jpg"]);
    }

    #[test]
    fn reads_entry_bytes() {
        let bytes = build_zip(&[("r.paprikarecipe", b"hello")]);
        let mut archive = RecipeArchive::from_bytes(bytes).unwrap();
        assert_eq!(archive.read("r.paprikarecipe").unwrap(), b"hello");
        assert!(archive.read("missing").is_err());
    }

    /// Set the "encrypted" general-purpose flag on every entry, in both the
    /// local headers and the central directory.
    fn mark_encrypted(mut bytes: Vec<u8>) -> Vec<u8> {
        let mut i = 0;
        while i + 4 <= bytes.len() {
            let flag_at = match bytes[i..i + 4] {
                [0x50, 0x4b, 0x03, 0x04] => Some(i + 6),
                [0x50, 0x4b, 0x01, 0x02] => Some(i + 8),
                _ => None,
            };
            if let Some(at) = flag_at {
                bytes[at] |= 0x01;
            }
            i += 1;
        }
        bytes
    }

    #[test]
    fn encrypted_entry_is_a_read_error() {
        let bytes = mark_encrypted(build_zip(&[("secret.paprikarecipe", b"{}")]));
        let mut archive = RecipeArchive::from_bytes(bytes).unwrap();
        assert_eq!(archive.recipe_entries(".paprikarecipe").len(), 1);
        assert!(archive.read("secret.paprikarecipe").is_err());
    }

    #[test]
    fn oversized_entry_is_a_read_error() {
        let bytes = build_zip(&[
            ("big.paprikarecipe", &[b'x'; 4096]),
            ("ok.paprikarecipe", b"{}"),
        ]);
        let mut archive = RecipeArchive::from_bytes(bytes).unwrap();
        let err = archive.read_with_limit("big.paprikarecipe", 1024).unwrap_err();
        assert!(err.contains("limit is 1024"), "got: {err}");
        assert_eq!(archive.read_with_limit("ok.paprikarecipe", 1024).unwrap(), b"{}");
        assert_eq!(archive.read("big.paprikarecipe").unwrap().len(), 4096);
    }

    #[test]
    fn garbage_is_unreadable() {
        let err = RecipeArchive::from_bytes(b"definitely not a zip".to_vec())
            .err()
            .unwrap();
        assert!(matches!(err, CookbookError::ArchiveUnreadable { .. }));
    }

    #[test]
    fn finds_photo_by_basename() {
        let bytes = build_zip(&[
            ("images/xcake.jpg", b"1"),
            ("images/cake.jpg", b"2"),
        ]);
        let archive = RecipeArchive::from_bytes(bytes).unwrap();
        // Exact basename beats a suffix match that appears earlier.
        assert_eq!(
            archive.find_by_basename("/var/mobile/Photos/cake.jpg").as_deref(),
            Some("images/cake.jpg")
        );
        assert_eq!(
            archive.find_by_basename("ake.jpg").as_deref(),
            Some("images/xcake.jpg")
        );
        assert_eq!(archive.find_by_basename("pie.png"), None);
        assert_eq!(archive.find_by_basename("photos/"), None);
    }

    #[test]
    fn basename_handles_both_separators() {
        assert_eq!(basename("a/b/c.jpg"), "c.jpg");
        assert_eq!(basename("C:\\pics\\d.png"), "d.png");
        assert_eq!(basename("e.gif"), "e.gif");
    }

    #[test]
    fn image_names() {
        assert!(is_image_name("x/Photo.JPG"));
        assert!(is_image_name("a.webp"));
        assert!(!is_image_name("a.paprikarecipe"));
        assert!(!is_image_name("README"));
    }
}
