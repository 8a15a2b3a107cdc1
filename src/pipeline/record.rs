//! Record decoding: archive entry bytes → [`RawRecipe`] → [`Recipe`].
//!
//! Paprika gzips each record, but hand-edited and third-party exports often
//! contain plain JSON, so decompression is attempted only when the gzip
//! magic is present and falls back to the raw bytes if the stream is corrupt.
//! Decompressed output is capped at [`MAX_ENTRY_SIZE`].
//!
//! Field types drift between exporters (`"servings": 4` vs `"4"`,
//! `"rating": "5"`), so every scalar field is read leniently.

use crate::error::RecordError;
use crate::output::Recipe;
use crate::pipeline::archive::MAX_ENTRY_SIZE;
use crate::pipeline::text::{clean_block, clean_inline, split_lines, split_list};
use flate2::read::GzDecoder;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Name given to records without one.
pub const UNTITLED: &str = "Untitled";

/// A recipe record as stored in the export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecipe {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prep_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cook_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub servings: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ingredients: String,
    #[serde(deserialize_with = "lenient_string")]
    pub directions: String,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source_url: String,
    #[serde(deserialize_with = "lenient_list")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "lenient_rating")]
    pub rating: u8,
    /// File name of a loose photo inside the archive.
    #[serde(deserialize_with = "lenient_string")]
    pub photo: String,
    /// Base64 photo bytes embedded in the record.
    #[serde(alias = "photoData", deserialize_with = "lenient_string")]
    pub photo_data: String,
}

/// Where a record's photo bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    /// Base64 text embedded in the record.
    Embedded(String),
    /// Loose archive entry referenced by name.
    Referenced(String),
    None,
}

impl RawRecipe {
    /// Photo lookup order: embedded data first, then the `photo` reference.
    pub fn photo_source(&self) -> PhotoSource {
        let data = self.photo_data.trim();
        if !data.is_empty() {
            return PhotoSource::Embedded(data.to_string());
        }
        let reference = self.photo.trim();
        if !reference.is_empty() {
            return PhotoSource::Referenced(reference.to_string());
        }
        PhotoSource::None
    }

    /// Clean every field into a renderable [`Recipe`] (photo left empty).
    pub fn into_recipe(self, entry: &str) -> Recipe {
        let name = clean_inline(&self.name);
        Recipe {
            name: if name.is_empty() {
                UNTITLED.to_string()
            } else {
                name
            },
            prep_time: clean_inline(&self.prep_time),
            cook_time: clean_inline(&self.cook_time),
            total_time: clean_inline(&self.total_time),
            servings: clean_inline(&self.servings),
            ingredients: split_lines(&self.ingredients),
            directions: split_lines(&self.directions),
            notes: clean_block(&self.notes),
            description: clean_block(&self.description),
            categories: self
                .categories
                .iter()
                .flat_map(|c| split_list(c))
                .collect(),
            source: clean_inline(&self.source),
            source_url: clean_inline(&self.source_url),
            rating: self.rating.min(5),
            photo: None,
            entry: entry.to_string(),
        }
    }
}

/// Decode one archive entry into a [`RawRecipe`].
pub fn decode_record(entry: &str, bytes: &[u8]) -> Result<RawRecipe, RecordError> {
    let payload = decompress_if_gzip(entry, bytes, MAX_ENTRY_SIZE)?;
    let text = std::str::from_utf8(&payload).map_err(|_| RecordError::NotUtf8 {
        entry: entry.to_string(),
    })?;
    let text = text.trim_start_matches('\u{FEFF}');
    serde_json::from_str::<RawRecipe>(text).map_err(|e| RecordError::InvalidJson {
        entry: entry.to_string(),
        detail: e.to_string(),
    })
}

/// Gunzip `bytes` when they carry the gzip magic; otherwise, or when the
/// stream is corrupt, return them unchanged.
///
/// Output longer than `limit` is an error, never a fallback to the raw bytes.
pub fn decompress_if_gzip(
    entry: &str,
    bytes: &[u8],
    limit: u64,
) -> Result<Vec<u8>, RecordError> {
    if bytes.len() < 2 || bytes[..2] != GZIP_MAGIC {
        return Ok(bytes.to_vec());
    }
    let mut out = Vec::new();
    match GzDecoder::new(bytes).take(limit + 1).read_to_end(&mut out) {
        Ok(_) if out.len() as u64 > limit => Err(RecordError::TooLarge {
            entry: entry.to_string(),
            limit,
        }),
        Ok(_) => Ok(out),
        Err(e) => {
            tracing::debug!("gzip decode failed ({e}); using raw bytes");
            Ok(bytes.to_vec())
        }
    }
}

// ── Lenient field readers ────────────────────────────────────────────────────

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(_) => String::new(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let s = value_to_string(other);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
    })
}

fn lenient_rating<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let rating = match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(rating.clamp(0.0, 5.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn decodes_gzipped_record() {
        let json = br#"{"name":"Pancakes","servings":"4","ingredients":"1 egg\n2 cups milk"}"#;
        let raw = decode_record("p.paprikarecipe", &gzip(json)).unwrap();
        assert_eq!(raw.name, "Pancakes");
        assert_eq!(raw.servings, "4");
    }

    #[test]
    fn decodes_plain_record() {
        let raw = decode_record("p", br#"{"name":"Toast"}"#).unwrap();
        assert_eq!(raw.name, "Toast");
    }

    #[test]
    fn corrupt_gzip_falls_back_to_raw() {
        let bytes = [0x1f, 0x8b, 0x00, 0x01];
        assert_eq!(decompress_if_gzip("x", &bytes, 1024).unwrap(), bytes.to_vec());
    }

    #[test]
    fn gzip_output_is_capped() {
        // 1 MiB of spaces compresses to about a kilobyte.
        let bomb = gzip(&vec![b' '; 1024 * 1024]);
        assert!(bomb.len() < 8 * 1024);

        let err = decompress_if_gzip("bomb.paprikarecipe", &bomb, 64 * 1024).unwrap_err();
        assert_eq!(
            err,
            RecordError::TooLarge {
                entry: "bomb.paprikarecipe".into(),
                limit: 64 * 1024
            }
        );

        let out = decompress_if_gzip("ok", &bomb, 1024 * 1024).unwrap();
        assert_eq!(out.len(), 1024 * 1024);
    }

    #[test]
    fn non_utf8_is_reported() {
        let err = decode_record("bad.paprikarecipe", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(
            err,
            RecordError::NotUtf8 {
                entry: "bad.paprikarecipe".into()
            }
        );
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = decode_record("x", b"{not json").unwrap_err();
        assert!(matches!(err, RecordError::InvalidJson { .. }));
        let err = decode_record("x", b"\"just text\"").unwrap_err();
        assert!(matches!(err, RecordError::InvalidJson { .. }));
    }

    #[test]
    fn lenient_scalars() {
        let raw = decode_record(
            "x",
            br#"{"name":null,"servings":6,"rating":"4","categories":"Soup, Winter","prep_time":true}"#,
        )
        .unwrap();
        assert_eq!(raw.name, "");
        assert_eq!(raw.servings, "6");
        assert_eq!(raw.rating, 4);
        assert_eq!(raw.categories, vec!["Soup, Winter"]);
        assert_eq!(raw.prep_time, "true");
    }

    #[test]
    fn photo_data_alias() {
        let raw = decode_record("x", br#"{"photoData":"QUJD"}"#).unwrap();
        assert_eq!(raw.photo_source(), PhotoSource::Embedded("QUJD".into()));
        let raw = decode_record("x", br#"{"photo":"img/1.jpg","photo_data":" "}"#).unwrap();
        assert_eq!(raw.photo_source(), PhotoSource::Referenced("img/1.jpg".into()));
        let raw = decode_record("x", br#"{}"#).unwrap();
        assert_eq!(raw.photo_source(), PhotoSource::None);
    }

    #[test]
    fn into_recipe_cleans_fields() {
        let raw = RawRecipe {
            name: "   ".into(),
            ingredients: "1 egg\r\n\r\nsalt\n".into(),
            directions: "Mix.\n\nBake.".into(),
            notes: "  Best warm.  \n".into(),
            categories: vec!["Breakfast, Quick".into(), "Sweet".into()],
            rating: 9,
            ..RawRecipe::default()
        };
        let r = raw.into_recipe("e.paprikarecipe");
        assert_eq!(r.name, UNTITLED);
        assert_eq!(r.ingredients, vec!["1 egg", "salt"]);
        assert_eq!(r.directions, vec!["Mix.", "Bake."]);
        assert_eq!(r.notes, "Best warm.");
        assert_eq!(r.categories, vec!["Breakfast", "Quick", "Sweet"]);
        assert_eq!(r.rating, 5);
        assert_eq!(r.entry, "e.paprikarecipe");
        assert!(r.photo.is_none());
    }
}
