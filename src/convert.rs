//! Conversion entry points: archive in, cookbook out.
//!
//! [`build_cookbook`] stops at the assembled HTML in memory; [`publish`]
//! additionally writes `Cookbook_{id}.html` and asks the configured
//! renderer for `Cookbook_{id}.pdf`. A renderer failure never loses the
//! HTML: it is reported in [`PublishedCookbook::pdf_error`] instead.

use crate::config::{CookbookConfig, SortOrder};
use crate::error::{CookbookError, RecordError};
use crate::output::{
    ArchiveInventory, CookbookOutput, CookbookStats, PublishedCookbook, Recipe, RecordResult,
};
use crate::pipeline::archive::RecipeArchive;
use crate::pipeline::record::{decode_record, PhotoSource};
use crate::pipeline::{html, input, pdf, photo};
use crate::progress::ProgressCallback;
use crate::publish::{html_file_name, new_document_id, pdf_file_name, write_atomic};
use futures::stream::{self, StreamExt};
use std::io::{Read, Seek};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Build a cookbook from an archive path or URL.
///
/// # Returns
/// `Ok(CookbookOutput)` as long as at least one record decoded; skipped
/// records are listed in `output.records` with their error.
///
/// # Errors
/// Returns `Err(CookbookError)` only for fatal errors:
/// - File not found / not a zip archive
/// - No entry carries the recipe suffix
/// - Every record failed to decode
pub async fn build_cookbook(
    input_str: impl AsRef<str>,
    config: &CookbookConfig,
) -> Result<CookbookOutput, CookbookError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Building cookbook from {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let archive = tokio::task::spawn_blocking(move || RecipeArchive::open_path(&path))
        .await
        .map_err(|e| CookbookError::Internal(format!("archive task panicked: {e}")))??;

    // `resolved` keeps a downloaded temp file alive until the build is done.
    let output = build_from_archive(archive, config, start).await;
    drop(resolved);
    output
}

/// Build a cookbook from archive bytes already in memory (e.g. an upload).
pub async fn build_cookbook_from_bytes(
    bytes: Vec<u8>,
    config: &CookbookConfig,
) -> Result<CookbookOutput, CookbookError> {
    let start = Instant::now();
    debug!("Building cookbook from {} bytes in memory", bytes.len());
    let archive = RecipeArchive::from_bytes(bytes)?;
    build_from_archive(archive, config, start).await
}

/// Build a cookbook and write its HTML (and PDF, if enabled) to
/// `config.output_dir`.
pub async fn publish(
    input_str: impl AsRef<str>,
    config: &CookbookConfig,
) -> Result<PublishedCookbook, CookbookError> {
    let output = build_cookbook(input_str, config).await?;
    write_outputs(output, config).await
}

/// [`publish`] for archive bytes held in memory.
pub async fn publish_from_bytes(
    bytes: Vec<u8>,
    config: &CookbookConfig,
) -> Result<PublishedCookbook, CookbookError> {
    let output = build_cookbook_from_bytes(bytes, config).await?;
    write_outputs(output, config).await
}

/// Synchronous wrapper around [`publish`].
///
/// Creates a temporary tokio runtime internally.
pub fn publish_sync(
    input_str: impl AsRef<str>,
    config: &CookbookConfig,
) -> Result<PublishedCookbook, CookbookError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CookbookError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(publish(input_str, config))
}

/// List what an archive holds without decoding any record.
///
/// Uses `config.recipe_suffix` to pick recipe entries and
/// `config.download_timeout_secs` when `input_str` is a URL.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &CookbookConfig,
) -> Result<ArchiveInventory, CookbookError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let path = resolved.path().to_path_buf();
    let suffix = config.recipe_suffix.clone();
    tokio::task::spawn_blocking(move || {
        let archive = RecipeArchive::open_path(&path)?;
        let recipe_entries = archive.recipe_entries(&suffix);
        let image_entries: Vec<String> = archive
            .image_entries()
            .into_iter()
            .filter(|n| !recipe_entries.contains(n))
            .collect();
        let other_entries = archive
            .entry_names()
            .iter()
            .filter(|n| !recipe_entries.contains(n) && !image_entries.contains(n))
            .cloned()
            .collect();
        Ok(ArchiveInventory {
            recipe_entries,
            image_entries,
            other_entries,
        })
    })
    .await
    .map_err(|e| CookbookError::Internal(format!("inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// A decoded record with its photo bytes, before photo preparation.
struct Extracted {
    record_index: usize,
    recipe: Recipe,
    photo_bytes: Option<Vec<u8>>,
}

async fn build_from_archive<R>(
    archive: RecipeArchive<R>,
    config: &CookbookConfig,
    start: Instant,
) -> Result<CookbookOutput, CookbookError>
where
    R: Read + Seek + Send + 'static,
{
    // ── Step 1: Decode records ───────────────────────────────────────────
    let parse_start = Instant::now();
    let suffix = config.recipe_suffix.clone();
    let callback = config.progress_callback.clone();
    let (mut records, extracted) =
        tokio::task::spawn_blocking(move || extract_records(archive, &suffix, callback.as_ref()))
            .await
            .map_err(|e| CookbookError::Internal(format!("decode task panicked: {e}")))??;
    let parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    let total = records.len();
    let parsed = extracted.len();
    if parsed == 0 {
        let first_error = records
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(CookbookError::NoRecipesParsed { total, first_error });
    }
    info!("Decoded {}/{} records in {}ms", parsed, total, parse_duration_ms);

    // ── Step 2: Prepare photos ───────────────────────────────────────────
    let photo_start = Instant::now();
    let mut recipes = prepare_photos(extracted, config, &mut records).await;
    let photo_duration_ms = photo_start.elapsed().as_millis() as u64;
    let photos_embedded = recipes.iter().filter(|r| r.photo.is_some()).count();
    let photos_optimized = recipes
        .iter()
        .filter(|r| r.photo.as_ref().is_some_and(|p| p.optimized))
        .count();
    debug!(
        "Embedded {} photos ({} optimised) in {}ms",
        photos_embedded, photos_optimized, photo_duration_ms
    );

    // ── Step 3: Order ────────────────────────────────────────────────────
    sort_recipes(&mut recipes, config.sort_order);

    // ── Step 4: Render HTML ──────────────────────────────────────────────
    let html = html::render_document(
        &recipes,
        &config.author_name,
        config.effective_year(),
        config.extended_fields,
    );

    let stats = CookbookStats {
        total_entries: total,
        parsed,
        failed: total - parsed,
        photos_embedded,
        photos_optimized,
        html_bytes: html.len(),
        parse_duration_ms,
        photo_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Cookbook assembled: {} recipes, {} KB HTML, {}ms total",
        parsed,
        stats.html_bytes / 1024,
        stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, parsed);
    }

    Ok(CookbookOutput {
        html,
        recipes,
        records,
        stats,
    })
}

/// Decode every recipe entry and pull its photo bytes out of the archive.
///
/// Blocking: runs inside `spawn_blocking`.
fn extract_records<R: Read + Seek>(
    mut archive: RecipeArchive<R>,
    suffix: &str,
    callback: Option<&ProgressCallback>,
) -> Result<(Vec<RecordResult>, Vec<Extracted>), CookbookError> {
    let entries = archive.recipe_entries(suffix);
    if entries.is_empty() {
        return Err(CookbookError::NoRecipeFiles {
            suffix: suffix.to_string(),
        });
    }
    let total = entries.len();
    if let Some(cb) = callback {
        cb.on_conversion_start(total);
    }

    let mut records = Vec::with_capacity(total);
    let mut extracted = Vec::with_capacity(total);

    for (i, entry) in entries.iter().enumerate() {
        let index = i + 1;
        if let Some(cb) = callback {
            cb.on_record_start(index, total, entry);
        }

        let decoded = archive
            .read(entry)
            .map_err(|detail| RecordError::ReadFailed {
                entry: entry.clone(),
                detail,
            })
            .and_then(|bytes| decode_record(entry, &bytes));

        let raw = match decoded {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping record: {}", e);
                if let Some(cb) = callback {
                    cb.on_record_error(index, total, &e.to_string());
                }
                records.push(RecordResult {
                    entry: entry.clone(),
                    recipe_name: None,
                    has_photo: false,
                    error: Some(e),
                });
                continue;
            }
        };

        let photo_bytes = match raw.photo_source() {
            PhotoSource::Embedded(data) => photo::decode_base64_photo(&data),
            PhotoSource::Referenced(reference) => match archive.find_by_basename(&reference) {
                Some(name) => archive
                    .read(&name)
                    .map_err(|e| warn!("Photo {} unreadable: {}", name, e))
                    .ok(),
                None => {
                    debug!("Photo '{}' for {} not in archive", reference, entry);
                    None
                }
            },
            PhotoSource::None => None,
        };

        let recipe = raw.into_recipe(entry);
        if let Some(cb) = callback {
            cb.on_record_complete(index, total, &recipe.name);
        }
        records.push(RecordResult {
            entry: entry.clone(),
            recipe_name: Some(recipe.name.clone()),
            has_photo: false,
            error: None,
        });
        extracted.push(Extracted {
            record_index: records.len() - 1,
            recipe,
            photo_bytes,
        });
    }

    Ok((records, extracted))
}

/// Resize and encode photos concurrently, `config.concurrency` at a time.
async fn prepare_photos(
    extracted: Vec<Extracted>,
    config: &CookbookConfig,
    records: &mut [RecordResult],
) -> Vec<Recipe> {
    let optimize = config.optimize_photos;
    let max_width = config.max_image_width;
    let quality = config.jpeg_quality;

    let jobs = extracted.into_iter().enumerate();
    let mut prepared: Vec<(usize, usize, Recipe)> = stream::iter(jobs.map(
        |(order, item)| async move {
            let Extracted {
                record_index,
                mut recipe,
                photo_bytes,
            } = item;
            if let Some(bytes) = photo_bytes {
                let entry = recipe.entry.clone();
                recipe.photo = tokio::task::spawn_blocking(move || {
                    photo::prepare_photo(&bytes, optimize, max_width, quality)
                })
                .await
                .unwrap_or_else(|e| {
                    warn!("Photo task for {} failed: {}", entry, e);
                    None
                });
            }
            (order, record_index, recipe)
        },
    ))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    prepared.sort_by_key(|(order, _, _)| *order);
    prepared
        .into_iter()
        .map(|(_, record_index, recipe)| {
            if let Some(record) = records.get_mut(record_index) {
                record.has_photo = recipe.photo.is_some();
            }
            recipe
        })
        .collect()
}

fn sort_recipes(recipes: &mut [Recipe], order: SortOrder) {
    match order {
        SortOrder::Name => recipes.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::NameCaseInsensitive => recipes.sort_by_cached_key(|r| r.name.to_lowercase()),
        SortOrder::Archive => {}
    }
}

/// Write the HTML, then try the PDF.
async fn write_outputs(
    output: CookbookOutput,
    config: &CookbookConfig,
) -> Result<PublishedCookbook, CookbookError> {
    let id = new_document_id();
    let html_path = config.output_dir.join(html_file_name(&id));
    write_atomic(&html_path, output.html.as_bytes()).await?;
    info!("Wrote {}", html_path.display());

    let (pdf_path, pdf_error) = match pdf::renderer_for(config) {
        None => (None, None),
        Some(renderer) => {
            let pdf_path = config.output_dir.join(pdf_file_name(&id));
            match renderer.render(&html_path, &pdf_path).await {
                Ok(()) => (Some(pdf_path), None),
                Err(e) => {
                    warn!("PDF not produced: {}", e);
                    let _ = tokio::fs::remove_file(&pdf_path).await;
                    (None, Some(e.to_string()))
                }
            }
        }
    };

    Ok(PublishedCookbook {
        id,
        html_path,
        pdf_path,
        pdf_error,
        records: output.records,
        stats: output.stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<Recipe> {
        names
            .iter()
            .map(|n| Recipe {
                name: n.to_string(),
                ..Recipe::default()
            })
            .collect()
    }

    fn names(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn sort_by_name_is_code_point_order() {
        let mut r = named(&["banana", "Cherry", "apple"]);
        sort_recipes(&mut r, SortOrder::Name);
        assert_eq!(names(&r), vec!["Cherry", "apple", "banana"]);
    }

    #[test]
    fn case_insensitive_sort_is_stable() {
        let mut r = named(&["banana", "Apple", "apple", "Cherry"]);
        sort_recipes(&mut r, SortOrder::NameCaseInsensitive);
        assert_eq!(names(&r), vec!["Apple", "apple", "banana", "Cherry"]);
    }

    #[test]
    fn archive_order_is_untouched() {
        let mut r = named(&["b", "a"]);
        sort_recipes(&mut r, SortOrder::Archive);
        assert_eq!(names(&r), vec!["b", "a"]);
    }
}
