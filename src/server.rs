//! Upload form web service.
//!
//! `GET /` serves a form asking for a cover name and a `.paprikarecipes`
//! file; `POST /` publishes the cookbook into the configured output directory
//! and answers with download links served from `GET /downloads/{file}`.

use crate::config::{normalize_author, CookbookConfig};
use crate::convert::publish_from_bytes;
use crate::error::CookbookError;
use crate::output::PublishedCookbook;
use crate::pipeline::text::escape_html;
use crate::publish::resolve_download;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Base configuration; the form's name field overrides `author_name`.
    pub config: Arc<CookbookConfig>,
}

impl AppState {
    pub fn new(config: CookbookConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Build the router with all endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(upload_form).post(create_cookbook))
        .route("/downloads/{file}", get(download))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, config: CookbookConfig) -> Result<(), std::io::Error> {
    info!(
        "Serving cookbook uploads on http://{} (output dir {})",
        addr,
        config.output_dir.display()
    );
    let app = build_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}

async fn create_cookbook(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut author = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(format!("Error reading file: {e}")),
        };
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => author = field.text().await.ok(),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                    Err(e) => return bad_request(format!("Error reading file: {e}")),
                }
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = upload else {
        return bad_request("No file uploaded!".to_string());
    };
    if file_name.is_empty() {
        return bad_request("No file selected".to_string());
    }

    let mut config = (*state.config).clone();
    config.author_name = normalize_author(author.as_deref().unwrap_or_default());
    info!(
        "Upload '{}' ({} bytes) for {}",
        file_name,
        bytes.len(),
        config.author_name
    );

    match publish_from_bytes(bytes, &config).await {
        Ok(published) => Html(result_page(&published)).into_response(),
        Err(e) => {
            warn!("Upload '{}' rejected: {}", file_name, e);
            bad_request(upload_error_message(&e))
        }
    }
}

async fn download(
    State(state): State<AppState>,
    axum::extract::Path(file): axum::extract::Path<String>,
) -> Response {
    let not_found = || (StatusCode::NOT_FOUND, "File not found.").into_response();
    let Some(path) = resolve_download(&state.config.output_dir, &file) else {
        return not_found();
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type_for(&file).to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{file}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!("Download {} failed: {}", path.display(), e);
            not_found()
        }
    }
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

/// The message shown for a failed upload.
pub fn upload_error_message(err: &CookbookError) -> String {
    match err {
        CookbookError::NoRecipeFiles { .. } => err.to_string(),
        CookbookError::NoRecipesParsed { .. } => "No recipes found in file!".to_string(),
        CookbookError::ArchiveUnreadable { detail } => format!("Error reading file: {detail}"),
        other => format!("Error reading file: {other}"),
    }
}

fn content_type_for(file: &str) -> &'static str {
    if file.ends_with(".pdf") {
        "application/pdf"
    } else if file.ends_with(".html") {
        "text/html; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

fn result_page(published: &PublishedCookbook) -> String {
    let pdf_link = match (published.pdf_file_name(), &published.pdf_error) {
        (Some(pdf), _) => {
            format!(r#"<a href="/downloads/{pdf}" class="download pdf">Download PDF</a>"#)
        }
        (None, Some(err)) => format!(
            r#"<p class="error">Could not create PDF: {}</p>"#,
            escape_html(err)
        ),
        (None, None) => String::new(),
    };
    format!(
        r#"<!doctype html>
<html>
<head>
    <title>Cookbook Created</title>
    <style>{RESULT_STYLE}</style>
</head>
<body>
    <div class="card">
        <h2>Cookbook Created!</h2>
        <p>{count} recipes were processed.</p>
        <div>
            {pdf_link}
            <a href="/downloads/{html}" class="download">Download HTML</a>
        </div>
        <br>
        <a href="/" class="back">Create New Cookbook</a>
        <p class="info">PDF generation may take a while for many recipes.</p>
    </div>
</body>
</html>
"#,
        count = published.recipe_count(),
        html = published.html_file_name(),
    )
}

const RESULT_STYLE: &str = "
        body { font-family: sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; background: #f4f4f4; }
        .card { background: white; padding: 40px; border-radius: 8px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); text-align: center; max-width: 500px; }
        a.download { display: inline-block; background: #27ae60; color: white; padding: 15px 30px; font-size: 1.1rem; text-decoration: none; border-radius: 4px; margin: 10px; }
        a.download.pdf { background: #e74c3c; }
        a.back { color: #e67e22; text-decoration: none; }
        .info { color: #666; font-size: 0.85rem; margin-top: 20px; }
        .error { color: #e74c3c; font-size: 0.85rem; }
";

const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
<head>
<title>Paprika to PDF</title>
<style>
    body { font-family: sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; background: #f4f4f4; }
    form { background: white; padding: 40px; border-radius: 8px; box-shadow: 0 4px 15px rgba(0,0,0,0.1); text-align: center; }
    input { margin: 10px 0; display: block; width: 100%; padding: 10px; }
    button { background: #e67e22; color: white; border: none; padding: 15px 30px; font-size: 1.2rem; cursor: pointer; border-radius: 4px; }
    button:disabled { background: #ccc; cursor: not-allowed; }
    .loader { display: none; margin: 20px 0; }
    .loader.active { display: block; }
    .spinner { border: 4px solid #f3f3f3; border-top: 4px solid #e67e22; border-radius: 50%; width: 40px; height: 40px; animation: spin 1s linear infinite; margin: 0 auto 15px; }
    @keyframes spin { 0% { transform: rotate(0deg); } 100% { transform: rotate(360deg); } }
</style>
</head>
<body>
<form method="post" enctype="multipart/form-data" onsubmit="document.getElementById('loader').classList.add('active');document.getElementById('submitBtn').disabled=true">
  <h2>Paprika Recipe Converter</h2>
  <label>Your name for the cover:</label>
  <input type="text" name="name" placeholder="Your Name" value="A Food Lover">
  <label>Select your .paprikarecipes file:</label>
  <input type="file" name="file" accept=".paprikarecipes,.zip">
  <button type="submit" id="submitBtn">Create Cookbook</button>
  <div class="loader" id="loader">
    <div class="spinner"></div>
    <div>Creating cookbook... (may take a moment)</div>
  </div>
</form>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CookbookStats;
    use std::path::PathBuf;

    fn published(pdf: Option<&str>, pdf_error: Option<&str>) -> PublishedCookbook {
        PublishedCookbook {
            id: "abcd1234".into(),
            html_path: PathBuf::from("/tmp/Cookbook_abcd1234.html"),
            pdf_path: pdf.map(PathBuf::from),
            pdf_error: pdf_error.map(str::to_string),
            records: vec![],
            stats: CookbookStats {
                parsed: 3,
                ..CookbookStats::default()
            },
        }
    }

    #[test]
    fn error_messages_match_upload_flow() {
        let e = CookbookError::NoRecipeFiles {
            suffix: ".paprikarecipe".into(),
        };
        assert_eq!(upload_error_message(&e), "No .paprikarecipe files found!");
        let e = CookbookError::NoRecipesParsed {
            total: 2,
            first_error: "x".into(),
        };
        assert_eq!(upload_error_message(&e), "No recipes found in file!");
        let e = CookbookError::ArchiveUnreadable {
            detail: "invalid Zip archive".into(),
        };
        assert_eq!(upload_error_message(&e), "Error reading file: invalid Zip archive");
    }

    #[test]
    fn result_page_links_both_files() {
        let page = result_page(&published(Some("/tmp/Cookbook_abcd1234.pdf"), None));
        assert!(page.contains("3 recipes were processed."));
        assert!(page.contains(r#"href="/downloads/Cookbook_abcd1234.pdf""#));
        assert!(page.contains(r#"href="/downloads/Cookbook_abcd1234.html""#));
    }

    #[test]
    fn result_page_shows_escaped_pdf_error() {
        let page = result_page(&published(None, Some("weasyprint <missing>")));
        assert!(page.contains("Could not create PDF: weasyprint &lt;missing&gt;"));
        assert!(!page.contains("Download PDF"));
        assert!(page.contains("Download HTML"));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("a.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }
}
