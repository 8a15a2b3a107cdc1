//! Upload-form service tests against a live listener on 127.0.0.1.
#![cfg(feature = "server")]

use flate2::write::GzEncoder;
use flate2::Compression;
use paprika_cookbook::server::{build_router, AppState};
use paprika_cookbook::{CookbookConfig, PdfEngine};
use reqwest::multipart::{Form, Part};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

fn sample_archive() -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(br#"{"name":"Pancakes","ingredients":"1 egg","directions":"Mix.\nFry."}"#)
        .unwrap();
    let record = enc.finish().unwrap();

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("Pancakes.paprikarecipe", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&record).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Start the service on an ephemeral port; returns its base URL.
async fn spawn_server(output_dir: &Path) -> String {
    let config = CookbookConfig::builder()
        .output_dir(output_dir)
        .pdf_engine(PdfEngine::Disabled)
        .build()
        .unwrap();
    let app = build_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_form_and_health() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let form = client.get(&base).send().await.unwrap();
    assert_eq!(form.status(), 200);
    let body = form.text().await.unwrap();
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains("A Food Lover"));

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);
    let json: serde_json::Value = serde_json::from_str(&health.text().await.unwrap()).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_upload_then_download() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let form = Form::new().text("name", "Ana").part(
        "file",
        Part::bytes(sample_archive()).file_name("Export.paprikarecipes"),
    );
    let resp = client.post(&base).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let page = resp.text().await.unwrap();
    assert!(page.contains("Cookbook Created!"));
    assert!(page.contains("1 recipes were processed."));

    let html_name = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .find(|n| n.starts_with("Cookbook_") && n.ends_with(".html"))
        .expect("published HTML");
    assert!(page.contains(&format!("/downloads/{html_name}")));

    let download = client
        .get(format!("{base}/downloads/{html_name}"))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), 200);
    let disposition = download
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    let html = download.text().await.unwrap();
    assert!(html.contains("<strong>Ana</strong>"));
    assert!(html.contains("Pancakes"));
}

#[tokio::test]
async fn test_upload_errors() {
    let dir = tempfile::tempdir().unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(&base)
        .multipart(Form::new().text("name", "Ana"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "No file uploaded!");

    // A browser submits an empty file part with `filename=""`.
    let form = Form::new()
        .text("name", "Ana")
        .part("file", Part::bytes(Vec::new()).file_name(""));
    let resp = client.post(&base).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), "No file selected");

    let form = Form::new().part(
        "file",
        Part::bytes(b"not a zip".to_vec()).file_name("Export.paprikarecipes"),
    );
    let resp = client.post(&base).multipart(form).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert!(resp.text().await.unwrap().starts_with("Error reading file:"));
}

#[tokio::test]
async fn test_unknown_download_is_404() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"x").unwrap();
    let base = spawn_server(dir.path()).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/downloads/Cookbook_missing.pdf"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{base}/downloads/..%2Fsecret.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Present in the output directory, but not a published cookbook.
    let resp = client
        .get(format!("{base}/downloads/secret.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
