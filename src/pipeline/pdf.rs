//! HTML → PDF via an external renderer process.
//!
//! Laying out paged media is delegated entirely to a third-party program.
//! [`PdfRenderer`] is the seam: the default [`CommandRenderer`] shells out
//! to WeasyPrint, wkhtmltopdf, headless Chromium or a user-supplied command,
//! and tests substitute an in-process fake.

use crate::config::{CookbookConfig, PdfEngine};
use crate::error::CookbookError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Bytes of stderr kept in a failure message.
const STDERR_TAIL: usize = 800;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Turns an HTML file on disk into a PDF file on disk.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Short name for logs and error messages.
    fn name(&self) -> &str;

    /// Render `html_path` into `pdf_path`.
    async fn render(&self, html_path: &Path, pdf_path: &Path) -> Result<(), CookbookError>;
}

/// Runs an external program with argument templates.
///
/// `{input}` and `{output}` in `args` are replaced with the HTML and PDF
/// paths.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout_secs: u64) -> Self {
        let mut args = args;
        if !args.iter().any(|a| a.contains("{input}")) {
            args.push("{input}".to_string());
        }
        if !args.iter().any(|a| a.contains("{output}")) {
            args.push("{output}".to_string());
        }
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    pub fn weasyprint(timeout_secs: u64) -> Self {
        Self::new("weasyprint", vec![], timeout_secs)
    }

    pub fn wkhtmltopdf(timeout_secs: u64) -> Self {
        Self::new(
            "wkhtmltopdf",
            vec![
                "--quiet".into(),
                "--enable-local-file-access".into(),
                "{input}".into(),
                "{output}".into(),
            ],
            timeout_secs,
        )
    }

    pub fn chromium(timeout_secs: u64) -> Self {
        Self::new(
            "chromium",
            vec![
                "--headless".into(),
                "--disable-gpu".into(),
                "--no-pdf-header-footer".into(),
                "--print-to-pdf={output}".into(),
                "{input}".into(),
            ],
            timeout_secs,
        )
    }

    /// The argument list with placeholders substituted.
    pub fn command_args(&self, html_path: &Path, pdf_path: &Path) -> Vec<String> {
        let input = html_path.to_string_lossy();
        let output = pdf_path.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace("{input}", &input).replace("{output}", &output))
            .collect()
    }
}

#[async_trait]
impl PdfRenderer for CommandRenderer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn render(&self, html_path: &Path, pdf_path: &Path) -> Result<(), CookbookError> {
        let args = self.command_args(html_path, pdf_path);
        debug!("Running {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CookbookError::RendererUnavailable {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CookbookError::RenderTimeout {
                program: self.program.clone(),
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| CookbookError::PdfRenderFailed {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CookbookError::PdfRenderFailed {
                program: self.program.clone(),
                detail: format!(
                    "exited with {}: {}",
                    output.status,
                    stderr_tail(&output.stderr)
                ),
            });
        }

        verify_pdf(&self.program, pdf_path).await?;
        info!("{} wrote {}", self.program, pdf_path.display());
        Ok(())
    }
}

/// Renderer for the configured engine. `None` when PDF output is disabled.
pub fn renderer_for(config: &CookbookConfig) -> Option<Arc<dyn PdfRenderer>> {
    if let Some(ref r) = config.pdf_renderer {
        return Some(Arc::clone(r));
    }
    let secs = config.render_timeout_secs;
    let renderer = match &config.pdf_engine {
        PdfEngine::WeasyPrint => CommandRenderer::weasyprint(secs),
        PdfEngine::Wkhtmltopdf => CommandRenderer::wkhtmltopdf(secs),
        PdfEngine::Chromium => CommandRenderer::chromium(secs),
        PdfEngine::Command { program, args } => CommandRenderer::new(program, args.clone(), secs),
        PdfEngine::Disabled => return None,
    };
    Some(Arc::new(renderer))
}

/// The output must exist and carry the PDF magic; some renderers exit 0
/// after printing an error.
async fn verify_pdf(program: &str, pdf_path: &Path) -> Result<(), CookbookError> {
    let bytes = tokio::fs::read(pdf_path)
        .await
        .map_err(|e| CookbookError::PdfRenderFailed {
            program: program.to_string(),
            detail: format!("no output at {}: {}", pdf_path.display(), e),
        })?;
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(CookbookError::PdfRenderFailed {
            program: program.to_string(),
            detail: "output is not a PDF".to_string(),
        });
    }
    Ok(())
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("…{}", &text[start..])
}
