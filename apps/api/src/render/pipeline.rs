//! Render → capture → validate → (fallback) sequencing.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::cv::CvData;
use crate::render::browser::PageCapture;
use crate::render::fallback::{render_fallback_pdf, FallbackError};
use crate::render::signature::{has_pdf_signature, is_valid_pdf, signature_hex};
use crate::render::templates::{render_html, Template};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Raised only when both the primary capture and the fallback failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Fallback(#[from] FallbackError),

    #[error("fallback output failed signature check (leading bytes: {0})")]
    FallbackSignature(String),
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub buffer: Vec<u8>,
    pub filename: String,
    pub is_fallback: bool,
    pub content_type: &'static str,
}

/// Browser-free renderer run after a failed or rejected capture.
pub type FallbackRenderer = fn(&CvData) -> Result<Vec<u8>, FallbackError>;

#[derive(Clone)]
pub struct PdfPipeline {
    capture: Arc<dyn PageCapture>,
    fallback: FallbackRenderer,
    /// Dump every primary PDF to the temp dir for inspection.
    dev_mode: bool,
}

impl PdfPipeline {
    pub fn new(capture: Arc<dyn PageCapture>, dev_mode: bool) -> Self {
        Self {
            capture,
            fallback: render_fallback_pdf,
            dev_mode,
        }
    }

    /// Replaces the printpdf renderer. Its output is still signature-checked.
    pub fn with_fallback(mut self, fallback: FallbackRenderer) -> Self {
        self.fallback = fallback;
        self
    }

    /// Produces a PDF for `cv`, falling back to the browser-free renderer on
    /// any capture failure or invalid capture output.
    pub async fn generate(&self, cv: &CvData, template: Template) -> Result<RenderResult, RenderError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let filename = safe_filename(&cv.personal_info.full_name, "pdf");

        let html = render_html(cv, template);
        info!(
            %request_id,
            template = %template,
            method = self.capture.method(),
            html_bytes = html.len(),
            "Attempting primary PDF capture"
        );

        let reason = match self.capture.capture(&html).await {
            Ok(buffer) if is_valid_pdf(&buffer) => {
                info!(
                    %request_id,
                    bytes = buffer.len(),
                    signature = %signature_hex(&buffer),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Primary PDF capture succeeded"
                );
                if self.dev_mode {
                    dump_debug_pdf(request_id, &buffer).await;
                }
                return Ok(RenderResult {
                    buffer,
                    filename,
                    is_fallback: false,
                    content_type: PDF_CONTENT_TYPE,
                });
            }
            Ok(buffer) => {
                warn!(
                    %request_id,
                    bytes = buffer.len(),
                    signature = %signature_hex(&buffer),
                    "Primary capture output rejected by signature check"
                );
                "invalid_output"
            }
            Err(e) => {
                warn!(
                    %request_id,
                    kind = e.kind(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Primary PDF capture failed"
                );
                e.kind()
            }
        };

        info!(%request_id, reason, "Rendering fallback PDF");
        let buffer = (self.fallback)(cv).map_err(|e| {
            error!(%request_id, error = %e, "Fallback renderer failed");
            RenderError::from(e)
        })?;

        if !has_pdf_signature(&buffer) {
            let leading = signature_hex(&buffer);
            error!(%request_id, signature = %leading, "Fallback output is not a PDF");
            return Err(RenderError::FallbackSignature(leading));
        }

        info!(
            %request_id,
            bytes = buffer.len(),
            signature = %signature_hex(&buffer),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fallback PDF ready"
        );

        Ok(RenderResult {
            buffer,
            filename,
            is_fallback: true,
            content_type: PDF_CONTENT_TYPE,
        })
    }
}

async fn dump_debug_pdf(request_id: Uuid, buffer: &[u8]) {
    let path = std::env::temp_dir().join(format!("cvgen-debug-{request_id}.pdf"));
    match tokio::fs::write(&path, buffer).await {
        Ok(()) => info!(path = %path.display(), "Wrote debug PDF"),
        Err(e) => warn!(path = %path.display(), error = %e, "Could not write debug PDF"),
    }
}

/// `<name>.<ext>` with every character outside `[A-Za-z0-9.-]` replaced by
/// `_`, whitespace included. An empty name becomes `cv`.
pub fn safe_filename(full_name: &str, ext: &str) -> String {
    let stem: String = if full_name.is_empty() {
        "cv".to_string()
    } else {
        full_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("{stem}.{ext}")
}

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;

    use crate::render::browser::{CaptureError, PageCapture};

    /// Returns a well-formed buffer that passes the signature check.
    pub struct ValidCapture;

    #[async_trait]
    impl PageCapture for ValidCapture {
        fn method(&self) -> &str {
            "fake-valid"
        }

        async fn capture(&self, _html: &str) -> Result<Vec<u8>, CaptureError> {
            let mut buf = b"%PDF-1.7\n".to_vec();
            buf.resize(4096, b' ');
            Ok(buf)
        }
    }

    pub struct FailingCapture;

    #[async_trait]
    impl PageCapture for FailingCapture {
        fn method(&self) -> &str {
            "fake-failing"
        }

        async fn capture(&self, _html: &str) -> Result<Vec<u8>, CaptureError> {
            Err(CaptureError::BrowserLaunch("no display".to_string()))
        }
    }

    /// Carries the signature but is too short to be a real document.
    pub struct TruncatedCapture;

    #[async_trait]
    impl PageCapture for TruncatedCapture {
        fn method(&self) -> &str {
            "fake-truncated"
        }

        async fn capture(&self, _html: &str) -> Result<Vec<u8>, CaptureError> {
            let mut buf = b"%PDF-1.7\n".to_vec();
            buf.resize(500, b' ');
            Ok(buf)
        }
    }

    /// Returns bytes that look like a compressed HTML error page.
    pub struct GarbageCapture;

    #[async_trait]
    impl PageCapture for GarbageCapture {
        fn method(&self) -> &str {
            "fake-garbage"
        }

        async fn capture(&self, _html: &str) -> Result<Vec<u8>, CaptureError> {
            let mut buf = vec![0x1f, 0x8b, 0x08];
            buf.resize(4096, 0);
            Ok(buf)
        }
    }
}
