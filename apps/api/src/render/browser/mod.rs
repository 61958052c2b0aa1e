//! Headless browser capture: HTML in, PDF bytes out.
//!
//! `AppState` holds an `Arc<dyn PageCapture>`. Production uses
//! [`HeadlessChromeCapture`]; tests swap in fakes so no browser binary is
//! needed.

mod chrome;
pub mod locator;

use async_trait::async_trait;
use thiserror::Error;

pub use chrome::HeadlessChromeCapture;
pub use locator::{select_locator, BrowserLocator, RenderEnvironment};

/// A4 in inches, the unit the DevTools print API expects.
pub const A4_WIDTH_IN: f64 = 8.27;
pub const A4_HEIGHT_IN: f64 = 11.69;
/// 1cm in inches.
pub const MARGIN_IN: f64 = 0.3937;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no browser executable found ({strategy}): {detail}")]
    NoExecutable {
        strategy: &'static str,
        detail: String,
    },

    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("page load failed: {0}")]
    Navigation(String),

    #[error("print to PDF failed: {0}")]
    Print(String),

    #[error("capture timed out after {0}s")]
    Timeout(u64),

    #[error("capture cancelled")]
    Cancelled,

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Short stable label used in logs and the fallback reason.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureError::NoExecutable { .. } => "no_executable",
            CaptureError::BrowserLaunch(_) => "browser_launch",
            CaptureError::Navigation(_) => "navigation",
            CaptureError::Print(_) => "print",
            CaptureError::Timeout(_) => "timeout",
            CaptureError::Cancelled => "cancelled",
            CaptureError::Io(_) => "io",
        }
    }
}

/// Rasterizes an HTML document to PDF bytes.
///
/// Implementations own the browser process for exactly one call and must
/// release it on every exit path. A call that stops waiting on a stuck
/// browser keeps its concurrency slot until the process is gone.
#[async_trait]
pub trait PageCapture: Send + Sync {
    /// Name of the capture method, for logs.
    fn method(&self) -> &str;

    async fn capture(&self, html: &str) -> Result<Vec<u8>, CaptureError>;
}
