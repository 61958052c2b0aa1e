//! Browser executable resolution, one strategy per deployment shape.
//!
//! The strategy is picked once at startup from [`RenderEnvironment`]; call
//! sites only ever see `Arc<dyn BrowserLocator>`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::CaptureError;

/// Flags every strategy passes. Containers and serverless sandboxes do not
/// allow the setuid/namespace sandbox, and /dev/shm is tiny in Docker.
const BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--font-render-hinting=none",
];

/// Extra flags for single-core, read-only-root function runtimes.
const SERVERLESS_ARGS: &[&str] = &["--single-process", "--no-zygote"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEnvironment {
    /// Developer machine with a desktop browser installed.
    Local,
    /// General-purpose server or container.
    Server,
    /// Constrained function runtime with a specially packaged binary.
    Serverless,
}

impl RenderEnvironment {
    /// Infers the environment from well-known platform markers.
    ///
    /// `var` abstracts `std::env::var` so detection is testable.
    pub fn detect(var: impl Fn(&str) -> Option<String>, in_container: bool) -> Self {
        if var("AWS_LAMBDA_FUNCTION_NAME").is_some() || var("VERCEL").is_some() {
            RenderEnvironment::Serverless
        } else if in_container || var("KUBERNETES_SERVICE_HOST").is_some() {
            RenderEnvironment::Server
        } else {
            RenderEnvironment::Local
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderEnvironment::Local => "local",
            RenderEnvironment::Server => "server",
            RenderEnvironment::Serverless => "serverless",
        }
    }
}

impl FromStr for RenderEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "desktop" => Ok(RenderEnvironment::Local),
            "server" | "container" => Ok(RenderEnvironment::Server),
            "serverless" | "lambda" => Ok(RenderEnvironment::Serverless),
            other => Err(format!("unknown render environment '{other}'")),
        }
    }
}

impl fmt::Display for RenderEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait BrowserLocator: Send + Sync + fmt::Debug {
    /// Strategy name for logs.
    fn strategy(&self) -> &'static str;

    /// Resolves the executable to launch.
    fn executable(&self) -> Result<PathBuf, CaptureError>;

    fn launch_args(&self) -> Vec<&'static str> {
        BASE_ARGS.to_vec()
    }
}

/// Builds the strategy for `env`. An explicit `chrome_path` wins over any
/// probing the strategy would do.
pub fn select_locator(
    env: RenderEnvironment,
    chrome_path: Option<PathBuf>,
) -> Arc<dyn BrowserLocator> {
    match env {
        RenderEnvironment::Local => Arc::new(LocalDesktopLocator {
            explicit: chrome_path,
        }),
        RenderEnvironment::Server => Arc::new(BundledLocator {
            explicit: chrome_path,
        }),
        RenderEnvironment::Serverless => Arc::new(ServerlessLocator {
            explicit: chrome_path,
        }),
    }
}

fn first_existing<'a>(
    candidates: impl IntoIterator<Item = &'a Path>,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    candidates
        .into_iter()
        .find(|p| exists(p))
        .map(Path::to_path_buf)
}

fn explicit_or_missing(
    explicit: &Option<PathBuf>,
    strategy: &'static str,
) -> Option<Result<PathBuf, CaptureError>> {
    explicit.as_ref().map(|path| {
        if path.exists() {
            Ok(path.clone())
        } else {
            Err(CaptureError::NoExecutable {
                strategy,
                detail: format!("CHROME_PATH {} does not exist", path.display()),
            })
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Local desktop
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct LocalDesktopLocator {
    explicit: Option<PathBuf>,
}

impl LocalDesktopLocator {
    fn candidates() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        if cfg!(target_os = "windows") {
            paths.push(r"C:\Program Files\Google\Chrome\Application\chrome.exe".into());
            paths.push(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe".into());
            if let Some(local) = std::env::var_os("LOCALAPPDATA") {
                paths.push(PathBuf::from(local).join(r"Google\Chrome\Application\chrome.exe"));
            }
            paths.push(r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe".into());
        } else if cfg!(target_os = "macos") {
            paths.push("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into());
            paths.push("/Applications/Chromium.app/Contents/MacOS/Chromium".into());
            paths.push("/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge".into());
        } else {
            paths.push("/usr/bin/google-chrome".into());
            paths.push("/usr/bin/google-chrome-stable".into());
            paths.push("/usr/bin/chromium-browser".into());
            paths.push("/usr/bin/chromium".into());
            paths.push("/snap/bin/chromium".into());
        }
        paths
    }
}

impl BrowserLocator for LocalDesktopLocator {
    fn strategy(&self) -> &'static str {
        "local-desktop"
    }

    fn executable(&self) -> Result<PathBuf, CaptureError> {
        if let Some(result) = explicit_or_missing(&self.explicit, self.strategy()) {
            return result;
        }
        let candidates = Self::candidates();
        first_existing(candidates.iter().map(PathBuf::as_path), Path::exists).ok_or_else(|| {
            CaptureError::NoExecutable {
                strategy: self.strategy(),
                detail: format!("probed {} install locations", candidates.len()),
            }
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bundled / managed binary (server containers)
// ────────────────────────────────────────────────────────────────────────────

/// Where container images conventionally install their browser.
const BUNDLED_CANDIDATES: &[&str] = &[
    "/headless-shell/headless-shell",
    "/usr/lib/chromium/chromium",
    "/usr/lib/chromium-browser/chromium-browser",
    "/opt/google/chrome/chrome",
];

#[derive(Debug)]
pub struct BundledLocator {
    explicit: Option<PathBuf>,
}

impl BundledLocator {
    /// Image paths first, then the driver's own `CHROME`/`PATH` lookup.
    fn resolve(
        &self,
        exists: impl Fn(&Path) -> bool,
        lookup: impl FnOnce() -> Result<PathBuf, String>,
    ) -> Result<PathBuf, CaptureError> {
        if let Some(path) = first_existing(BUNDLED_CANDIDATES.iter().map(|p| Path::new(*p)), exists) {
            return Ok(path);
        }
        lookup().map_err(|detail| CaptureError::NoExecutable {
            strategy: self.strategy(),
            detail,
        })
    }
}

impl BrowserLocator for BundledLocator {
    fn strategy(&self) -> &'static str {
        "bundled"
    }

    fn executable(&self) -> Result<PathBuf, CaptureError> {
        if let Some(result) = explicit_or_missing(&self.explicit, self.strategy()) {
            return result;
        }
        self.resolve(Path::exists, headless_chrome::browser::default_executable)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Serverless packaged binary
// ────────────────────────────────────────────────────────────────────────────

const SERVERLESS_CANDIDATES: &[&str] = &[
    "/opt/chromium",
    "/opt/bin/chromium",
    "/opt/chrome/chrome",
    "/tmp/chromium",
];

#[derive(Debug)]
pub struct ServerlessLocator {
    explicit: Option<PathBuf>,
}

impl BrowserLocator for ServerlessLocator {
    fn strategy(&self) -> &'static str {
        "serverless"
    }

    fn executable(&self) -> Result<PathBuf, CaptureError> {
        if let Some(result) = explicit_or_missing(&self.explicit, self.strategy()) {
            return result;
        }
        first_existing(SERVERLESS_CANDIDATES.iter().map(|p| Path::new(*p)), Path::exists).ok_or_else(
            || CaptureError::NoExecutable {
                strategy: self.strategy(),
                detail: format!("none of {SERVERLESS_CANDIDATES:?} exist"),
            },
        )
    }

    fn launch_args(&self) -> Vec<&'static str> {
        BASE_ARGS.iter().chain(SERVERLESS_ARGS).copied().collect()
    }
}
