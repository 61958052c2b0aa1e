use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{BrowserLocator, CaptureError, PageCapture, A4_HEIGHT_IN, A4_WIDTH_IN, MARGIN_IN};

/// Time allowed past the deadline for the blocking worker to notice it and
/// tear the browser down.
const TEARDOWN_GRACE: Duration = Duration::from_secs(5);

/// Launches one headless Chrome per capture.
///
/// The DevTools client is synchronous, so each capture runs on the blocking
/// pool behind a [`WorkerGate`].
pub struct HeadlessChromeCapture {
    locator: Arc<dyn BrowserLocator>,
    timeout: Duration,
    gate: WorkerGate,
}

impl HeadlessChromeCapture {
    pub fn new(locator: Arc<dyn BrowserLocator>, timeout: Duration, max_concurrent: usize) -> Self {
        Self {
            locator,
            timeout,
            gate: WorkerGate::new(max_concurrent, timeout),
        }
    }
}

#[async_trait]
impl PageCapture for HeadlessChromeCapture {
    fn method(&self) -> &str {
        "headless-chrome"
    }

    async fn capture(&self, html: &str) -> Result<Vec<u8>, CaptureError> {
        let executable = self.locator.executable()?;
        let args = self.locator.launch_args();
        let html = html.to_string();
        let timeout = self.timeout;
        info!(
            strategy = self.locator.strategy(),
            executable = %executable.display(),
            "Launching headless browser"
        );

        self.gate
            .run(move |cancelled| {
                CaptureJob {
                    executable,
                    args,
                    html,
                    deadline: Instant::now() + timeout,
                    timeout_secs: timeout.as_secs(),
                    cancelled,
                }
                .run()
            })
            .await
    }
}

/// Bounds concurrent blocking workers and their wall-clock time.
///
/// The permit moves into the worker and is released only when the worker
/// returns, so a caller that times out or is dropped never frees a slot
/// while its browser is still alive.
struct WorkerGate {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl WorkerGate {
    fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    async fn run<T, F>(&self, work: F) -> Result<T, CaptureError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<AtomicBool>) -> Result<T, CaptureError> + Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| CaptureError::Cancelled)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        // If this future is dropped (client went away) the guard flags the
        // worker, which drops the browser at its next checkpoint.
        let guard = CancelOnDrop::new(cancelled.clone());
        let flag = cancelled.clone();
        let worker = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work(flag)
        });

        let outcome = match tokio::time::timeout(self.timeout + TEARDOWN_GRACE, worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(CaptureError::BrowserLaunch(format!(
                "capture worker failed: {join_err}"
            ))),
            Err(_) => {
                cancelled.store(true, Ordering::SeqCst);
                warn!(
                    available = self.permits.available_permits(),
                    "Capture worker exceeded deadline and grace period; slot held until it exits"
                );
                Err(CaptureError::Timeout(self.timeout.as_secs()))
            }
        };

        guard.disarm();
        outcome
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

struct CancelOnDrop {
    flag: Arc<AtomicBool>,
    armed: bool,
}

impl CancelOnDrop {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Owns the browser for the duration of one capture. Dropping it kills the
/// process, whichever path leaves `CaptureJob::run`.
struct BrowserSession {
    browser: Browser,
    started: Instant,
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        debug!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Releasing headless browser"
        );
    }
}

struct CaptureJob {
    executable: PathBuf,
    args: Vec<&'static str>,
    html: String,
    deadline: Instant,
    timeout_secs: u64,
    cancelled: Arc<AtomicBool>,
}

impl CaptureJob {
    fn run(self) -> Result<Vec<u8>, CaptureError> {
        let options = self.launch_options()?;
        let session = BrowserSession {
            browser: Browser::new(options)
                .map_err(|e| self.classify(CaptureError::BrowserLaunch(format!("{e:#}"))))?,
            started: Instant::now(),
        };
        self.checkpoint()?;

        let tab = session
            .browser
            .new_tab()
            .map_err(|e| self.classify(CaptureError::BrowserLaunch(format!("{e:#}"))))?;
        tab.set_default_timeout(self.remaining()?);

        let page = write_page(&self.html)?;
        let url = file_url(page.path());
        tab.navigate_to(&url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| self.classify(CaptureError::Navigation(format!("{e:#}"))))?;
        self.checkpoint()?;

        tab.set_default_timeout(self.remaining()?);
        let pdf = tab
            .print_to_pdf(Some(print_options()))
            .map_err(|e| self.classify(CaptureError::Print(format!("{e:#}"))))?;

        debug!(bytes = pdf.len(), "Browser print completed");
        Ok(pdf)
    }

    fn launch_options(&self) -> Result<LaunchOptions<'static>, CaptureError> {
        LaunchOptions::default_builder()
            .path(Some(self.executable.clone()))
            .headless(true)
            .sandbox(false)
            .args(self.args.iter().map(|a| OsStr::new(*a)).collect())
            .idle_browser_timeout(self.remaining()?)
            .build()
            .map_err(|e| CaptureError::BrowserLaunch(e.to_string()))
    }

    fn remaining(&self) -> Result<Duration, CaptureError> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
            .ok_or(CaptureError::Timeout(self.timeout_secs))
    }

    fn checkpoint(&self) -> Result<(), CaptureError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(CaptureError::Cancelled);
        }
        self.remaining().map(|_| ())
    }

    /// A step that failed after the deadline passed failed because of it.
    fn classify(&self, err: CaptureError) -> CaptureError {
        if self.cancelled.load(Ordering::SeqCst) {
            CaptureError::Cancelled
        } else if Instant::now() >= self.deadline {
            CaptureError::Timeout(self.timeout_secs)
        } else {
            err
        }
    }
}

fn write_page(html: &str) -> Result<tempfile::NamedTempFile, CaptureError> {
    let mut file = tempfile::Builder::new()
        .prefix("cvgen-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    if raw.starts_with('/') {
        format!("file://{raw}")
    } else {
        format!("file:///{raw}")
    }
}

fn print_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        landscape: Some(false),
        display_header_footer: Some(false),
        print_background: Some(true),
        scale: Some(1.0),
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(MARGIN_IN),
        margin_bottom: Some(MARGIN_IN),
        margin_left: Some(MARGIN_IN),
        margin_right: Some(MARGIN_IN),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::browser::{select_locator, RenderEnvironment};

    #[test]
    fn test_file_url_forms() {
        assert_eq!(file_url(Path::new("/tmp/cv.html")), "file:///tmp/cv.html");
        assert_eq!(
            file_url(Path::new(r"C:\Temp\cv.html")),
            "file:///C:/Temp/cv.html"
        );
    }

    #[test]
    fn test_print_options_fix_paper_and_margins() {
        let opts = print_options();
        assert_eq!(opts.paper_width, Some(A4_WIDTH_IN));
        assert_eq!(opts.paper_height, Some(A4_HEIGHT_IN));
        assert_eq!(opts.margin_left, Some(MARGIN_IN));
        assert_eq!(opts.print_background, Some(true));
    }

    #[test]
    fn test_written_page_holds_html() {
        let page = write_page("<html><body>hi</body></html>").unwrap();
        let contents = std::fs::read_to_string(page.path()).unwrap();
        assert!(contents.contains("hi"));
        assert!(page.path().to_string_lossy().ends_with(".html"));
    }

    #[test]
    fn test_expired_deadline_reports_timeout() {
        let job = CaptureJob {
            executable: PathBuf::from("/nonexistent"),
            args: vec![],
            html: String::new(),
            deadline: Instant::now(),
            timeout_secs: 30,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        assert!(matches!(job.checkpoint(), Err(CaptureError::Timeout(30))));
    }

    #[test]
    fn test_cancel_flag_wins_over_step_error() {
        let job = CaptureJob {
            executable: PathBuf::from("/nonexistent"),
            args: vec![],
            html: String::new(),
            deadline: Instant::now() + Duration::from_secs(60),
            timeout_secs: 60,
            cancelled: Arc::new(AtomicBool::new(true)),
        };
        let err = job.classify(CaptureError::Print("boom".to_string()));
        assert!(matches!(err, CaptureError::Cancelled));
    }

    #[test]
    fn test_dropped_guard_sets_flag_and_disarmed_does_not() {
        let flag = Arc::new(AtomicBool::new(false));
        CancelOnDrop::new(flag.clone()).disarm();
        assert!(!flag.load(Ordering::SeqCst));
        drop(CancelOnDrop::new(flag.clone()));
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_slot_held_until_worker_exits_after_caller_drops() {
        let gate = Arc::new(WorkerGate::new(1, Duration::from_secs(30)));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let first = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(move |_| {
                    let _ = started_tx.send(());
                    let _ = release_rx.recv();
                    Ok(())
                })
                .await
            })
        };
        started_rx.await.unwrap();
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        // The first worker is still busy, so its slot is still taken.
        assert_eq!(gate.available(), 0);
        let second = tokio::time::timeout(Duration::from_millis(200), gate.run(|_| Ok(()))).await;
        assert!(second.is_err());

        release_tx.send(()).unwrap();
        let third = tokio::time::timeout(Duration::from_secs(5), gate.run(|_| Ok(7))).await;
        assert_eq!(third.unwrap().unwrap(), 7);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_dropped_caller_flags_worker() {
        let gate = Arc::new(WorkerGate::new(1, Duration::from_secs(30)));
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (seen_tx, seen_rx) = tokio::sync::oneshot::channel::<bool>();

        let caller = {
            let gate = gate.clone();
            tokio::spawn(async move {
                gate.run(move |cancelled| {
                    let _ = started_tx.send(());
                    let deadline = Instant::now() + Duration::from_secs(5);
                    while !cancelled.load(Ordering::SeqCst) && Instant::now() < deadline {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    let _ = seen_tx.send(cancelled.load(Ordering::SeqCst));
                    Err::<(), _>(CaptureError::Cancelled)
                })
                .await
            })
        };
        started_rx.await.unwrap();
        caller.abort();
        assert!(seen_rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_executable_fails_before_launch() {
        let locator = select_locator(
            RenderEnvironment::Local,
            Some(PathBuf::from("/no/such/chrome-binary")),
        );
        let capture = HeadlessChromeCapture::new(locator, Duration::from_secs(5), 1);
        let err = capture.capture("<html></html>").await.unwrap_err();
        assert_eq!(err.kind(), "no_executable");
    }
}
