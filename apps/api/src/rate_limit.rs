//! Fixed-window per-client request limiting.
//!
//! One [`RateLimiter`] per quota (global, PDF, AI), created at startup and
//! attached to its route group with `from_fn_with_state`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::errors::AppError;

/// Bucket count at which expired entries are first swept.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Buckets {
    windows: HashMap<String, Window>,
    /// Size that triggers the next sweep. Doubles past live entries so a
    /// full map is not rescanned on every insert.
    next_sweep: usize,
}

#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    max: u32,
    window: Duration,
    /// Key on the first `X-Forwarded-For` hop instead of the peer address.
    trust_proxy: bool,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    pub fn new(name: &'static str, max: u32, window: Duration) -> Self {
        Self {
            name,
            max,
            window,
            trust_proxy: false,
            buckets: Mutex::new(Buckets {
                windows: HashMap::new(),
                next_sweep: SWEEP_THRESHOLD,
            }),
        }
    }

    /// Only for deployments behind a reverse proxy that overwrites
    /// `X-Forwarded-For`; otherwise clients pick their own key.
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Counts one request for `key`. `Err` carries the seconds until the
    /// client's window resets.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        let mut buckets = self.buckets.lock().unwrap_or_else(|p| p.into_inner());

        if buckets.windows.len() >= buckets.next_sweep {
            let window = self.window;
            buckets
                .windows
                .retain(|_, w| now.duration_since(w.started) < window);
            buckets.next_sweep = (buckets.windows.len() * 2).max(SWEEP_THRESHOLD);
        }

        let entry = buckets.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max {
            let elapsed = now.duration_since(entry.started);
            let remaining = self.window.saturating_sub(elapsed);
            // Round up so clients never retry a moment too early.
            return Err(remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0));
        }

        entry.count += 1;
        Ok(())
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.buckets
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .windows
            .len()
    }
}

/// Middleware rejecting requests over the limiter's quota with 429.
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(&req, limiter.trust_proxy);
    if let Err(retry_after) = limiter.check(&key, Instant::now()) {
        warn!(
            limiter = limiter.name,
            client = %key,
            retry_after,
            "Rate limit exceeded"
        );
        return Err(AppError::RateLimited { retry_after });
    }
    Ok(next.run(req).await)
}

/// Peer IP, or the first `X-Forwarded-For` hop when the proxy is trusted.
/// Requests with neither share one bucket.
fn client_key(req: &Request, trust_proxy: bool) -> String {
    let forwarded = trust_proxy
        .then(|| req.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
