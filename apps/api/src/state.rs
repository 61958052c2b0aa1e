use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;
use crate::rate_limit::RateLimiter;
use crate::render::pipeline::PdfPipeline;

/// Process-wide request quotas, one limiter per route group.
#[derive(Clone)]
pub struct Limiters {
    pub global: Arc<RateLimiter>,
    pub pdf: Arc<RateLimiter>,
    pub ai: Arc<RateLimiter>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Self {
        let limits = &config.rate_limits;
        let limiter = |name: &'static str, max: u32| {
            Arc::new(RateLimiter::new(name, max, limits.window).trusting_proxy(config.trust_proxy))
        };
        Self {
            global: limiter("global", limits.global),
            pdf: limiter("pdf", limits.pdf),
            ai: limiter("ai", limits.ai),
        }
    }
}

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Render → capture → validate → fallback. Holds the page-capture backend.
    pub pipeline: PdfPipeline,
    /// Backend for the writing-assist endpoints. Default: Gemini `LlmClient`.
    pub llm: Arc<dyn TextGenerator>,
    pub limiters: Limiters,
}
