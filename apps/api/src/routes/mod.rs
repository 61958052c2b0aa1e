pub mod health;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Extensions, HeaderMap, HeaderValue, StatusCode, Version},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::assist::handlers as assist;
use crate::config::Config;
use crate::rate_limit::enforce;
use crate::render::docx::DOCX_CONTENT_TYPE;
use crate::render::handlers as documents;
use crate::render::pipeline::PDF_CONTENT_TYPE;
use crate::state::AppState;

/// Request bodies above this are rejected with 413.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let limiters = state.limiters.clone();

    // Binary routes sit outside the compression layer entirely.
    let document_routes = Router::new()
        .route("/generate-pdf", post(documents::handle_generate_pdf))
        .route("/generate-docx", post(documents::handle_generate_docx))
        .route_layer(from_fn_with_state(limiters.pdf.clone(), enforce));

    let assist_routes = Router::new()
        .route("/rewrite-experience", post(assist::handle_rewrite_experience))
        .route("/summarize-profile", post(assist::handle_summarize_profile))
        .route("/suggest-skills", post(assist::handle_suggest_skills))
        .route(
            "/generate-project-description",
            post(assist::handle_project_description),
        )
        .route_layer(from_fn_with_state(limiters.ai.clone(), enforce));

    let json_routes = Router::new()
        .route("/health", get(health::health_handler))
        .merge(assist_routes)
        .layer(CompressionLayer::new().compress_when(json_compression()));

    Router::new()
        .merge(json_routes)
        .merge(document_routes)
        .fallback(not_found)
        .layer(from_fn_with_state(limiters.global.clone(), enforce))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// CORS for the web client. Restricted to `FRONTEND_URL` when set.
pub fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let exposed = [
        header::CONTENT_DISPOSITION,
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
    ];
    match &config.frontend_url {
        Some(origin) => Ok(CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("FRONTEND_URL '{origin}' is not a valid origin"))?,
            )
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers(exposed)),
        None => Ok(CorsLayer::permissive()),
    }
}

/// Default predicate minus document payloads and anything flagged
/// `x-no-compression`.
fn json_compression() -> impl Predicate {
    DefaultPredicate::new()
        .and(NotForContentType::const_new(PDF_CONTENT_TYPE))
        .and(NotForContentType::const_new(DOCX_CONTENT_TYPE))
        .and(not_flagged_uncompressible)
}

fn not_flagged_uncompressible(
    _: StatusCode,
    _: Version,
    headers: &HeaderMap,
    _: &Extensions,
) -> bool {
    !headers.contains_key("x-no-compression")
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Route not found" })),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::config::Config;
    use crate::llm_client::{LlmError, TextGenerator};
    use crate::render::browser::PageCapture;
    use crate::render::pipeline::PdfPipeline;
    use crate::state::{AppState, Limiters};

    pub struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            Ok(format!("generated from {} chars", prompt.len()))
        }
    }

    pub struct DownGenerator;

    #[async_trait]
    impl TextGenerator for DownGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::MissingApiKey)
        }
    }

    pub fn test_state(
        capture: impl PageCapture + 'static,
        llm: impl TextGenerator + 'static,
    ) -> AppState {
        let config = Config::from_lookup(|_| None, false).expect("default config");
        AppState {
            limiters: Limiters::from_config(&config),
            pipeline: PdfPipeline::new(Arc::new(capture), false),
            llm: Arc::new(llm),
            config: Arc::new(config),
        }
    }
}
