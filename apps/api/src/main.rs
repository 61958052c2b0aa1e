use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvgen::config::Config;
use cvgen::llm_client::LlmClient;
use cvgen::render::browser::{select_locator, HeadlessChromeCapture};
use cvgen::render::pipeline::PdfPipeline;
use cvgen::routes::{build_router, cors_layer};
use cvgen::state::{AppState, Limiters};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvgen API v{}", env!("CARGO_PKG_VERSION"));

    // Browser strategy is fixed for the lifetime of the process
    let locator = select_locator(config.render_env, config.chrome_path.clone());
    match locator.executable() {
        Ok(path) => info!(
            "Render environment: {} (strategy: {}, executable: {})",
            config.render_env,
            locator.strategy(),
            path.display()
        ),
        Err(e) => warn!(
            "Render environment: {} (strategy: {}); {e}. PDFs will use the fallback renderer",
            config.render_env,
            locator.strategy()
        ),
    }
    let capture = Arc::new(HeadlessChromeCapture::new(
        locator,
        config.capture_timeout,
        config.max_concurrent_renders,
    ));
    let pipeline = PdfPipeline::new(capture, config.dev_mode);

    // Initialize LLM client
    let llm = LlmClient::new(config.gemini_api_key.clone(), config.gemini_model.clone())?;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY not set; writing-assist endpoints will return errors");
    }
    info!("LLM client initialized (model: {})", llm.model());

    let limiters = Limiters::from_config(&config);
    info!(
        "Rate limits per {}s window: global={}, pdf={}, ai={} (keyed on {})",
        config.rate_limits.window.as_secs(),
        config.rate_limits.global,
        config.rate_limits.pdf,
        config.rate_limits.ai,
        if config.trust_proxy { "X-Forwarded-For" } else { "peer address" }
    );

    let cors = cors_layer(&config)?;
    let port = config.port;

    // Build app state
    let state = AppState {
        config: Arc::new(config),
        pipeline,
        llm: Arc::new(llm),
        limiters,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, draining in-flight requests"),
        Err(err) => {
            error!("Unable to listen for shutdown signal: {err}");
            std::future::pending::<()>().await
        }
    }
}
