use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::render::browser::RenderEnvironment;

/// Per-client request quotas, each counted over `window`.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub pdf: u32,
    pub ai: u32,
    pub global: u32,
    pub window: Duration,
}

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// `APP_ENV=development`: error details in 500 bodies, debug PDF dumps.
    pub dev_mode: bool,
    pub render_env: RenderEnvironment,
    pub chrome_path: Option<PathBuf>,
    pub capture_timeout: Duration,
    pub max_concurrent_renders: usize,
    pub rate_limits: RateLimits,
    /// `TRUST_PROXY`: rate-limit on `X-Forwarded-For` instead of the peer IP.
    pub trust_proxy: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub frontend_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(
            |key| std::env::var(key).ok(),
            Path::new("/.dockerenv").exists(),
        )
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>, in_container: bool) -> Result<Self> {
        let non_empty = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let render_env = match non_empty("RENDER_ENV").as_deref() {
            None | Some("auto") => RenderEnvironment::detect(&var, in_container),
            Some(raw) => raw
                .parse::<RenderEnvironment>()
                .map_err(|e| anyhow!(e))
                .context("RENDER_ENV must be one of auto, local, server, serverless")?,
        };

        let window_secs: u64 = parse_or(&non_empty, "RATE_LIMIT_WINDOW_SECS", 900)?;

        Ok(Config {
            port: parse_or(&non_empty, "PORT", 3001)?,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            dev_mode: non_empty("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("development"))
                .unwrap_or(false),
            render_env,
            chrome_path: non_empty("CHROME_PATH").map(PathBuf::from),
            capture_timeout: Duration::from_secs(parse_or(&non_empty, "CAPTURE_TIMEOUT_SECS", 30)?),
            max_concurrent_renders: parse_or(&non_empty, "MAX_CONCURRENT_RENDERS", 2)?,
            rate_limits: RateLimits {
                pdf: parse_or(&non_empty, "PDF_RATE_LIMIT", 10)?,
                ai: parse_or(&non_empty, "AI_RATE_LIMIT", 20)?,
                global: parse_or(&non_empty, "GLOBAL_RATE_LIMIT", 100)?,
                window: Duration::from_secs(window_secs),
            },
            trust_proxy: match non_empty("TRUST_PROXY") {
                Some(raw) => parse_flag(&raw).context("TRUST_PROXY must be true or false")?,
                None => false,
            },
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| crate::llm_client::DEFAULT_MODEL.to_string()),
            frontend_url: non_empty("FRONTEND_URL"),
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("'{raw}' is not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)], in_container: bool) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned(), in_container)
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[], false).unwrap();
        assert_eq!(cfg.port, 3001);
        assert!(!cfg.dev_mode);
        assert_eq!(cfg.render_env, RenderEnvironment::Local);
        assert_eq!(cfg.capture_timeout, Duration::from_secs(30));
        assert_eq!(cfg.rate_limits.pdf, 10);
        assert_eq!(cfg.rate_limits.ai, 20);
        assert_eq!(cfg.rate_limits.global, 100);
        assert_eq!(cfg.rate_limits.window, Duration::from_secs(900));
        assert!(cfg.gemini_api_key.is_none());
        assert!(cfg.chrome_path.is_none());
        assert!(!cfg.trust_proxy);
    }

    #[test]
    fn test_explicit_values() {
        let cfg = config(
            &[
                ("PORT", "8080"),
                ("APP_ENV", "Development"),
                ("RENDER_ENV", "serverless"),
                ("CHROME_PATH", "/opt/chromium"),
                ("PDF_RATE_LIMIT", "3"),
                ("GEMINI_API_KEY", "k"),
                ("TRUST_PROXY", "TRUE"),
            ],
            false,
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.dev_mode);
        assert_eq!(cfg.render_env, RenderEnvironment::Serverless);
        assert_eq!(cfg.chrome_path, Some(PathBuf::from("/opt/chromium")));
        assert_eq!(cfg.rate_limits.pdf, 3);
        assert_eq!(cfg.gemini_api_key.as_deref(), Some("k"));
        assert!(cfg.trust_proxy);
    }

    #[test]
    fn test_auto_render_env_uses_detection() {
        assert_eq!(
            config(&[("RENDER_ENV", "auto")], true).unwrap().render_env,
            RenderEnvironment::Server
        );
        assert_eq!(
            config(&[("VERCEL", "1")], true).unwrap().render_env,
            RenderEnvironment::Serverless
        );
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config(&[("PORT", "eighty")], false).is_err());
        assert!(config(&[("RENDER_ENV", "mainframe")], false).is_err());
        assert!(config(&[("CAPTURE_TIMEOUT_SECS", "-1")], false).is_err());
        assert!(config(&[("TRUST_PROXY", "maybe")], false).is_err());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = config(&[("PORT", "  "), ("GEMINI_API_KEY", "")], false).unwrap();
        assert_eq!(cfg.port, 3001);
        assert!(cfg.gemini_api_key.is_none());
    }
}
