//! CV export service: HTML templates, headless-browser PDF capture with a
//! browser-free fallback, DOCX export and AI writing assistance over HTTP.

pub mod assist;
pub mod config;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod rate_limit;
pub mod render;
pub mod routes;
pub mod state;
