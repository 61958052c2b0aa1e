//! Document export: CV data to PDF (browser capture with fallback) or DOCX.

pub mod browser;
pub mod docx;
pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod sanitize;
pub mod signature;
pub mod templates;
