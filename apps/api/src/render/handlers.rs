//! Axum route handlers for document export.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::assist::handlers::reject_body;
use crate::errors::{AppError, FieldError};
use crate::models::cv::CvData;
use crate::render::docx::{generate_docx, DOCX_CONTENT_TYPE};
use crate::render::pipeline::safe_filename;
use crate::render::templates::Template;
use crate::state::AppState;

const MAX_TEMPLATE_CHARS: usize = 50;

/// Validated `{cvData, template?}` body.
#[derive(Debug)]
pub struct DocumentRequest {
    pub cv: CvData,
    pub template: Template,
}

/// POST /generate-pdf
///
/// Always answers with either a PDF that passed the signature check or a
/// JSON error; never with an unchecked binary.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = parse_document_request(body)?;

    let result = state
        .pipeline
        .generate(&request.cv, request.template)
        .await
        .map_err(|e| AppError::render("Failed to generate PDF", &e, state.config.dev_mode))?;

    info!(
        filename = %result.filename,
        bytes = result.buffer.len(),
        fallback = result.is_fallback,
        "Sending PDF"
    );
    document_response(
        result.buffer,
        &result.filename,
        result.content_type,
        Some(result.is_fallback),
    )
}

/// POST /generate-docx
pub async fn handle_generate_docx(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = parse_document_request(body)?;

    let buffer = generate_docx(&request.cv)
        .map_err(|e| AppError::render("Failed to generate DOCX", &e, state.config.dev_mode))?;
    let filename = safe_filename(&request.cv.personal_info.full_name, "docx");

    info!(filename = %filename, bytes = buffer.len(), "Sending DOCX");
    document_response(buffer, &filename, DOCX_CONTENT_TYPE, None)
}

pub fn parse_document_request(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<DocumentRequest, AppError> {
    let Json(mut body) = body.map_err(reject_body)?;

    let mut errors = Vec::new();

    let cv_value = match body.get_mut("cvData").map(Value::take) {
        Some(v @ Value::Object(_)) => Some(v),
        _ => {
            errors.push(FieldError::new("cvData", "CV data must be an object"));
            None
        }
    };

    let template = match body.get("template") {
        None | Some(Value::Null) => Template::default(),
        Some(Value::String(name)) if (1..=MAX_TEMPLATE_CHARS).contains(&name.chars().count()) => {
            Template::from_name(Some(name.as_str()))
        }
        Some(_) => {
            errors.push(FieldError::new(
                "template",
                format!("Template must be a string of 1-{MAX_TEMPLATE_CHARS} characters"),
            ));
            Template::default()
        }
    };

    let cv = match cv_value.map(serde_json::from_value::<CvData>) {
        Some(Ok(cv)) => Some(cv),
        Some(Err(e)) => {
            errors.push(FieldError::new("cvData", format!("CV data is malformed: {e}")));
            None
        }
        None => None,
    };

    match cv {
        Some(cv) if errors.is_empty() => Ok(DocumentRequest { cv, template }),
        _ => Err(AppError::validation(errors)),
    }
}

/// Binary response with download and no-cache headers. `fallback` adds
/// `X-Render-Fallback` for PDF responses.
fn document_response(
    buffer: Vec<u8>,
    filename: &str,
    content_type: &'static str,
    fallback: Option<bool>,
) -> Result<Response, AppError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, buffer.len().to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(filename))
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .header("x-no-compression", "1")
        .header(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            "Content-Disposition, Content-Type, Content-Length, X-Render-Fallback",
        );
    if let Some(fallback) = fallback {
        builder = builder.header("x-render-fallback", if fallback { "true" } else { "false" });
    }

    builder
        .body(Body::from(buffer))
        .map_err(|e| AppError::Internal(e.into()))
}

/// `attachment; filename="<ascii>"; filename*=UTF-8''<percent-encoded>`
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        percent_encode(filename)
    )
}

/// RFC 5987 `value-chars` encoding.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            );
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<DocumentRequest, AppError> {
        parse_document_request(Ok(Json(value)))
    }

    fn field_names(err: AppError) -> Vec<String> {
        match err {
            AppError::Validation { details, .. } => details.into_iter().map(|d| d.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_request_with_template() {
        let request = parse(json!({
            "cvData": {"personalInfo": {"fullName": "Jane Doe"}},
            "template": "classic"
        }))
        .unwrap();
        assert_eq!(request.template, Template::Classic);
        assert_eq!(request.cv.personal_info.full_name, "Jane Doe");
    }

    #[test]
    fn test_unknown_or_missing_template_defaults_to_modern() {
        let request = parse(json!({"cvData": {}, "template": "neon"})).unwrap();
        assert_eq!(request.template, Template::Modern);
        let request = parse(json!({"cvData": {}})).unwrap();
        assert_eq!(request.template, Template::Modern);
    }

    #[test]
    fn test_cv_data_must_be_object() {
        assert_eq!(field_names(parse(json!({})).unwrap_err()), vec!["cvData"]);
        assert_eq!(
            field_names(parse(json!({"cvData": "text"})).unwrap_err()),
            vec!["cvData"]
        );
        assert_eq!(
            field_names(parse(json!({"cvData": [1, 2]})).unwrap_err()),
            vec!["cvData"]
        );
    }

    #[test]
    fn test_template_length_and_type() {
        let long = "x".repeat(51);
        assert_eq!(
            field_names(parse(json!({"cvData": {}, "template": long})).unwrap_err()),
            vec!["template"]
        );
        assert_eq!(
            field_names(parse(json!({"cvData": {}, "template": ""})).unwrap_err()),
            vec!["template"]
        );
        assert_eq!(
            field_names(parse(json!({"cvData": {}, "template": 7})).unwrap_err()),
            vec!["template"]
        );
    }

    #[test]
    fn test_malformed_cv_fields_rejected() {
        let err = parse(json!({"cvData": {"experience": "none"}})).unwrap_err();
        assert_eq!(field_names(err), vec!["cvData"]);
    }

    #[test]
    fn test_content_disposition_has_both_forms() {
        assert_eq!(
            content_disposition("Jane_Doe.pdf"),
            "attachment; filename=\"Jane_Doe.pdf\"; filename*=UTF-8''Jane_Doe.pdf"
        );
        assert_eq!(
            content_disposition("Zoë \"Z\".pdf"),
            "attachment; filename=\"Zo_ _Z_.pdf\"; filename*=UTF-8''Zo%C3%AB%20%22Z%22.pdf"
        );
    }

    #[test]
    fn test_document_response_headers() {
        let response =
            document_response(vec![1, 2, 3], "cv.pdf", "application/pdf", Some(true)).unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers["x-no-compression"], "1");
        assert_eq!(headers["x-render-fallback"], "true");

        let docx = document_response(vec![1], "cv.docx", DOCX_CONTENT_TYPE, None).unwrap();
        assert!(docx.headers().get("x-render-fallback").is_none());
    }
}
