//! Axum route handlers for the writing-assist API.
//!
//! Each endpoint validates a small JSON body, sanitizes it, builds a prompt
//! and forwards it to the configured [`TextGenerator`].

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assist::prompts;
use crate::errors::{AppError, FieldError};
use crate::models::cv::ExperienceLevel;
use crate::render::sanitize::strip_markup;
use crate::state::AppState;

const AI_FAILURE: &str = "Internal server error occurred while processing your request";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RewriteExperienceRequest {
    pub text: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummarizeProfileRequest {
    pub experience_level: Option<String>,
    pub role: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuggestSkillsRequest {
    pub role: Option<String>,
    pub experience_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectDescriptionRequest {
    pub project_name: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub project_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssistResponse {
    pub success: bool,
    pub data: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /rewrite-experience
pub async fn handle_rewrite_experience(
    State(state): State<AppState>,
    body: Result<Json<RewriteExperienceRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, AppError> {
    let Json(request) = body.map_err(reject_body)?;

    let mut errors = Vec::new();
    let text = text_field(&mut errors, "text", request.text, 10, 2000, "Text must be 10-2000 characters");
    let role = text_field(&mut errors, "role", request.role, 2, 100, "Role must be 2-100 characters");
    let company = text_field(
        &mut errors,
        "company",
        request.company,
        2,
        100,
        "Company must be 2-100 characters",
    );
    finish_validation(errors)?;

    let prompt = prompts::rewrite_experience(&text, &role, &company);
    complete(&state, "rewrite-experience", &prompt).await
}

/// POST /summarize-profile
pub async fn handle_summarize_profile(
    State(state): State<AppState>,
    body: Result<Json<SummarizeProfileRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, AppError> {
    let Json(request) = body.map_err(reject_body)?;

    let mut errors = Vec::new();
    let level = level_field(&mut errors, request.experience_level);
    let role = text_field(&mut errors, "role", request.role, 2, 100, "Role must be 2-100 characters");
    let skills = list_field(
        &mut errors,
        "skills",
        request.skills,
        1,
        20,
        "Skills must be an array of 1-20 items",
    );
    finish_validation(errors)?;

    let prompt = prompts::summarize_profile(level.as_str(), &role, &skills);
    complete(&state, "summarize-profile", &prompt).await
}

/// POST /suggest-skills
pub async fn handle_suggest_skills(
    State(state): State<AppState>,
    body: Result<Json<SuggestSkillsRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, AppError> {
    let Json(request) = body.map_err(reject_body)?;

    let mut errors = Vec::new();
    let role = text_field(&mut errors, "role", request.role, 2, 100, "Role must be 2-100 characters");
    let level = level_field(&mut errors, request.experience_level);
    finish_validation(errors)?;

    let prompt = prompts::suggest_skills(&role, level.as_str());
    complete(&state, "suggest-skills", &prompt).await
}

/// POST /generate-project-description
pub async fn handle_project_description(
    State(state): State<AppState>,
    body: Result<Json<ProjectDescriptionRequest>, JsonRejection>,
) -> Result<Json<AssistResponse>, AppError> {
    let Json(request) = body.map_err(reject_body)?;

    let mut errors = Vec::new();
    let name = text_field(
        &mut errors,
        "projectName",
        request.project_name,
        2,
        100,
        "Project name must be 2-100 characters",
    );
    let technologies = list_field(
        &mut errors,
        "technologies",
        request.technologies,
        1,
        10,
        "Technologies must be an array of 1-10 items",
    );
    let kind = match request.project_type {
        Some(kind) if kind.chars().count() > 50 => {
            errors.push(FieldError::new("projectType", "Project type must be max 50 characters"));
            None
        }
        Some(kind) => Some(strip_markup(&kind)).filter(|k| !k.is_empty()),
        None => None,
    };
    finish_validation(errors)?;

    let prompt = prompts::project_description(&name, &technologies, kind.as_deref());
    complete(&state, "generate-project-description", &prompt).await
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn complete(
    state: &AppState,
    endpoint: &'static str,
    prompt: &str,
) -> Result<Json<AssistResponse>, AppError> {
    match state.llm.generate(prompt).await {
        Ok(data) => {
            info!(endpoint, chars = data.len(), "Assist request completed");
            Ok(Json(AssistResponse {
                success: true,
                data,
            }))
        }
        Err(e) => {
            warn!(endpoint, error = %e, "Assist request failed");
            Err(AppError::Ai(AI_FAILURE.to_string()))
        }
    }
}

pub(crate) fn reject_body(rejection: JsonRejection) -> AppError {
    AppError::validation(vec![FieldError::new("body", rejection.body_text())])
}

fn finish_validation(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(errors))
    }
}

/// Length is checked on the raw input; the returned value is sanitized.
fn text_field(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<String>,
    min: usize,
    max: usize,
    message: &str,
) -> String {
    match value {
        Some(v) if (min..=max).contains(&v.chars().count()) => strip_markup(&v),
        _ => {
            errors.push(FieldError::new(field, message));
            String::new()
        }
    }
}

fn list_field(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<Vec<String>>,
    min: usize,
    max: usize,
    message: &str,
) -> Vec<String> {
    match value {
        Some(items) if (min..=max).contains(&items.len()) => {
            items.iter().map(|i| strip_markup(i)).collect()
        }
        _ => {
            errors.push(FieldError::new(field, message));
            Vec::new()
        }
    }
}

fn level_field(errors: &mut Vec<FieldError>, value: Option<String>) -> ExperienceLevel {
    match value.as_deref() {
        Some("fresh") => ExperienceLevel::Fresh,
        Some("professional") => ExperienceLevel::Professional,
        _ => {
            errors.push(FieldError::new("experienceLevel", "Invalid experience level"));
            ExperienceLevel::default()
        }
    }
}
