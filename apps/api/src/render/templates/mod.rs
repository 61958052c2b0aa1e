//! HTML templates for CV rendering.
//!
//! Rendering is pure and total: any `CvData` that deserialized produces a
//! complete HTML document. Every user string passes through
//! [`sanitize_html`] while the view is built, so template bodies only ever
//! interpolate already-safe text.

mod classic;
mod creative;
mod modern;

use std::fmt;

use crate::models::cv::{CvData, SkillCategory};
use crate::render::sanitize::sanitize_html;

/// Print rules shared by every template: A4 with 1cm margins, colours kept.
const PAGE_CSS: &str = "@page { size: A4; margin: 1cm; }\n\
    html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Template {
    #[default]
    Modern,
    Classic,
    Creative,
}

impl Template {
    /// Resolves a client-supplied name. Unknown or missing names fall back
    /// to `Modern`.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()).as_deref() {
            Some("classic") => Template::Classic,
            Some("creative") => Template::Creative,
            _ => Template::Modern,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Modern => "modern",
            Template::Classic => "classic",
            Template::Creative => "creative",
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders `cv` with the chosen template into a self-contained HTML document.
pub fn render_html(cv: &CvData, template: Template) -> String {
    let view = CvView::from_cv(cv);
    match template {
        Template::Modern => modern::render(&view),
        Template::Classic => classic::render(&view),
        Template::Creative => creative::render(&view),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sanitized view model
// ────────────────────────────────────────────────────────────────────────────

pub(crate) struct CvView {
    pub name: String,
    pub contacts: Vec<Contact>,
    pub summary: Option<String>,
    pub experience: Vec<ExperienceView>,
    pub education: Vec<EducationView>,
    pub skills: Vec<SkillView>,
    pub projects: Vec<ProjectView>,
}

pub(crate) struct Contact {
    pub label: &'static str,
    pub value: String,
}

pub(crate) struct ExperienceView {
    pub position: String,
    pub company: String,
    pub location: String,
    pub dates: String,
    pub description: Option<String>,
}

pub(crate) struct EducationView {
    pub title: String,
    pub institution: String,
    pub dates: String,
    pub gpa: Option<String>,
}

pub(crate) struct SkillView {
    pub name: String,
    pub level: &'static str,
    pub category: SkillCategory,
}

pub(crate) struct ProjectView {
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub link: Option<String>,
}

impl CvView {
    fn from_cv(cv: &CvData) -> Self {
        let info = &cv.personal_info;

        let name = non_empty(&info.full_name).unwrap_or_else(|| "Your Name".to_string());

        let contacts = [
            ("Email", Some(&info.email)),
            ("Phone", Some(&info.phone)),
            ("Location", Some(&info.location)),
            ("LinkedIn", info.linked_in.as_ref()),
            ("Website", info.website.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .and_then(|v| non_empty(v))
                .map(|value| Contact { label, value })
        })
        .collect();

        let experience = cv
            .experience
            .iter()
            .map(|exp| {
                let end = if exp.current {
                    "Present".to_string()
                } else {
                    sanitize_html(&exp.end_date)
                };
                ExperienceView {
                    position: sanitize_html(&exp.position),
                    company: sanitize_html(&exp.company),
                    location: sanitize_html(&exp.location),
                    dates: date_range(&sanitize_html(&exp.start_date), &end),
                    description: non_empty(&exp.description),
                }
            })
            .collect();

        let education = cv
            .education
            .iter()
            .map(|edu| {
                let degree = sanitize_html(&edu.degree);
                let field = sanitize_html(&edu.field);
                let title = match (degree.is_empty(), field.is_empty()) {
                    (false, false) => format!("{degree} in {field}"),
                    (false, true) => degree,
                    (true, false) => field,
                    (true, true) => String::new(),
                };
                EducationView {
                    title,
                    institution: sanitize_html(&edu.institution),
                    dates: date_range(
                        &sanitize_html(&edu.start_date),
                        &sanitize_html(&edu.end_date),
                    ),
                    gpa: edu.gpa.as_deref().and_then(non_empty),
                }
            })
            .collect();

        let skills = cv
            .skills
            .iter()
            .filter_map(|skill| {
                non_empty(&skill.name).map(|name| SkillView {
                    name,
                    level: skill.level.as_str(),
                    category: skill.category,
                })
            })
            .collect();

        let projects = cv
            .projects
            .iter()
            .map(|project| ProjectView {
                name: sanitize_html(&project.name),
                description: non_empty(&project.description),
                technologies: project
                    .technologies
                    .iter()
                    .filter_map(|t| non_empty(t))
                    .collect(),
                link: project.link.as_deref().and_then(non_empty),
            })
            .collect();

        Self {
            name,
            contacts,
            summary: non_empty(&cv.professional_summary),
            experience,
            education,
            skills,
            projects,
        }
    }

    pub fn skills_in(&self, category: SkillCategory) -> impl Iterator<Item = &SkillView> {
        self.skills.iter().filter(move |s| s.category == category)
    }
}

/// Sanitizes `raw` and returns it only if something is left.
fn non_empty(raw: &str) -> Option<String> {
    let clean = sanitize_html(raw);
    (!clean.is_empty()).then_some(clean)
}

fn date_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start.to_string(),
        (true, false) => end.to_string(),
        (false, false) => format!("{start} - {end}"),
    }
}

/// Wraps a template's body and styles in the shared document shell.
pub(crate) fn document(title: &str, css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>CV - {title}</title>\n<style>\n{PAGE_CSS}\n{css}\n</style>\n</head>\n\
         <body>\n{body}\n</body>\n</html>\n"
    )
}

/// Emits `<section>` with a heading only when `inner` has content.
pub(crate) fn section(class: &str, heading: &str, inner: String) -> String {
    if inner.is_empty() {
        return String::new();
    }
    format!("<section class=\"section {class}\">\n<h2>{heading}</h2>\n{inner}\n</section>\n")
}
