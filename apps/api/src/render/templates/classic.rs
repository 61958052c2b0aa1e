use super::{document, section, CvView};
use crate::models::cv::SkillCategory;

const CSS: &str = r#"
body { font-family: 'Times New Roman', Times, serif; margin: 0; color: #111827; background: #ffffff; line-height: 1.6; }
.cv-container { max-width: 800px; margin: 0 auto; }
.header { border-bottom: 3px solid #111827; padding-bottom: 16px; margin-bottom: 24px; }
.header h1 { font-size: 2.5rem; margin: 0 0 8px 0; }
.contact-info { display: flex; flex-wrap: wrap; gap: 16px; font-size: 0.875rem; color: #374151; }
.contact-item .label { font-weight: bold; margin-right: 4px; }
.section { margin-bottom: 28px; }
.section h2 { font-size: 1.2rem; text-transform: uppercase; letter-spacing: 1px; margin: 0 0 14px 0;
  border-bottom: 1px solid #d1d5db; padding-bottom: 4px; }
.item { margin-bottom: 18px; padding-left: 16px; border-left: 1px solid #d1d5db; page-break-inside: avoid; }
.item-title { font-weight: bold; font-size: 1.1rem; }
.item-company { color: #374151; font-style: italic; margin-top: 2px; }
.item-duration { color: #6b7280; font-size: 0.875rem; margin-top: 4px; }
.item-description { color: #374151; margin-top: 8px; white-space: pre-line; }
.summary { font-style: italic; color: #374151; background: #f9fafb; padding: 16px; border-left: 4px solid #6b7280; }
.skill-category { margin-bottom: 10px; }
.skill-category-title { font-weight: bold; margin-bottom: 2px; }
"#;

pub(super) fn render(view: &CvView) -> String {
    let contacts: String = view
        .contacts
        .iter()
        .map(|c| {
            format!(
                "<div class=\"contact-item\"><span class=\"label\">{}:</span>{}</div>\n",
                c.label, c.value
            )
        })
        .collect();

    let summary = view
        .summary
        .as_ref()
        .map(|s| format!("<div class=\"summary\">{s}</div>"))
        .unwrap_or_default();

    let experience: String = view
        .experience
        .iter()
        .map(|exp| {
            let company = [exp.company.as_str(), exp.location.as_str()]
                .into_iter()
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" | ");
            let description = exp
                .description
                .as_ref()
                .map(|d| format!("<div class=\"item-description\">{d}</div>\n"))
                .unwrap_or_default();
            format!(
                "<div class=\"item\">\n<div class=\"item-title\">{}</div>\n\
                 <div class=\"item-company\">{company}</div>\n\
                 <div class=\"item-duration\">{}</div>\n{description}</div>\n",
                exp.position, exp.dates,
            )
        })
        .collect();

    let education: String = view
        .education
        .iter()
        .map(|edu| {
            let duration = match &edu.gpa {
                Some(gpa) if edu.dates.is_empty() => format!("GPA {gpa}"),
                Some(gpa) => format!("{} | GPA {gpa}", edu.dates),
                None => edu.dates.clone(),
            };
            format!(
                "<div class=\"item\">\n<div class=\"item-title\">{}</div>\n\
                 <div class=\"item-company\">{}</div>\n\
                 <div class=\"item-duration\">{duration}</div>\n</div>\n",
                edu.title, edu.institution,
            )
        })
        .collect();

    let skills: String = SkillCategory::ALL
        .iter()
        .filter_map(|&category| {
            let names: Vec<String> = view
                .skills_in(category)
                .map(|s| format!("{} ({})", s.name, s.level))
                .collect();
            if names.is_empty() {
                return None;
            }
            Some(format!(
                "<div class=\"skill-category\"><div class=\"skill-category-title\">{}:</div>\
                 <div class=\"skill-items\">{}</div></div>\n",
                category.as_str(),
                names.join(", ")
            ))
        })
        .collect();

    let projects: String = view
        .projects
        .iter()
        .map(|project| {
            let mut inner = format!("<div class=\"item-title\">{}</div>\n", project.name);
            if let Some(description) = &project.description {
                inner.push_str(&format!(
                    "<div class=\"item-description\">{description}</div>\n"
                ));
            }
            if !project.technologies.is_empty() {
                inner.push_str(&format!(
                    "<div class=\"item-description\"><strong>Technologies:</strong> {}</div>\n",
                    project.technologies.join(", ")
                ));
            }
            if let Some(link) = &project.link {
                inner.push_str(&format!("<div class=\"item-duration\">{link}</div>\n"));
            }
            format!("<div class=\"item\">\n{inner}</div>\n")
        })
        .collect();

    let body = format!(
        "<div class=\"cv-container\">\n<header class=\"header\">\n<h1>{name}</h1>\n\
         <div class=\"contact-info\">\n{contacts}</div>\n</header>\n\
         {summary}{experience}{education}{skills}{projects}</div>",
        name = view.name,
        summary = section("summary-section", "Professional Summary", summary),
        experience = section("experience", "Work Experience", experience),
        education = section("education", "Education", education),
        skills = section("skills", "Skills", skills),
        projects = section("projects", "Projects", projects),
    );

    document(&view.name, CSS, &body)
}
