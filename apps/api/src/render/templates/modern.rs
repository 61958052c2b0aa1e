use super::{document, section, CvView};

const CSS: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; margin: 0; color: #1f2937; background: #ffffff; }
.cv-container { background: #ffffff; border-radius: 8px; overflow: hidden; }
.header { background: linear-gradient(135deg, #2563eb 0%, #7c3aed 100%); color: #ffffff; padding: 32px;
  display: flex; justify-content: space-between; align-items: flex-end; }
.header h1 { font-size: 2.25rem; margin: 0 0 4px 0; }
.header .subtitle { font-size: 1.1rem; opacity: 0.9; margin: 0; }
.contact-info { text-align: right; font-size: 0.875rem; }
.contact-info div { margin: 4px 0; }
.contact-info .label { opacity: 0.75; margin-right: 6px; }
.content { padding: 32px; }
.section { margin-bottom: 28px; }
.section h2 { font-size: 1.4rem; font-weight: 600; margin: 0 0 16px 0; padding-bottom: 8px; border-bottom: 2px solid #e5e7eb; }
.item { margin-bottom: 20px; padding-bottom: 12px; border-bottom: 1px solid #f3f4f6; page-break-inside: avoid; }
.item:last-child { border-bottom: none; }
.item-header { display: flex; justify-content: space-between; align-items: flex-start; }
.item-title { font-weight: 600; font-size: 1.1rem; }
.item-company { color: #4b5563; font-weight: 500; margin-top: 2px; }
.item-duration { color: #6b7280; font-size: 0.875rem; white-space: nowrap; }
.item-description { color: #374151; line-height: 1.6; margin-top: 10px; white-space: pre-line; }
.summary { background: #f8fafc; border-left: 4px solid #2563eb; padding: 20px; border-radius: 0 6px 6px 0; line-height: 1.6; }
.skills-container { display: flex; flex-wrap: wrap; gap: 12px; }
.skill-item { background: #e5e7eb; color: #374151; padding: 6px 14px; border-radius: 20px; font-size: 0.875rem; }
.tech-tags { display: flex; flex-wrap: wrap; gap: 8px; margin-top: 10px; }
.tech-tag { background: #dbeafe; color: #1e40af; padding: 3px 10px; border-radius: 12px; font-size: 0.75rem; }
.link { color: #2563eb; font-size: 0.85rem; margin-top: 6px; }
"#;

pub(super) fn render(view: &CvView) -> String {
    let contacts: String = view
        .contacts
        .iter()
        .map(|c| format!("<div><span class=\"label\">{}</span>{}</div>\n", c.label, c.value))
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
            let company = match (exp.company.is_empty(), exp.location.is_empty()) {
                (false, false) => format!("{}, {}", exp.company, exp.location),
                (false, true) => exp.company.clone(),
                _ => exp.location.clone(),
            };
            format!(
                "<div class=\"item\">\n<div class=\"item-header\"><div>\
                 <div class=\"item-title\">{}</div><div class=\"item-company\">{}</div></div>\
                 <div class=\"item-duration\">{}</div></div>\n{}</div>\n",
                exp.position,
                company,
                exp.dates,
                description(exp.description.as_deref()),
            )
        })
        .collect();

    let education: String = view
        .education
        .iter()
        .map(|edu| {
            let gpa = edu
                .gpa
                .as_ref()
                .map(|g| format!("<div class=\"item-description\">GPA: {g}</div>"))
                .unwrap_or_default();
            format!(
                "<div class=\"item\">\n<div class=\"item-header\"><div>\
                 <div class=\"item-title\">{}</div><div class=\"item-company\">{}</div></div>\
                 <div class=\"item-duration\">{}</div></div>\n{gpa}</div>\n",
                edu.title, edu.institution, edu.dates,
            )
        })
        .collect();

    let skills = if view.skills.is_empty() {
        String::new()
    } else {
        let pills: String = view
            .skills
            .iter()
            .map(|s| format!("<span class=\"skill-item\">{} ({})</span>", s.name, s.level))
            .collect();
        format!("<div class=\"skills-container\">{pills}</div>")
    };

    let projects: String = view
        .projects
        .iter()
        .map(|project| {
            let tags = if project.technologies.is_empty() {
                String::new()
            } else {
                let inner: String = project
                    .technologies
                    .iter()
                    .map(|t| format!("<span class=\"tech-tag\">{t}</span>"))
                    .collect();
                format!("<div class=\"tech-tags\">{inner}</div>")
            };
            let link = project
                .link
                .as_ref()
                .map(|l| format!("<div class=\"link\">{l}</div>"))
                .unwrap_or_default();
            format!(
                "<div class=\"item\">\n<div class=\"item-title\">{}</div>\n{}{tags}{link}</div>\n",
                project.name,
                description(project.description.as_deref()),
            )
        })
        .collect();

    let body = format!(
        "<div class=\"cv-container\">\n<header class=\"header\">\n<div><h1>{name}</h1>\
         <p class=\"subtitle\">Professional</p></div>\n<div class=\"contact-info\">\n{contacts}</div>\n\
         </header>\n<div class=\"content\">\n{summary}{experience}{education}{skills}{projects}</div>\n</div>",
        name = view.name,
        summary = section("summary-section", "Professional Summary", summary),
        experience = section("experience", "Work Experience", experience),
        education = section("education", "Education", education),
        skills = section("skills", "Skills", skills),
        projects = section("projects", "Projects", projects),
    );

    document(&view.name, CSS, &body)
}

fn description(text: Option<&str>) -> String {
    text.map(|d| format!("<div class=\"item-description\">{d}</div>\n"))
        .unwrap_or_default()
}
