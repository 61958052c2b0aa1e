use super::{document, section, CvView};

const CSS: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; margin: 0; color: #2d3748;
  background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); }
.cv-container { background: #ffffff; border-radius: 16px; overflow: hidden; position: relative; }
.cv-container::before { content: ''; position: absolute; top: 0; left: 0; right: 0; height: 6px;
  background: linear-gradient(90deg, #f093fb 0%, #f5576c 25%, #4facfe 50%, #00f2fe 75%, #43e97b 100%); }
.header { background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: #ffffff; padding: 40px; text-align: center; }
.header h1 { font-size: 2.5rem; margin: 0 0 12px 0; letter-spacing: 1px; }
.contact-info { display: flex; flex-wrap: wrap; justify-content: center; gap: 10px; }
.contact-chip { background: rgba(255, 255, 255, 0.18); padding: 4px 12px; border-radius: 999px; font-size: 0.85rem; }
.content { padding: 36px 40px; }
.section { margin-bottom: 30px; }
.section h2 { font-size: 1.35rem; color: #553c9a; margin: 0 0 14px 0; padding-left: 12px; border-left: 5px solid #f5576c; }
.item { margin-bottom: 18px; padding: 14px 16px; background: #faf5ff; border-radius: 10px; page-break-inside: avoid; }
.item-title { font-weight: 700; color: #44337a; }
.item-company { color: #6b46c1; margin-top: 2px; }
.item-duration { color: #718096; font-size: 0.85rem; margin-top: 4px; }
.item-description { margin-top: 8px; line-height: 1.6; white-space: pre-line; }
.summary { font-size: 1.05rem; line-height: 1.7; text-align: center; color: #4a5568; }
.skills-grid { display: flex; flex-wrap: wrap; gap: 10px; }
.skill { background: linear-gradient(135deg, #4facfe 0%, #00f2fe 100%); color: #ffffff; padding: 6px 14px; border-radius: 8px; font-size: 0.85rem; }
.skill small { opacity: 0.85; margin-left: 4px; }
.tech { display: inline-block; border: 1px solid #b794f4; color: #553c9a; padding: 2px 8px; border-radius: 6px; font-size: 0.75rem; margin: 6px 6px 0 0; }
"#;

pub(super) fn render(view: &CvView) -> String {
    let contacts: String = view
        .contacts
        .iter()
        .map(|c| format!("<span class=\"contact-chip\">{}</span>\n", c.value))
        .collect();

    let summary = view
        .summary
        .as_ref()
        .map(|s| format!("<p class=\"summary\">{s}</p>"))
        .unwrap_or_default();

    let experience: String = view
        .experience
        .iter()
        .map(|exp| {
            let mut card = format!(
                "<div class=\"item-title\">{}</div>\n<div class=\"item-company\">{}</div>\n\
                 <div class=\"item-duration\">{}</div>\n",
                exp.position, exp.company, exp.dates
            );
            if let Some(description) = &exp.description {
                card.push_str(&format!("<div class=\"item-description\">{description}</div>\n"));
            }
            format!("<div class=\"item\">\n{card}</div>\n")
        })
        .collect();

    let education: String = view
        .education
        .iter()
        .map(|edu| {
            format!(
                "<div class=\"item\">\n<div class=\"item-title\">{}</div>\n\
                 <div class=\"item-company\">{}</div>\n<div class=\"item-duration\">{}</div>\n</div>\n",
                edu.title, edu.institution, edu.dates
            )
        })
        .collect();

    let skills = if view.skills.is_empty() {
        String::new()
    } else {
        let chips: String = view
            .skills
            .iter()
            .map(|s| format!("<span class=\"skill\">{}<small>{}</small></span>", s.name, s.level))
            .collect();
        format!("<div class=\"skills-grid\">{chips}</div>")
    };

    let projects: String = view
        .projects
        .iter()
        .map(|project| {
            let mut card = format!("<div class=\"item-title\">{}</div>\n", project.name);
            if let Some(description) = &project.description {
                card.push_str(&format!("<div class=\"item-description\">{description}</div>\n"));
            }
            for tech in &project.technologies {
                card.push_str(&format!("<span class=\"tech\">{tech}</span>"));
            }
            if let Some(link) = &project.link {
                card.push_str(&format!("<div class=\"item-duration\">{link}</div>\n"));
            }
            format!("<div class=\"item\">\n{card}</div>\n")
        })
        .collect();

    let body = format!(
        "<div class=\"cv-container\">\n<header class=\"header\">\n<h1>{name}</h1>\n\
         <div class=\"contact-info\">\n{contacts}</div>\n</header>\n<div class=\"content\">\n\
         {summary}{experience}{education}{skills}{projects}</div>\n</div>",
        name = view.name,
        summary = section("summary-section", "About Me", summary),
        experience = section("experience", "Experience", experience),
        education = section("education", "Education", education),
        skills = section("skills", "Skills", skills),
        projects = section("projects", "Projects", projects),
    );

    document(&view.name, CSS, &body)
}
