//! Word export: a flat sequence of headings, bullets and body paragraphs.

use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run, Style, StyleType};
use thiserror::Error;

use crate::models::cv::{CvData, SkillCategory};
use crate::render::sanitize::strip_markup;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const TITLE_PT: usize = 20;
const HEADING_PT: usize = 14;
const BODY_PT: usize = 11;

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("DOCX packaging failed: {0}")]
    Pack(String),
}

/// Builds the `.docx` bytes for `cv`.
pub fn generate_docx(cv: &CvData) -> Result<Vec<u8>, DocxError> {
    let mut docx = Docx::new()
        .add_style(heading_style("Title", "Title", TITLE_PT))
        .add_style(heading_style("Heading1", "heading 1", HEADING_PT));

    for block in blocks(cv) {
        docx = docx.add_paragraph(match block {
            Block::Title(text) => styled(&text, "Title").align(AlignmentType::Center),
            Block::Heading(text) => styled(&text, "Heading1"),
            Block::Bullet(text) => Paragraph::new()
                .add_run(Run::new().add_text("\u{2022} ").size(BODY_PT * 2))
                .add_run(Run::new().add_text(text).size(BODY_PT * 2)),
            Block::Strong(text) => {
                Paragraph::new().add_run(Run::new().add_text(text).bold().size(BODY_PT * 2))
            }
            Block::Body(text) => Paragraph::new().add_run(Run::new().add_text(text).size(BODY_PT * 2)),
        });
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| DocxError::Pack(e.to_string()))?;
    Ok(buf.into_inner())
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Title(String),
    Heading(String),
    Strong(String),
    Bullet(String),
    Body(String),
}

fn blocks(cv: &CvData) -> Vec<Block> {
    let mut out = Vec::new();
    let info = &cv.personal_info;
    let name = clean(&info.full_name);

    out.push(Block::Title(if name.is_empty() {
        "CV".to_string()
    } else {
        format!("CV - {name}")
    }));

    out.push(Block::Heading("PERSONAL INFORMATION".to_string()));
    let fields = [
        ("Name", Some(&info.full_name)),
        ("Email", Some(&info.email)),
        ("Phone", Some(&info.phone)),
        ("Location", Some(&info.location)),
        ("LinkedIn", info.linked_in.as_ref()),
        ("Website", info.website.as_ref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.map(|v| clean(v)).filter(|v| !v.is_empty()) {
            out.push(Block::Body(format!("{label}: {value}")));
        }
    }

    let summary = clean(&cv.professional_summary);
    if !summary.is_empty() {
        out.push(Block::Heading("PROFESSIONAL SUMMARY".to_string()));
        out.push(Block::Body(summary));
    }

    if !cv.experience.is_empty() {
        out.push(Block::Heading("EXPERIENCE".to_string()));
        for exp in &cv.experience {
            out.push(Block::Strong(format!(
                "{} - {}",
                clean(&exp.position),
                clean(&exp.company)
            )));
            let end = if exp.current {
                "Present".to_string()
            } else {
                clean(&exp.end_date)
            };
            out.push(Block::Body(format!("{} - {}", clean(&exp.start_date), end)));
            for line in clean_lines(&exp.description) {
                out.push(Block::Bullet(line));
            }
        }
    }

    if !cv.education.is_empty() {
        out.push(Block::Heading("EDUCATION".to_string()));
        for edu in &cv.education {
            let degree = [clean(&edu.degree), clean(&edu.field)]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" in ");
            out.push(Block::Strong(degree));
            out.push(Block::Body(format!(
                "{} ({} - {})",
                clean(&edu.institution),
                clean(&edu.start_date),
                clean(&edu.end_date)
            )));
            if let Some(gpa) = edu.gpa.as_deref().map(clean).filter(|g| !g.is_empty()) {
                out.push(Block::Body(format!("GPA: {gpa}")));
            }
        }
    }

    if !cv.skills.is_empty() {
        out.push(Block::Heading("SKILLS".to_string()));
        for category in SkillCategory::ALL {
            let names: Vec<String> = cv
                .skills
                .iter()
                .filter(|s| s.category == category)
                .map(|s| format!("{} ({})", clean(&s.name), s.level.as_str()))
                .collect();
            if !names.is_empty() {
                out.push(Block::Bullet(format!("{}: {}", category.as_str(), names.join(", "))));
            }
        }
    }

    if !cv.projects.is_empty() {
        out.push(Block::Heading("PROJECTS".to_string()));
        for project in &cv.projects {
            out.push(Block::Strong(clean(&project.name)));
            let description = clean(&project.description);
            if !description.is_empty() {
                out.push(Block::Body(description));
            }
            let tech: Vec<String> = project
                .technologies
                .iter()
                .map(|t| clean(t))
                .filter(|t| !t.is_empty())
                .collect();
            if !tech.is_empty() {
                out.push(Block::Body(format!("Technologies: {}", tech.join(", "))));
            }
            if let Some(link) = project.link.as_deref().map(clean).filter(|l| !l.is_empty()) {
                out.push(Block::Body(format!("Link: {link}")));
            }
        }
    }

    out
}

fn heading_style(style_id: &str, name: &str, size_pt: usize) -> Style {
    Style::new(style_id, StyleType::Paragraph)
        .name(name)
        .size(size_pt * 2)
        .bold()
}

fn styled(text: &str, style_id: &str) -> Paragraph {
    Paragraph::new().style(style_id).add_run(Run::new().add_text(text))
}

fn clean(s: &str) -> String {
    strip_markup(s)
}

/// One bullet per non-empty line of a free-text description.
fn clean_lines(s: &str) -> Vec<String> {
    strip_markup(s)
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*', '\u{2022}']).trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::fixtures::sample_cv;

    #[test]
    fn test_docx_is_zip_container() {
        let bytes = generate_docx(&sample_cv()).unwrap();
        assert!(bytes.starts_with(b"PK"));
        let empty = generate_docx(&CvData::default()).unwrap();
        assert!(empty.starts_with(b"PK"));
    }

    #[test]
    fn test_blocks_follow_section_order() {
        let headings: Vec<String> = blocks(&sample_cv())
            .into_iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h),
                _ => None,
            })
            .collect();
        assert_eq!(
            headings,
            vec![
                "PERSONAL INFORMATION",
                "PROFESSIONAL SUMMARY",
                "EXPERIENCE",
                "EDUCATION",
                "SKILLS",
                "PROJECTS"
            ]
        );
    }

    #[test]
    fn test_blocks_title_and_current_role() {
        let blocks = blocks(&sample_cv());
        assert_eq!(blocks[0], Block::Title("CV - Jane Doe".to_string()));
        assert!(blocks.contains(&Block::Body("2021-01 - Present".to_string())));
        assert!(blocks.contains(&Block::Bullet("Technical: Rust (Expert)".to_string())));
    }

    #[test]
    fn test_description_lines_become_bullets() {
        let lines = clean_lines("- Shipped <b>v2</b>\n\n* Cut latency\n");
        assert_eq!(lines, vec!["Shipped v2", "Cut latency"]);
    }
}
