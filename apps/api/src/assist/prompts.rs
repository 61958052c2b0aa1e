// Prompt templates for the writing-assist endpoints.
// Placeholders are filled with already-sanitized user input.

use crate::llm_client::prompts::{fill, PLAIN_TEXT_ONLY};

const REWRITE_EXPERIENCE_TEMPLATE: &str = r#"Rewrite the following job experience description to make it more professional and impactful for a CV.

Role: {role}
Company: {company}
Original description: {text}

Guidelines:
1. Use strong action verbs
2. Quantify achievements where the input supports it
3. Highlight relevant skills and technologies
4. Keep it concise
5. Use bullet points if appropriate
6. Focus on achievements rather than responsibilities"#;

const SUMMARY_TEMPLATE: &str = r#"Write a professional summary for a CV.

Experience level: {level}
Target role: {role}
Key skills: {skills}

Write 2-3 sentences that:
1. Reflect the experience level
2. Mention the key skills
3. Show enthusiasm for the target role
4. Avoid cliches and generic phrases"#;

const SUGGEST_SKILLS_TEMPLATE: &str = r#"Suggest 8-12 relevant skills for someone applying for a {role} position with {level} experience level.

Include:
1. A mix of technical and soft skills
2. Skills currently in demand for this role
3. Skills appropriate for the experience level

Return the skills as a single comma-separated list."#;

const PROJECT_DESCRIPTION_TEMPLATE: &str = r#"Write a professional project description for a CV.

Project name: {name}
Technologies used: {technologies}
Project type: {kind}

Write 2-3 sentences that:
1. Explain what the project does and why
2. Highlight the key technologies and features
3. Mention realistic impact or results
4. Focus on technical achievements and problem-solving"#;

pub const DEFAULT_PROJECT_TYPE: &str = "Web/Software Project";

fn finish(body: String) -> String {
    format!("{body}\n\n{PLAIN_TEXT_ONLY}")
}

pub fn rewrite_experience(text: &str, role: &str, company: &str) -> String {
    finish(fill(
        REWRITE_EXPERIENCE_TEMPLATE,
        &[("role", role), ("company", company), ("text", text)],
    ))
}

pub fn summarize_profile(level: &str, role: &str, skills: &[String]) -> String {
    finish(fill(
        SUMMARY_TEMPLATE,
        &[("level", level), ("role", role), ("skills", &skills.join(", "))],
    ))
}

pub fn suggest_skills(role: &str, level: &str) -> String {
    finish(fill(SUGGEST_SKILLS_TEMPLATE, &[("role", role), ("level", level)]))
}

pub fn project_description(name: &str, technologies: &[String], kind: Option<&str>) -> String {
    finish(fill(
        PROJECT_DESCRIPTION_TEMPLATE,
        &[
            ("name", name),
            ("technologies", &technologies.join(", ")),
            ("kind", kind.unwrap_or(DEFAULT_PROJECT_TYPE)),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_have_no_unfilled_placeholders() {
        let prompts = [
            rewrite_experience("Did things at scale", "SRE", "Acme"),
            summarize_profile("fresh", "Data Analyst", &["SQL".to_string(), "Python".to_string()]),
            suggest_skills("Backend Engineer", "professional"),
            project_description("cvgen", &["Rust".to_string()], None),
        ];
        for prompt in &prompts {
            assert!(!prompt.contains('{'), "unfilled placeholder in: {prompt}");
            assert!(prompt.ends_with(PLAIN_TEXT_ONLY));
        }
    }

    #[test]
    fn test_project_type_defaults() {
        let prompt = project_description("cvgen", &["Rust".to_string(), "Chrome".to_string()], None);
        assert!(prompt.contains("Project type: Web/Software Project"));
        assert!(prompt.contains("Technologies used: Rust, Chrome"));
        let prompt = project_description("cvgen", &["Rust".to_string()], Some("CLI tool"));
        assert!(prompt.contains("Project type: CLI tool"));
    }
}
