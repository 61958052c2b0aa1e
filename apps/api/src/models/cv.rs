use serde::{Deserialize, Deserializer, Serialize};

/// The root résumé document submitted by the wizard.
///
/// Every field carries a serde default so a half-filled document still
/// deserializes; completeness is enforced by the form layer, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    pub personal_info: PersonalInfo,
    pub professional_summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub experience_level: ExperienceLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub current: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: SkillLevel,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Advanced => "Advanced",
            SkillLevel::Expert => "Expert",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillCategory {
    #[default]
    Technical,
    Soft,
    Language,
}

impl SkillCategory {
    /// Display order used by templates that group skills.
    pub const ALL: [SkillCategory; 3] = [
        SkillCategory::Technical,
        SkillCategory::Soft,
        SkillCategory::Language,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "Technical",
            SkillCategory::Soft => "Soft",
            SkillCategory::Language => "Language",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(deserialize_with = "string_or_list")]
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Fresh,
    #[default]
    Professional,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Fresh => "fresh",
            ExperienceLevel::Professional => "professional",
        }
    }
}

/// Older wizard builds stored project technologies as one comma- or
/// semicolon-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Technologies {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Technologies::deserialize(deserializer)? {
        Technologies::List(items) => items,
        Technologies::Joined(joined) => joined
            .split([',', ';'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Serializes a document the way the browser persists it.
pub fn export_to_json(cv: &CvData) -> String {
    // CvData holds only strings, bools and enums; serialization cannot fail.
    serde_json::to_string_pretty(cv).unwrap_or_default()
}

/// Parses a previously exported document.
///
/// Returns `None` for malformed JSON, non-objects, and objects without
/// `personalInfo`.
pub fn import_from_json(json: &str) -> Option<CvData> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    if !value.get("personalInfo").is_some_and(|v| v.is_object()) {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Fully populated document used across render and handler tests.
    pub fn sample_cv() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                full_name: "Jane Doe".to_string(),
                email: "jane@x.com".to_string(),
                phone: "123".to_string(),
                location: "NYC".to_string(),
                linked_in: Some("linkedin.com/in/janedoe".to_string()),
                website: None,
            },
            professional_summary: "Backend engineer focused on reliable document pipelines."
                .to_string(),
            experience: vec![
                Experience {
                    id: "id_1".to_string(),
                    company: "Acme".to_string(),
                    position: "Senior Engineer".to_string(),
                    location: "Remote".to_string(),
                    start_date: "2021-01".to_string(),
                    end_date: String::new(),
                    current: true,
                    description: "Led the rendering platform.".to_string(),
                },
                Experience {
                    id: "id_2".to_string(),
                    company: "Initech".to_string(),
                    position: "Engineer".to_string(),
                    location: "Austin".to_string(),
                    start_date: "2018-06".to_string(),
                    end_date: "2020-12".to_string(),
                    current: false,
                    description: "Built billing exports.".to_string(),
                },
            ],
            education: vec![Education {
                id: "id_3".to_string(),
                institution: "State University".to_string(),
                degree: "BSc".to_string(),
                field: "Computer Science".to_string(),
                start_date: "2014".to_string(),
                end_date: "2018".to_string(),
                gpa: Some("3.8".to_string()),
            }],
            skills: vec![
                Skill {
                    id: "id_4".to_string(),
                    name: "Rust".to_string(),
                    level: SkillLevel::Expert,
                    category: SkillCategory::Technical,
                },
                Skill {
                    id: "id_5".to_string(),
                    name: "Mentoring".to_string(),
                    level: SkillLevel::Advanced,
                    category: SkillCategory::Soft,
                },
                Skill {
                    id: "id_6".to_string(),
                    name: "Spanish".to_string(),
                    level: SkillLevel::Intermediate,
                    category: SkillCategory::Language,
                },
            ],
            projects: vec![Project {
                id: "id_7".to_string(),
                name: "cvgen".to_string(),
                description: "Renders résumés to PDF.".to_string(),
                technologies: vec!["Rust".to_string(), "Chrome".to_string()],
                link: Some("https://example.com/cvgen".to_string()),
            }],
            experience_level: ExperienceLevel::Professional,
        }
    }
}
