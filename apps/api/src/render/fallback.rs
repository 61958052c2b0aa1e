//! Browser-free renderer used when the primary capture fails.
//!
//! Always produces a genuine PDF: A4, built-in Helvetica, plain text layout
//! with naive word wrapping and pagination. No fonts or images on disk.
//!
//! The built-in fonts only cover WinAnsi (Latin-1 plus a few typographic
//! marks). Greek, Cyrillic and Latin Extended letters are transliterated;
//! anything else is written as `?` and counted in a warning.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use thiserror::Error;
use tracing::warn;

use crate::models::cv::{CvData, SkillCategory};
use crate::render::sanitize::strip_markup;

const PAGE_W: Mm = Mm(210.0);
const PAGE_H: Mm = Mm(297.0);
const MARGIN: f32 = 10.0;
const TOP: f32 = 297.0 - MARGIN;
const BOTTOM: f32 = MARGIN + 5.0;

const TITLE_PT: f32 = 18.0;
const HEADING_PT: f32 = 12.0;
const BODY_PT: f32 = 10.0;

/// Helvetica averages roughly half an em per glyph; at 10pt on a 190mm
/// measure that is ~105 characters.
const BODY_WRAP: usize = 100;

#[derive(Debug, Error)]
#[error("fallback PDF generation failed: {0}")]
pub struct FallbackError(pub(crate) String);

impl From<printpdf::Error> for FallbackError {
    fn from(e: printpdf::Error) -> Self {
        FallbackError(e.to_string())
    }
}

/// One line of output with its style.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Line {
    Title(String),
    Heading(String),
    Body(String),
    Gap,
}

/// Lays `cv` out as a flat list of lines. Kept separate from PDF writing so
/// the content is testable without parsing PDF streams.
pub(crate) fn layout(cv: &CvData) -> Vec<Line> {
    let mut lines = Vec::new();
    let info = &cv.personal_info;
    let name = clean(&info.full_name);

    lines.push(Line::Title(if name.is_empty() {
        "Curriculum Vitae".to_string()
    } else {
        name
    }));

    let contact: Vec<String> = [
        Some(&info.email),
        Some(&info.phone),
        Some(&info.location),
        info.linked_in.as_ref(),
        info.website.as_ref(),
    ]
    .into_iter()
    .flatten()
    .map(|v| clean(v))
    .filter(|v| !v.is_empty())
    .collect();
    if !contact.is_empty() {
        push_wrapped(&mut lines, &contact.join("  |  "));
    }

    let summary = clean(&cv.professional_summary);
    if !summary.is_empty() {
        heading(&mut lines, "PROFESSIONAL SUMMARY");
        push_wrapped(&mut lines, &summary);
    }

    if !cv.experience.is_empty() {
        heading(&mut lines, "EXPERIENCE");
        for exp in &cv.experience {
            let end = if exp.current {
                "Present".to_string()
            } else {
                clean(&exp.end_date)
            };
            let mut title = join_present(&[&clean(&exp.position), &clean(&exp.company)], " at ");
            let dates = join_present(&[&clean(&exp.start_date), &end], " - ");
            if !dates.is_empty() {
                title = format!("{title} ({dates})");
            }
            push_wrapped(&mut lines, &format!("- {title}"));
            let description = clean(&exp.description);
            if !description.is_empty() {
                push_wrapped_indented(&mut lines, &description);
            }
        }
    }

    if !cv.education.is_empty() {
        heading(&mut lines, "EDUCATION");
        for edu in &cv.education {
            let degree = join_present(&[&clean(&edu.degree), &clean(&edu.field)], " in ");
            let dates = join_present(&[&clean(&edu.start_date), &clean(&edu.end_date)], " - ");
            let mut text = join_present(&[&degree, &clean(&edu.institution)], ", ");
            if !dates.is_empty() {
                text = format!("{text} ({dates})");
            }
            push_wrapped(&mut lines, &format!("- {text}"));
        }
    }

    if !cv.skills.is_empty() {
        heading(&mut lines, "SKILLS");
        for category in SkillCategory::ALL {
            let names: Vec<String> = cv
                .skills
                .iter()
                .filter(|s| s.category == category)
                .map(|s| clean(&s.name))
                .filter(|n| !n.is_empty())
                .collect();
            if !names.is_empty() {
                push_wrapped(&mut lines, &format!("{}: {}", category.as_str(), names.join(", ")));
            }
        }
    }

    if !cv.projects.is_empty() {
        heading(&mut lines, "PROJECTS");
        for project in &cv.projects {
            push_wrapped(&mut lines, &format!("- {}", clean(&project.name)));
            let description = clean(&project.description);
            if !description.is_empty() {
                push_wrapped_indented(&mut lines, &description);
            }
            let tech: Vec<String> = project
                .technologies
                .iter()
                .map(|t| clean(t))
                .filter(|t| !t.is_empty())
                .collect();
            if !tech.is_empty() {
                push_wrapped_indented(&mut lines, &format!("Technologies: {}", tech.join(", ")));
            }
        }
    }

    lines
}

/// Renders `cv` to a simplified A4 PDF.
pub fn render_fallback_pdf(cv: &CvData) -> Result<Vec<u8>, FallbackError> {
    let title = match clean(&cv.personal_info.full_name) {
        n if n.is_empty() => "CV".to_string(),
        n => format!("CV - {n}"),
    };
    let (doc, page, layer) = PdfDocument::new(&title, PAGE_W, PAGE_H, "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        y: TOP,
    };

    let mut unencodable = 0;
    let mut encode = |text: &str| {
        let (encoded, lost) = to_winansi(text);
        unencodable += lost;
        encoded
    };
    for line in layout(cv) {
        match line {
            Line::Title(text) => writer.text(&encode(&text), TITLE_PT, &bold, 10.0),
            Line::Heading(text) => writer.text(&encode(&text), HEADING_PT, &bold, 7.0),
            Line::Body(text) => writer.text(&encode(&text), BODY_PT, &regular, 5.0),
            Line::Gap => writer.advance(3.0),
        }
    }
    drop(writer);
    if unencodable > 0 {
        warn!(
            unencodable,
            "Fallback font cannot encode some characters; written as '?'"
        );
    }

    let mut buf = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut buf)?;
    buf.into_inner()
        .map_err(|e| FallbackError(format!("flush failed: {e}")))
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter<'_> {
    fn text(&mut self, text: &str, size: f32, font: &IndirectFontRef, leading: f32) {
        self.advance(leading);
        self.layer
            .use_text(text, size, Mm(MARGIN), Mm(self.y), font);
    }

    fn advance(&mut self, mm: f32) {
        if self.y - mm < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_W, PAGE_H, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
        self.y -= mm;
    }
}

/// Characters in WinAnsi's 0x80-0x9F block.
const WINANSI_EXTRAS: &str = "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ";

/// Rewrites `text` into characters the built-in fonts can draw. Returns the
/// text and how many characters had no stand-in.
pub(crate) fn to_winansi(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut lost = 0;
    for c in text.chars() {
        if matches!(c, ' '..='~' | '\u{a0}'..='\u{ff}') || WINANSI_EXTRAS.contains(c) {
            out.push(c);
        } else if c.is_whitespace() {
            out.push(' ');
        } else if matches!(c, '\u{200b}'..='\u{200d}' | '\u{feff}') {
            continue;
        } else if let Some(latin) = transliterate(c) {
            out.push_str(&latin);
        } else {
            out.push('?');
            lost += 1;
        }
    }
    (out, lost)
}

/// Latin spelling of a Greek, Cyrillic or Latin Extended-A letter, keeping
/// its case.
fn transliterate(c: char) -> Option<String> {
    let mut lower = c.to_lowercase();
    let base = match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => return None,
    };
    let latin = match base {
        // Greek
        'α' | 'ά' => "a",
        'β' => "v",
        'γ' => "g",
        'δ' => "d",
        'ε' | 'έ' => "e",
        'ζ' => "z",
        'η' | 'ή' => "i",
        'θ' => "th",
        'ι' | 'ί' | 'ϊ' | 'ΐ' => "i",
        'κ' => "k",
        'λ' => "l",
        'μ' => "m",
        'ν' => "n",
        'ξ' => "x",
        'ο' | 'ό' => "o",
        'π' => "p",
        'ρ' => "r",
        'σ' | 'ς' => "s",
        'τ' => "t",
        'υ' | 'ύ' | 'ϋ' | 'ΰ' => "y",
        'φ' => "f",
        'χ' => "ch",
        'ψ' => "ps",
        'ω' | 'ώ' => "o",
        // Cyrillic
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' | 'ґ' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'є' => "ye",
        'ж' => "zh",
        'з' => "z",
        'и' | 'і' => "i",
        'ї' => "yi",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Latin Extended-A
        'ā' | 'ă' | 'ą' => "a",
        'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' => "d",
        'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ń' | 'ņ' | 'ň' => "n",
        'ō' | 'ŏ' | 'ő' => "o",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'ș' => "s",
        'ţ' | 'ť' | 'ŧ' | 'ț' => "t",
        'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ŷ' => "y",
        'ź' | 'ż' => "z",
        _ => return None,
    };
    if c.is_uppercase() {
        let mut chars = latin.chars();
        Some(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        })
    } else {
        Some(latin.to_string())
    }
}

fn clean(s: &str) -> String {
    strip_markup(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_present(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(sep)
}

fn heading(lines: &mut Vec<Line>, text: &str) {
    lines.push(Line::Gap);
    lines.push(Line::Heading(text.to_string()));
}

fn push_wrapped(lines: &mut Vec<Line>, text: &str) {
    lines.extend(wrap(text, BODY_WRAP).into_iter().map(Line::Body));
}

fn push_wrapped_indented(lines: &mut Vec<Line>, text: &str) {
    lines.extend(
        wrap(text, BODY_WRAP - 4)
            .into_iter()
            .map(|l| Line::Body(format!("    {l}"))),
    );
}

/// Greedy word wrap by character count. Words longer than `width` are split.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.chars().count() > width {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let split_at = word
                .char_indices()
                .nth(width)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            let rest = word.split_off(split_at);
            out.push(word);
            word = rest;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::fixtures::sample_cv;
    use crate::render::signature::has_pdf_signature;

    #[test]
    fn test_fallback_produces_pdf_signature() {
        let bytes = render_fallback_pdf(&sample_cv()).unwrap();
        assert!(has_pdf_signature(&bytes));
    }

    #[test]
    fn test_fallback_handles_empty_document() {
        let bytes = render_fallback_pdf(&CvData::default()).unwrap();
        assert!(has_pdf_signature(&bytes));
        assert_eq!(
            layout(&CvData::default()),
            vec![Line::Title("Curriculum Vitae".to_string())]
        );
    }

    #[test]
    fn test_fallback_paginates_long_documents() {
        let mut cv = sample_cv();
        cv.professional_summary = "word ".repeat(8_000);
        let bytes = render_fallback_pdf(&cv).unwrap();
        assert!(has_pdf_signature(&bytes));
    }

    #[test]
    fn test_layout_sections_and_markup_removed() {
        let mut cv = sample_cv();
        cv.projects[0].description = "<b>Fast</b> renderer".to_string();
        let lines = layout(&cv);
        assert_eq!(lines[0], Line::Title("Jane Doe".to_string()));
        for heading in ["PROFESSIONAL SUMMARY", "EXPERIENCE", "EDUCATION", "SKILLS", "PROJECTS"] {
            assert!(lines.contains(&Line::Heading(heading.to_string())), "{heading}");
        }
        assert!(lines.contains(&Line::Body(
            "- Senior Engineer at Acme (2021-01 - Present)".to_string()
        )));
        assert!(lines.contains(&Line::Body("    Fast renderer".to_string())));
        assert!(lines.contains(&Line::Body("Technical: Rust".to_string())));
    }

    #[test]
    fn test_winansi_keeps_latin1_and_transliterates() {
        assert_eq!(to_winansi("Zoë Müller – “CV”"), ("Zoë Müller – “CV”".to_string(), 0));
        assert_eq!(to_winansi("Οδυσσέας"), ("Odysseas".to_string(), 0));
        assert_eq!(to_winansi("Юлия Щукина"), ("Yuliya Shchukina".to_string(), 0));
        assert_eq!(to_winansi("Łukasz Dvořák"), ("Lukasz Dvorák".to_string(), 0));
        assert_eq!(to_winansi("a\u{200b}b\u{2009}c"), ("ab c".to_string(), 0));
    }

    #[test]
    fn test_winansi_counts_characters_without_stand_in() {
        let (text, lost) = to_winansi("李雷 Οδυσσέας Zoë 🚀");
        assert_eq!(text, "?? Odysseas Zoë ?");
        assert_eq!(lost, 3);
    }

    #[test]
    fn test_fallback_renders_non_latin_name() {
        let mut cv = sample_cv();
        cv.personal_info.full_name = "李雷 Οδυσσέας Zoë 🚀".to_string();
        assert_eq!(
            layout(&cv)[0],
            Line::Title("李雷 Οδυσσέας Zoë 🚀".to_string())
        );
        let bytes = render_fallback_pdf(&cv).unwrap();
        assert!(has_pdf_signature(&bytes));
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        let lines = wrap("abcdefghijkl xy", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl xy"]);
    }

    #[test]
    fn test_wrap_empty() {
        assert!(wrap("   ", 10).is_empty());
    }
}
