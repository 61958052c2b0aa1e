// Shared prompt fragments.
// Each feature that needs LLM calls defines its own prompts.rs alongside it.

/// Appended to every assist prompt; the reply is inserted into a form field verbatim.
pub const PLAIN_TEXT_ONLY: &str = "Return only the requested text. \
    Do NOT add headings, labels, quotes, markdown formatting, or any explanation.";

/// Fills `{key}` placeholders in `template`. Unknown placeholders are left as-is.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_replaces_every_occurrence() {
        let out = fill("{role} at {company}; again {role}", &[("role", "SRE"), ("company", "Acme")]);
        assert_eq!(out, "SRE at Acme; again SRE");
    }

    #[test]
    fn test_fill_leaves_unknown_placeholders() {
        assert_eq!(fill("{missing}", &[("role", "x")]), "{missing}");
    }
}
