//! Sanitizing step applied to every user-supplied string before it is
//! interpolated into a template or an AI prompt.

use std::sync::OnceLock;

use regex::Regex;

fn script_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?</script\s*>").expect("script pattern is valid")
    })
}

fn any_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Removes `<script>` blocks (with their contents) and every remaining tag,
/// then trims surrounding whitespace.
pub fn strip_markup(input: &str) -> String {
    let without_scripts = script_block().replace_all(input, "");
    any_tag().replace_all(&without_scripts, "").trim().to_string()
}

/// Escapes the characters that are significant in HTML text and attribute
/// context.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Strip then escape. Output is safe to place anywhere in an HTML body.
pub fn sanitize_html(input: &str) -> String {
    escape_html(&strip_markup(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_block_removed_with_contents() {
        let input = "Built <script>alert('x')</script>a parser";
        assert_eq!(strip_markup(input), "Built a parser");
    }

    #[test]
    fn test_multiline_uppercase_script_removed() {
        let input = "ok<SCRIPT type=\"text/javascript\">\nsteal()\n</SCRIPT >";
        assert_eq!(strip_markup(input), "ok");
    }

    #[test]
    fn test_tags_removed_text_kept() {
        assert_eq!(strip_markup("  <b>Rust</b> <i>expert</i> "), "Rust expert");
    }

    #[test]
    fn test_closing_div_cannot_escape_structure() {
        let out = sanitize_html("</div></body><h1>pwned");
        assert!(!out.contains('<'));
        assert_eq!(out, "pwned");
    }

    #[test]
    fn test_stray_angle_bracket_is_escaped() {
        assert_eq!(sanitize_html("latency < 5ms & p99"), "latency &lt; 5ms &amp; p99");
    }

    #[test]
    fn test_quotes_escaped() {
        assert_eq!(escape_html("O'Brien \"Jr\""), "O&#39;Brien &quot;Jr&quot;");
    }
}
