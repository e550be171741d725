use std::sync::OnceLock;

use regex::Regex;

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

// Tags that start a new line when rendered
fn block_tag_regex() -> &'static Regex {
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    BLOCK.get_or_init(|| {
        Regex::new(r"(?is)</?(p|div|br|li|ul|ol|h[1-6]|blockquote|pre|tr)\b[^>]*>").unwrap()
    })
}

/// Returns the human-visible text of a rich-text body.
///
/// Block-level tags become line breaks, other tags are dropped, and the common
/// character entities are decoded.
pub fn strip_markup(body: &str) -> String {
    if !body.contains('<') && !body.contains('&') {
        return body.to_string();
    }

    let text = block_tag_regex().replace_all(body, "\n");
    let text = tag_regex().replace_all(&text, "");
    decode_entities(&text)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// First non-empty line of the visible body, cut to `max_chars` characters.
pub fn preview(body: &str, max_chars: usize) -> String {
    let text = strip_markup(body);
    let first_line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(strip_markup("just text"), "just text");
    }

    #[test]
    fn test_inline_tags_dropped() {
        assert_eq!(strip_markup("Discuss <b>road</b>map"), "Discuss roadmap");
        assert_eq!(
            strip_markup(r#"<img src="a.png" alt="x">caption"#),
            "caption"
        );
    }

    #[test]
    fn test_block_tags_break_lines() {
        let text = strip_markup("<p>one</p><p>two</p>");
        let lines: Vec<&str> = text.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(strip_markup("a&nbsp;&amp;&nbsp;b &lt;3"), "a & b <3");
        assert_eq!(strip_markup("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("<p></p><p>  hello world  </p>", 100), "hello world");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("", 10), "");
    }
}
