/// Identifier used when sanitization leaves nothing behind.
pub const FALLBACK_IDENTIFIER: &str = "task";

const WRAP_WIDTH: usize = 32;
const WRAP_MAX_LINES: usize = 3;

/// Reduces free text to a workflow stage identifier: letters, digits and
/// underscores only, collapsed and trimmed, lower-cased, never starting
/// with a digit.
pub fn sanitize_identifier(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_underscore = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            prev_underscore = false;
        } else if ch == '_' && !prev_underscore {
            out.push('_');
            prev_underscore = true;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return FALLBACK_IDENTIFIER.to_string();
    }
    if trimmed.starts_with(|ch: char| ch.is_ascii_digit()) {
        return format!("n_{trimmed}");
    }
    trimmed.to_string()
}

/// Escapes a value for embedding in a double-quoted wire-format string.
/// Newlines become the format's line-break token.
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Word-wraps label text to at most three lines of `WRAP_WIDTH` columns.
/// Overflow past the third line is elided.
pub fn wrap_label(input: &str) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    let mut lines: Vec<String> = Vec::new();
    let mut elided = false;

    for word in words {
        match lines.last_mut() {
            Some(line) if line.len() + 1 + word.len() <= WRAP_WIDTH => {
                line.push(' ');
                line.push_str(word);
            }
            _ => {
                if lines.len() == WRAP_MAX_LINES {
                    elided = true;
                    break;
                }
                lines.push(word.to_string());
            }
        }
    }

    if elided {
        if let Some(last) = lines.last_mut() {
            last.push_str(" ...");
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_identifier_mixed_input_expected_clean_slug() {
        assert_eq!(sanitize_identifier("User Auth (v2)"), "userauthv2");
        assert_eq!(sanitize_identifier("__load__data__"), "load_data");
        assert_eq!(sanitize_identifier("Parse-Tree"), "parsetree");
    }

    #[test]
    fn sanitize_identifier_leading_digit_expected_prefixed() {
        assert_eq!(sanitize_identifier("42_tasks"), "n_42_tasks");
    }

    #[test]
    fn sanitize_identifier_all_invalid_expected_fallback() {
        assert_eq!(sanitize_identifier("!!! ???"), FALLBACK_IDENTIFIER);
        assert_eq!(sanitize_identifier(""), FALLBACK_IDENTIFIER);
        assert_eq!(sanitize_identifier("___"), FALLBACK_IDENTIFIER);
    }

    #[test]
    fn escape_attr_special_characters_expected_escaped() {
        assert_eq!(escape_attr(r#"say "hi"\now"#), r#"say \"hi\"\\now"#);
        assert_eq!(escape_attr("a\nb"), "a\\nb");
    }

    #[test]
    fn wrap_label_short_text_expected_single_line() {
        assert_eq!(wrap_label("short label"), "short label");
    }

    #[test]
    fn wrap_label_long_text_expected_three_lines_max() {
        let long = "one two three four five six seven eight nine ten \
                    eleven twelve thirteen fourteen fifteen sixteen";
        let wrapped = wrap_label(long);
        assert!(wrapped.lines().count() <= 3);
        assert!(wrapped.ends_with("..."));
        for line in wrapped.lines() {
            assert!(line.len() <= 40, "line too wide: {line}");
        }
    }
}
