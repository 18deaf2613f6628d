//! Utility functions for the converter.
//!
//! - Message marker token shared by the generated runtime and its host
//! - Script block begin/end markers
//! - JS string escaping (injection-safe)

// ---------------------------------------------------------------------------
// Message Marker
// ---------------------------------------------------------------------------

/// Prefix identifying inbound cross-context messages addressed to the
/// generated runtime. Anything not carrying this prefix is ignored by the
/// message handler the bootstrap installs.
pub const MESSAGE_MARKER: &str = "sandbox-msg:";

/// Check whether a host message would be processed by the generated runtime.
pub fn is_marked_message(message: &str) -> bool {
    message.starts_with(MESSAGE_MARKER)
}

/// Build a host message the generated runtime will process.
pub fn marked_message(json: &str) -> String {
    format!("{}{}", MESSAGE_MARKER, json)
}

// ---------------------------------------------------------------------------
// Script Block Markers
// ---------------------------------------------------------------------------

/// Begin marker for one assembled script block. The label is the original
/// `src` for external scripts, or the inline counter rendered as decimal.
pub fn script_begin_marker(label: &str) -> String {
    format!("// ==== begin script [{}] ====", label)
}

/// End marker matching [`script_begin_marker`].
pub fn script_end_marker(label: &str) -> String {
    format!("// ==== end script [{}] ====", label)
}

// ---------------------------------------------------------------------------
// JS String Escaping
// ---------------------------------------------------------------------------

/// Escape a string for safe embedding inside a JS template literal
/// (backtick string). Prevents injection by escaping backslashes,
/// backticks, and `${`.
pub fn escape_template_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 16);
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push_str("\\${");
            }
            c => out.push(c),
        }
    }
    out
}

/// Encode a string as a JS double-quoted string literal, quotes included.
/// JSON string encoding is valid JS source, so `serde_json` owns the
/// escaping rules.
pub fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_message_round_trip() {
        let msg = marked_message(r#"{"button":1}"#);
        assert_eq!(msg, r#"sandbox-msg:{"button":1}"#);
        assert!(is_marked_message(&msg));
    }

    #[test]
    fn test_unmarked_message() {
        assert!(!is_marked_message(r#"{"button":1}"#));
        assert!(!is_marked_message("plain text"));
    }

    #[test]
    fn test_script_markers() {
        assert_eq!(script_begin_marker("0"), "// ==== begin script [0] ====");
        assert_eq!(
            script_end_marker("vendor/app.js"),
            "// ==== end script [vendor/app.js] ===="
        );
    }

    #[test]
    fn test_escape_template_literal() {
        assert_eq!(escape_template_literal("hello"), "hello");
        assert_eq!(escape_template_literal("a`b"), "a\\`b");
        assert_eq!(escape_template_literal("${x}"), "\\${x}");
        assert_eq!(escape_template_literal("a\\b"), "a\\\\b");
        // A lone `$` not followed by `{` is left alone
        assert_eq!(escape_template_literal("a$b"), "a$b");
    }

    #[test]
    fn test_escape_template_literal_trailing_dollar() {
        assert_eq!(escape_template_literal("cost: 5$"), "cost: 5$");
    }

    #[test]
    fn test_js_string() {
        assert_eq!(js_string("plain"), "\"plain\"");
        assert_eq!(js_string("he said \"hi\""), r#""he said \"hi\"""#);
        assert_eq!(js_string("line1\nline2"), r#""line1\nline2""#);
    }
}
