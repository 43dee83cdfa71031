use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

/// Literal `\u` or `\x` left behind by escaping
static ESCAPE_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\u|\\x").expect("escape artifact pattern is valid"));

/// Rewrite `input` as printable ASCII.
///
/// Backslash becomes `\\`; tab, newline and carriage return use their short
/// escapes; other control characters and code points up to 0xff become
/// `\xhh`; the rest of the BMP becomes `\uhhhh` and anything above it
/// `\Uhhhhhhhh`. Printable ASCII passes through unchanged.
pub fn unicode_escape(input: &str) -> String {
    if input.bytes().all(|b| (0x20..0x7f).contains(&b) && b != b'\\') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        let code = c as u32;
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ' '..='~' => out.push(c),
            _ if code <= 0xff => {
                let _ = write!(out, "\\x{:02x}", code);
            }
            _ if code <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", code);
            }
            _ => {
                let _ = write!(out, "\\U{:08x}", code);
            }
        }
    }
    out
}

/// True when the value still looks like a raw `\u`/`\x` escape sequence
pub fn has_escape_artifact(value: &str) -> bool {
    ESCAPE_ARTIFACT.is_match(value)
}

/// Collapse pipe-delimited multi-values.
///
/// More than one `|` keeps only the text before the first one. A single
/// `|` is not treated as a list, so `"a|b"` survives whole. Either way the
/// result is trimmed.
pub fn collapse_multi_value(value: &str) -> String {
    if value.matches('|').count() > 1 {
        value.split('|').next().unwrap_or_default().trim().to_string()
    } else {
        value.trim().to_string()
    }
}
