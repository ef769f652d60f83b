//! HTML escaping for command output.

/// Escape `&`, `<`, and `>` for safe inclusion in HTML element content.
///
/// Quotes are left alone — the output lands inside a `<pre>`-style
/// block, never inside an attribute.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
