//! `{{dotted.path}}` token substitution.
//!
//! Tokens are resolved by walking the payload from its root one key at a time.
//! A token whose path hits a missing key or `null` is left in the output exactly
//! as written, so broken templates stay visible instead of silently losing text.

use serde::Serialize;
use serde_json::Value;

/// Result of rendering with bookkeeping about tokens that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderReport {
    /// Rendered text
    pub text: String,
    /// Paths of tokens left verbatim, in order of appearance
    pub unresolved: Vec<String>,
}

/// Render `template` against `payload`.
///
/// An empty template renders to an empty string. Resolved values are inserted
/// verbatim: no escaping and no second rendering pass.
pub fn render(template: &str, payload: &Value) -> String {
    render_with(template, payload, |_| {})
}

/// Like [`render`], but also reports the paths that stayed unresolved.
pub fn render_report(template: &str, payload: &Value) -> RenderReport {
    let mut unresolved = Vec::new();
    let text = render_with(template, payload, |path| unresolved.push(path.to_string()));
    RenderReport { text, unresolved }
}

/// Look up a dotted path in a JSON value.
///
/// Returns `None` when any step is missing or `null`. Array elements are
/// addressable by numeric segment (`items.0.name`).
pub fn resolve_path<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

fn render_with(template: &str, payload: &Value, mut on_unresolved: impl FnMut(&str)) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let path = after_open[..close].trim();
        if !is_valid_path(path) {
            // Not a token here; a token may still start at the next brace.
            out.push('{');
            rest = &rest[open + 1..];
            continue;
        }

        let token_len = 2 + close + 2;
        match resolve_path(payload, path) {
            Some(value) => out.push_str(&stringify(value)),
            None => {
                on_unresolved(path);
                out.push_str(&rest[open..open + token_len]);
            }
        }
        rest = &rest[open + token_len..];
    }

    out.push_str(rest);
    out
}

fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => stringify_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // Objects and arrays use their compact JSON form
        _ => value.to_string(),
    }
}

/// Integral floats print without a fractional part (`3.0` -> `3`).
fn stringify_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
