//! Tool name sanitation (§4.2).

/// Sanitize a raw tool name into the `[A-Za-z0-9_-]+` alphabet the
/// `ToolManager` requires.
///
/// Any character outside the allowed alphabet becomes `_`, consecutive
/// underscores produced this way are collapsed to one, a name starting with
/// a digit is prefixed with `n_`, and an empty result becomes `unnamed`.
#[must_use]
pub fn sanitize_tool_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_underscore = false;
    for ch in raw.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        out.push(mapped);
    }

    if out.is_empty() {
        return "unnamed".to_string();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert_str(0, "n_");
    }
    out
}
