//! HTML templates, embedded at compile time.
//!
//! Placeholders use `{{name}}` and are filled by `render`.

/// Page shell with navigation, styles and the checkbox toggle script.
pub const BASE_TEMPLATE: &str = include_str!("templates/base.html");

/// Task lists and the add-task form.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// Calendar view with month grid and window task lists.
pub const CALENDAR_TEMPLATE: &str = include_str!("templates/calendar.html");

/// Fill `{{name}}` placeholders in one pass over `template`.
///
/// Substituted values are never rescanned, so user text that looks like a
/// placeholder is emitted as-is. Unknown placeholders are left in place.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[open..open + close + 4]),
        }
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}
