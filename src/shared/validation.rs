use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

lazy_static! {
    /// Regex for display names (categories, settings labels)
    /// Must not start or end with whitespace and must not contain control characters
    /// - Valid: "General", "Off Topic", "Q & A"
    /// - Invalid: " General", "General ", "Line\nBreak", ""
    pub static ref DISPLAY_NAME_REGEX: Regex = Regex::new(r"^[^\s\p{Cc}](?:[^\p{Cc}]*[^\s\p{Cc}])?$").unwrap();
}

/// Flatten validator output into `"field: message"` strings, sorted by field.
pub fn field_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let detail = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{}: {}", field, detail)
            })
        })
        .collect();
    messages.sort();
    messages
}
