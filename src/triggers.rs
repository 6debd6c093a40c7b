// triggers.rs
use lazy_static::lazy_static;
use regex::Regex;

pub const TRIGGER_MARKER: &str = "[GENERATE_PROMPT]:";

lazy_static! {
    // Marker up to the end of its line; the prompt never spans lines.
    static ref TRIGGER_REGEX: Regex = Regex::new(r"\[GENERATE_PROMPT\]:([^\r\n]*)").expect("trigger regex");
}

/// Returns the image prompt carried by an assistant completion, if any.
///
/// Only the first marker is honored. A marker followed by nothing but
/// whitespace is malformed and yields no trigger.
pub fn extract_prompt(completion: &str) -> Option<String> {
    let captures = TRIGGER_REGEX.captures(completion)?;
    let prompt = captures.get(1)?.as_str().trim();
    if prompt.is_empty() {
        None
    } else {
        Some(prompt.to_string())
    }
}

/// Completion text with the marker lines removed, for display.
pub fn display_text(completion: &str) -> String {
    if !completion.contains(TRIGGER_MARKER) {
        return completion.to_string();
    }
    completion
        .lines()
        .filter(|line| !line.contains(TRIGGER_MARKER))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string()
}
