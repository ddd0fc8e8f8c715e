//! URL-safe, human-readable identifiers derived from an event's subject and location.
//!
//! Slugs are deterministic but not unique: two events with the same subject
//! at the same location share one.

use regex::Regex;
use std::sync::OnceLock;

const FALLBACK_COMPONENT: &str = "unknown";

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("static slug regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static slug regex"))
}

fn hyphen_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("static slug regex"))
}

/// Normalises one free-text field into a slug component.
///
/// Returns `"unknown"` when nothing survives normalisation.
pub fn normalize_component(input: &str) -> String {
    let stripped = disallowed_chars().replace_all(input, "");
    let hyphenated = whitespace_runs().replace_all(&stripped, "-");
    let collapsed = hyphen_runs().replace_all(&hyphenated, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.is_empty() {
        FALLBACK_COMPONENT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds the slug for an event from its (optional) subject and location.
///
/// Total over all inputs; the result is never empty.
pub fn create_slug(subject: Option<&str>, location: Option<&str>) -> String {
    let subject = subject.unwrap_or_default().trim().to_lowercase();
    let location = location.unwrap_or_default().trim().to_lowercase();

    format!(
        "{}-{}",
        normalize_component(&subject),
        normalize_component(&location)
    )
    .to_lowercase()
}
