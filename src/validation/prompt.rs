//! Prompt sanitization and validation.
//!
//! The denylist is defense in depth against markup injection in places that
//! may later render the prompt as HTML. It does not replace output encoding.

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::core::models::{PromptValidationResult, SanitizedPrompt};

/// Single source of truth for the prompt length limit, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

pub const MIN_PROMPT_CHARS: usize = 3;

/// Case-insensitive patterns rejected after sanitization.
pub const DENIED_PATTERNS: [&str; 7] = [
    r"<script",
    r"javascript:",
    r"on[A-Za-z0-9_]+=",
    r"eval\(",
    r"<iframe",
    r"<object",
    r"<embed",
];

static DENYLIST: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(DENIED_PATTERNS.iter().map(|p| format!("(?i){p}")))
        .expect("static prompt denylist compiles")
});

/// True for C0 controls, DEL and C1 controls (U+0000-U+001F, U+007F-U+009F).
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

/// Removes control characters and surrounding whitespace.
#[must_use]
pub fn sanitize_prompt(raw: &str) -> String {
    raw.chars()
        .filter(|&c| !is_stripped_control(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Cuts raw input to [`MAX_PROMPT_CHARS`] characters. Used where text is
/// collected, ahead of [`PromptValidator::validate`].
#[must_use]
pub fn clamp_prompt_input(raw: &str) -> &str {
    match raw.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

/// Returns the first denylist pattern matching `text`, if any.
#[must_use]
pub fn denied_pattern(text: &str) -> Option<&'static str> {
    DENYLIST
        .matches(text)
        .iter()
        .next()
        .map(|idx| DENIED_PATTERNS[idx])
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptValidator;

impl PromptValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn validate(&self, raw: &str) -> PromptValidationResult {
        let sanitized = sanitize_prompt(raw);
        let len = sanitized.chars().count();

        if len < MIN_PROMPT_CHARS {
            return PromptValidationResult::Invalid(format!(
                "Prompt too short (minimum {MIN_PROMPT_CHARS} characters)"
            ));
        }

        if len > MAX_PROMPT_CHARS {
            return PromptValidationResult::Invalid(format!(
                "Prompt too long (maximum {MAX_PROMPT_CHARS} characters)"
            ));
        }

        if let Some(pattern) = denied_pattern(&sanitized) {
            tracing::debug!("Prompt rejected by denylist pattern {:?}", pattern);
            return PromptValidationResult::Invalid(
                "Invalid characters or patterns detected".to_string(),
            );
        }

        PromptValidationResult::Valid(SanitizedPrompt::new(sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_compiles_and_matches() {
        assert_eq!(denied_pattern("<SCRIPT src=x>"), Some("<script"));
        assert_eq!(denied_pattern("img onerror=alert(1)"), Some("on[A-Za-z0-9_]+="));
        assert_eq!(denied_pattern("a calm lake at dawn"), None);
    }

    #[test]
    fn clamp_counts_characters_not_bytes() {
        let raw = "é".repeat(MAX_PROMPT_CHARS + 5);
        let clamped = clamp_prompt_input(&raw);
        assert_eq!(clamped.chars().count(), MAX_PROMPT_CHARS);

        assert_eq!(clamp_prompt_input("short"), "short");
    }

    #[test]
    fn sanitize_strips_c0_and_c1_controls() {
        assert_eq!(sanitize_prompt("  a\u{0000}b\u{0085}c\u{007F}  "), "abc");
    }
}
