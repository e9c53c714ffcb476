//! Input sanitization pipeline.
//!
//! Every untrusted string passes through [`validate`] before it reaches
//! storage or authentication. The steps run in a fixed order:
//!
//! 1. empty input short-circuits to an empty [`SafeText`]
//! 2. surrounding whitespace is trimmed
//! 3. kind-specific checks (`email`, `numeric`)
//! 4. markup-significant characters are escaped
//!
//! [`strip_sql_metacharacters`] is a separate textual filter. Persistence
//! never relies on it: every query binds its parameters.

use palaver_types::error::ValidationError;
use palaver_types::text::{InputKind, SafeText};

/// Validate and clean `input` according to `kind`.
///
/// The returned error names the kind as its field; use [`validate_field`]
/// to report the caller's field name instead.
pub fn validate(input: &str, kind: InputKind) -> Result<SafeText, ValidationError> {
    if input.is_empty() {
        return Ok(SafeText::default());
    }

    let trimmed = input.trim();

    match kind {
        InputKind::Plain => {}
        InputKind::Email => check_email(trimmed)
            .map_err(|reason| ValidationError::new(kind.to_string(), reason))?,
        InputKind::Numeric => check_numeric(trimmed)
            .map_err(|reason| ValidationError::new(kind.to_string(), reason))?,
    }

    Ok(SafeText::from_sanitized(escape_markup(trimmed)))
}

/// [`validate`], reporting failures against `field`.
pub fn validate_field(
    field: &str,
    input: &str,
    kind: InputKind,
) -> Result<SafeText, ValidationError> {
    validate(input, kind).map_err(|e| e.for_field(field))
}

/// Remove `;`, `"` and `--` from `text`, keeping every other character.
///
/// Defense in depth only. This is not a substitute for bound parameters.
pub fn strip_sql_metacharacters(text: &str) -> String {
    let without_chars: String = text.chars().filter(|c| !matches!(c, ';' | '"')).collect();
    without_chars.replace("--", "")
}

/// Escape `&`, `<`, `>`, `"` and `'` so the text renders literally in HTML.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// Whether `text` contains any character [`escape_markup`] would rewrite.
pub fn has_markup(text: &str) -> bool {
    text.chars().any(|c| matches!(c, '&' | '<' | '>' | '"' | '\''))
}

fn check_email(candidate: &str) -> Result<(), &'static str> {
    let mut parts = candidate.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err("email must contain exactly one '@'");
    };

    if local.is_empty() {
        return Err("email local part is empty");
    }
    if domain.is_empty() {
        return Err("email domain is empty");
    }
    if candidate.chars().any(char::is_whitespace) {
        return Err("email must not contain whitespace");
    }

    // At least one dot with a non-empty label on each side.
    let dotted = domain
        .match_indices('.')
        .any(|(i, _)| i > 0 && i + 1 < domain.len());
    if !dotted {
        return Err("email domain must contain a '.'");
    }

    Ok(())
}

fn check_numeric(candidate: &str) -> Result<(), &'static str> {
    if candidate.is_empty() || !candidate.chars().all(|c| c.is_ascii_digit()) {
        return Err("input must be numeric");
    }
    Ok(())
}
