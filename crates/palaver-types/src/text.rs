//! Sanitized text types.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// The validation rule applied to an untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Free text: trimmed and markup-escaped.
    Plain,
    /// An email address: `local@domain.tld`.
    Email,
    /// ASCII decimal digits only.
    Numeric,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Plain => write!(f, "plain"),
            InputKind::Email => write!(f, "email"),
            InputKind::Numeric => write!(f, "numeric"),
        }
    }
}

impl FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(InputKind::Plain),
            "email" => Ok(InputKind::Email),
            "numeric" | "number" => Ok(InputKind::Numeric),
            other => Err(format!("invalid input kind: '{other}'")),
        }
    }
}

/// Text that has passed the sanitization pipeline.
///
/// Only the sanitizer in `palaver-core` constructs values of this type, so
/// holding a `SafeText` means the content is trimmed and markup-escaped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SafeText(String);

impl SafeText {
    /// Wrap an already-sanitized string.
    ///
    /// Callers outside the sanitizer should go through `sanitize::validate`.
    #[doc(hidden)]
    pub fn from_sanitized(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_kind_roundtrip() {
        for kind in [InputKind::Plain, InputKind::Email, InputKind::Numeric] {
            let parsed: InputKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_input_kind_aliases() {
        assert_eq!("text".parse::<InputKind>().unwrap(), InputKind::Plain);
        assert_eq!("number".parse::<InputKind>().unwrap(), InputKind::Numeric);
    }

    #[test]
    fn test_safe_text_serializes_as_string() {
        let text = SafeText::from_sanitized("&lt;b&gt;".to_string());
        assert_eq!(serde_json::to_string(&text).unwrap(), "\"&lt;b&gt;\"");
    }
}
