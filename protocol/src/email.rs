use serde::Serialize;

use crate::ValidationError;

/// Whitespace as browsers define it for `\s` and `trim()`: Unicode White_Space plus the BOM.
fn is_web_whitespace(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{FEFF}'
}

/// Fixed shape check for an email address.
///
/// Accepts `local@domain` where neither side contains whitespace or `@`, both sides are
/// non-empty, and the domain has a `.` with at least one character on each side of it. This is a
/// UX hint only; the challenge service is the authority.
pub fn looks_like_email(text: &str) -> bool {
    if text.chars().any(is_web_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(idx, ch)| ch == '.' && idx > 0 && idx + 1 < domain.len())
}

/// A trimmed email address that passed [`looks_like_email`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim_matches(is_web_whitespace);
        if !looks_like_email(trimmed) {
            return Err(ValidationError::MalformedEmail);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
