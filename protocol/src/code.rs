use std::fmt;

use serde::Serialize;

use crate::ValidationError;

/// Number of digits in a verification code (and slots in the entry widget).
pub const CODE_LENGTH: usize = 6;

/// Returns only the ASCII decimal digits of `input`, in order.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// A complete verification code: exactly [`CODE_LENGTH`] ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Validates an already-assembled code.
    ///
    /// The input is taken verbatim: callers are expected to have filtered non-digits already, so
    /// anything other than six digits is reported as incomplete.
    pub fn parse(assembled: &str) -> Result<Self, ValidationError> {
        let entered = assembled.chars().count();
        if entered != CODE_LENGTH || !assembled.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::IncompleteCode {
                entered: digits_only(assembled).len().min(CODE_LENGTH),
                expected: CODE_LENGTH,
            });
        }
        Ok(Self(assembled.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
