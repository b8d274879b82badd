//! Payloads handed to the external services as ordinary form submissions.

use serde::Serialize;

use crate::EmailAddress;
use crate::VerificationCode;

/// The single field posted by the email step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailChallengeForm {
    pub email: EmailAddress,
}

/// The single (hidden) field posted by the code step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCheckForm {
    pub code: VerificationCode,
}
