//! Shared, UI-free types for the verification flow.
//!
//! Both the widget library (`otp-tui`) and the binary (`otp-cli`) depend on this crate so the
//! rules that decide what gets transmitted (digit normalization, the email shape check, and the
//! form payloads) live in exactly one place.

pub mod code;
pub mod email;
mod error;
pub mod forms;

pub use code::CODE_LENGTH;
pub use code::VerificationCode;
pub use email::EmailAddress;
pub use error::ValidationError;
pub use forms::CodeCheckForm;
pub use forms::EmailChallengeForm;
