/// Conditions that block a form submission on the client.
///
/// Non-digit input and oversized pastes are not represented here: they are normalized away
/// silently and never surface as errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The email field does not look like `local@domain.tld`.
    #[error("enter a valid email address")]
    MalformedEmail,

    /// Fewer than [`crate::CODE_LENGTH`] digits were entered at submission time.
    #[error("enter all {expected} digits of the verification code ({entered} entered)")]
    IncompleteCode { entered: usize, expected: usize },
}
