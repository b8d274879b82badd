/// The otp-verify version.
///
/// Release builds may inject the tag version via the `OTP_VERIFY_VERSION` environment variable so
/// a release can be cut by tagging without editing `Cargo.toml`.
pub const OTP_VERIFY_VERSION: &str = match option_env!("OTP_VERIFY_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
