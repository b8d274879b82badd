// Forbid accidental stdout/stderr writes in the library portion of the TUI.
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod app_event;
mod app_event_sender;
mod code_entry;
mod code_prompt;
mod cooldown;
mod email_entry;
mod email_prompt;
mod key_hint;
mod notice;
mod render;
mod tick_source;
mod tui;
mod verification_widget;
mod verify_tui;
mod version;

pub use code_entry::CodeEntry;
pub use code_entry::DigitSlots;
pub use code_entry::SlotEdit;
pub use cooldown::Cooldown;
pub use cooldown::CooldownState;
pub use cooldown::DEFAULT_COOLDOWN_SECS;
pub use email_entry::EmailEntry;
pub use email_prompt::EmailPromptOutcome;
pub use verification_widget::CodePromptOutcome;
pub use verification_widget::CodePromptParams;
pub use verification_widget::WidgetEvent;
pub use verify_tui::VerifyTui;
pub use version::OTP_VERIFY_VERSION;
