//! In-viewport stand-in for the browser's modal alert.
//!
//! A blocking notice swallows the next key press (the one that dismisses it) so that keystroke
//! never reaches the field underneath.

use ratatui::style::Stylize as _;
use ratatui::text::Line;
use ratatui::text::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// A submission was cancelled.
    Blocking,
    /// An acknowledgment, e.g. after a resend.
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    message: String,
}

impl Notice {
    pub fn blocking(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Blocking,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    pub fn line(&self) -> Line<'static> {
        let marker = match self.kind {
            NoticeKind::Blocking => Span::from("! ").red().bold(),
            NoticeKind::Info => Span::from("✓ ").green().bold(),
        };
        Line::from(vec![
            marker,
            Span::from(self.message.clone()),
            Span::from("  (press any key)").dim(),
        ])
    }
}
