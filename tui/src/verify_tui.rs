use anyhow::Context;
use ratatui::style::Stylize as _;
use ratatui::text::Line;

use crate::code_prompt::run_code_prompt;
use crate::email_prompt::EmailPromptOutcome;
use crate::email_prompt::run_email_prompt;
use crate::tui;
use crate::tui::Tui;
use crate::verification_widget::CodePromptOutcome;
use crate::verification_widget::CodePromptParams;

/// Terminal session for the verification flow:
/// - runs the email step and the code step on one inline viewport
/// - shows short status lines while the caller talks to the services
/// - restores terminal state on Drop
pub struct VerifyTui {
    tui: Tui,
}

impl VerifyTui {
    /// Initialize the TUI (enter raw mode) and clear the viewport.
    pub fn new() -> anyhow::Result<Self> {
        let mut terminal = tui::init().context("initialize terminal")?;
        terminal.clear()?;
        Ok(Self {
            tui: Tui::new(terminal),
        })
    }

    pub async fn prompt_email(
        &mut self,
        initial: Option<String>,
    ) -> anyhow::Result<EmailPromptOutcome> {
        let result = run_email_prompt(&mut self.tui, initial).await;
        self.reset_input();
        result
    }

    /// Mount a fresh code-entry widget. Each call starts from empty slots and a full cooldown.
    pub async fn prompt_code(
        &mut self,
        params: CodePromptParams,
    ) -> anyhow::Result<CodePromptOutcome> {
        let result = run_code_prompt(&mut self.tui, params).await;
        self.reset_input();
        result
    }

    /// Replace the viewport with a single dimmed status line.
    pub fn show_status(&mut self, message: &str) -> anyhow::Result<()> {
        let line = Line::from(format!("  {message}")).dim();
        self.tui.draw(|frame| {
            frame.render_widget(ratatui::widgets::Clear, frame.area());
            frame.render_widget(line, frame.area());
        })?;
        Ok(())
    }

    // Drop and recreate the crossterm reader so keys typed while a request is in flight don't
    // land in the next form.
    fn reset_input(&mut self) {
        self.tui.pause_events();
        self.tui.resume_events();
    }
}

impl Drop for VerifyTui {
    fn drop(&mut self) {
        // Best-effort: leave a clean shell prompt behind.
        let _ = self.tui.terminal.clear();
        let _ = tui::restore();
    }
}
