//! Single-line email field with a live shape check.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use otp_protocol::EmailAddress;
use otp_protocol::EmailChallengeForm;
use otp_protocol::ValidationError;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug, Default)]
pub struct EmailEntry {
    text: String,
    /// Caret position in chars.
    cursor: usize,
    submit_enabled: bool,
}

impl EmailEntry {
    pub fn new(initial: &str) -> Self {
        let mut entry = Self::default();
        entry.insert_str(initial);
        entry
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Display width of the text before the caret.
    pub fn cursor_offset(&self) -> u16 {
        let before = &self.text[..self.byte_offset(self.cursor)];
        u16::try_from(before.width()).unwrap_or(u16::MAX)
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    /// Re-run the shape check (after trimming) and update the submit gate.
    pub fn validate(&mut self) -> bool {
        self.submit_enabled = EmailAddress::parse(&self.text).is_ok();
        self.submit_enabled
    }

    /// Checks the current text again, independent of the gate, and builds the form to post.
    pub fn submit(&mut self) -> Result<EmailChallengeForm, ValidationError> {
        self.validate();
        let email = EmailAddress::parse(&self.text)?;
        Ok(EmailChallengeForm { email })
    }

    /// Inserts at the caret. Line breaks are dropped, as a single-line input would.
    pub fn insert_str(&mut self, text: &str) {
        let cleaned: String = text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect();
        let offset = self.byte_offset(self.cursor);
        self.text.insert_str(offset, &cleaned);
        self.cursor += cleaned.chars().count();
        self.validate();
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.text.remove(offset);
        self.validate();
    }

    pub fn delete(&mut self) {
        if self.cursor >= self.text.chars().count() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.text.remove(offset);
        self.validate();
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    /// Applies a key press. Returns whether it was consumed.
    pub fn handle_key_event(&mut self, key_event: KeyEvent) -> bool {
        if key_event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return false;
        }
        match key_event.code {
            KeyCode::Char(ch) => {
                let mut buf = [0; 4];
                self.insert_str(ch.encode_utf8(&mut buf));
            }
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.text.chars().count(),
            _ => return false,
        }
        true
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_index)
            .map_or(self.text.len(), |(offset, _)| offset)
    }
}
