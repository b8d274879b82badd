//! Segmented verification-code entry.
//!
//! `CodeEntry` owns the slot values and the focused slot. Every mutation recomputes the
//! submission gate synchronously, so [`CodeEntry::confirm_enabled`] always equals
//! [`CodeEntry::is_complete`] once a handler returns.

mod slots;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use otp_protocol::CODE_LENGTH;
use otp_protocol::CodeCheckForm;
use otp_protocol::ValidationError;
use otp_protocol::VerificationCode;

pub use slots::DigitSlots;

const LAST_SLOT: usize = CODE_LENGTH - 1;

/// A slot-level edit derived from a key press on the focused slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlotEdit {
    /// The slot's raw content after the keystroke, before normalization.
    Input { index: usize, raw: String },
    Backspace { index: usize },
    ArrowLeft { index: usize },
    ArrowRight { index: usize },
    Focus { index: usize },
}

#[derive(Clone, Debug, Default)]
pub struct CodeEntry {
    slots: DigitSlots,
    focus: usize,
    confirm_enabled: bool,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn slot(&self, index: usize) -> Option<char> {
        self.slots.get(index)
    }

    pub fn assembled(&self) -> String {
        self.slots.assembled()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.is_complete()
    }

    pub fn confirm_enabled(&self) -> bool {
        self.confirm_enabled
    }

    pub fn on_slot_input(&mut self, index: usize, raw: &str) {
        let stored = self.slots.write_normalized(index, raw);
        if stored.is_some() && index < LAST_SLOT {
            self.focus = index + 1;
        }
        self.update_confirm();
    }

    /// Only fires on an already-empty slot; a filled slot is cleared through
    /// [`CodeEntry::on_slot_input`] first, so backspacing never deletes twice.
    pub fn on_slot_backspace(&mut self, index: usize) {
        if self.slots.get(index).is_none() && index > 0 && index <= LAST_SLOT {
            self.focus = index - 1;
        }
    }

    pub fn on_arrow_left(&mut self, index: usize) {
        if index > 0 && index <= LAST_SLOT {
            self.focus = index - 1;
        }
    }

    pub fn on_arrow_right(&mut self, index: usize) {
        if index < LAST_SLOT {
            self.focus = index + 1;
        }
    }

    pub fn on_focus(&mut self, index: usize) {
        self.focus = index.min(LAST_SLOT);
    }

    /// Distributes pasted digits from slot 0 regardless of the focused slot.
    pub fn on_paste(&mut self, payload: &str) {
        let written = self.slots.distribute(payload);
        tracing::trace!(written, "distributed pasted digits");
        self.update_confirm();
    }

    pub fn apply(&mut self, edit: SlotEdit) {
        match edit {
            SlotEdit::Input { index, raw } => self.on_slot_input(index, &raw),
            SlotEdit::Backspace { index } => self.on_slot_backspace(index),
            SlotEdit::ArrowLeft { index } => self.on_arrow_left(index),
            SlotEdit::ArrowRight { index } => self.on_arrow_right(index),
            SlotEdit::Focus { index } => self.on_focus(index),
        }
    }

    /// Assembles the transmitted value, or reports why the submission must be cancelled.
    ///
    /// Slot values are left untouched either way.
    pub fn assemble(&self) -> Result<CodeCheckForm, ValidationError> {
        let code = VerificationCode::parse(&self.assembled())?;
        Ok(CodeCheckForm { code })
    }

    /// Translates a key press on the focused slot into a slot edit.
    ///
    /// Printable characters are passed through as input and filtered to digits downstream.
    /// A backspace on a filled slot deletes its digit in place; on an empty slot it moves left.
    pub fn edit_for_key(&self, key_event: KeyEvent) -> Option<SlotEdit> {
        let index = self.focus;
        if key_event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key_event.code {
            KeyCode::Char(ch) => {
                let mut raw: String = self.slots.get(index).into_iter().collect();
                raw.push(ch);
                Some(SlotEdit::Input { index, raw })
            }
            KeyCode::Backspace if self.slots.get(index).is_some() => Some(SlotEdit::Input {
                index,
                raw: String::new(),
            }),
            KeyCode::Backspace => Some(SlotEdit::Backspace { index }),
            KeyCode::Left => Some(SlotEdit::ArrowLeft { index }),
            KeyCode::Right => Some(SlotEdit::ArrowRight { index }),
            KeyCode::Home => Some(SlotEdit::Focus { index: 0 }),
            KeyCode::End => Some(SlotEdit::Focus { index: LAST_SLOT }),
            _ => None,
        }
    }

    fn update_confirm(&mut self) {
        self.confirm_enabled = self.is_complete();
    }
}
