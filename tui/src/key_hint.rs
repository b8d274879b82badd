use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use ratatui::style::Stylize as _;
use ratatui::text::Span;

/// A key chord as shown in footer hints and matched against input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    key: KeyCode,
    modifiers: KeyModifiers,
}

pub const fn plain(key: KeyCode) -> KeyBinding {
    KeyBinding {
        key,
        modifiers: KeyModifiers::NONE,
    }
}

pub const fn ctrl(key: KeyCode) -> KeyBinding {
    KeyBinding {
        key,
        modifiers: KeyModifiers::CONTROL,
    }
}

impl KeyBinding {
    pub fn is_press(&self, event: KeyEvent) -> bool {
        event.code == self.key && event.modifiers == self.modifiers
    }

    fn label(&self) -> String {
        let key = match self.key {
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Esc => "esc".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Char(ch) => ch.to_ascii_lowercase().to_string(),
            other => format!("{other}").to_ascii_lowercase(),
        };
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            format!("ctrl + {key}")
        } else {
            key
        }
    }
}

impl From<KeyBinding> for Span<'static> {
    fn from(binding: KeyBinding) -> Self {
        Span::from(binding.label()).bold()
    }
}
