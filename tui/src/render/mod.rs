//! Row layout shared by the email and code screens.
//!
//! Each screen is a fixed stack of one-line rows under a common left indent, so row `n` of the
//! layout is always terminal row `area.y + n`. Cursor placement relies on that.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::WidgetRef;

#[derive(Debug, Default)]
pub struct PromptLayout {
    indent: u16,
    rows: Vec<Option<Line<'static>>>,
}

impl PromptLayout {
    pub fn new(indent: u16) -> Self {
        Self {
            indent,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<Line<'static>>) {
        self.rows.push(Some(line.into()));
    }

    /// An empty spacer row.
    pub fn gap(&mut self) {
        self.rows.push(None);
    }

    #[cfg(test)]
    pub fn height(&self) -> u16 {
        u16::try_from(self.rows.len()).unwrap_or(u16::MAX)
    }
}

impl WidgetRef for PromptLayout {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let x = area.x.saturating_add(self.indent);
        let width = area.width.saturating_sub(self.indent);
        for (y, row) in (area.y..area.bottom()).zip(&self.rows) {
            if let Some(line) = row {
                line.render_ref(Rect::new(x, y, width, 1), buf);
            }
        }
    }
}
