//! The email step: collect an address, gate the submit action on its shape, hand it back.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use otp_protocol::EmailChallengeForm;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Stylize as _;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Clear;
use ratatui::widgets::Widget as _;
use ratatui::widgets::WidgetRef;

use crate::email_entry::EmailEntry;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::notice::Notice;
use crate::render::PromptLayout;
use crate::tui::FrameRequester;
use crate::tui::Tui;
use crate::tui::TuiEvent;

const SUBMIT_KEY: KeyBinding = key_hint::plain(KeyCode::Enter);
const CANCEL_KEY: KeyBinding = key_hint::plain(KeyCode::Esc);
const INTERRUPT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('c'));

const FIELD_LABEL: &str = "Email  ";
const LEFT_INDENT: u16 = 2;
const FIELD_ROW: u16 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmailPromptOutcome {
    Submitted(EmailChallengeForm),
    Cancelled,
}

pub async fn run_email_prompt(
    tui: &mut Tui,
    initial: Option<String>,
) -> anyhow::Result<EmailPromptOutcome> {
    let mut screen = EmailPromptScreen::new(tui.frame_requester(), initial.as_deref());
    draw_screen(tui, &screen)?;

    while !screen.is_done() {
        let Some(event) = tui.next_event().await else {
            break;
        };
        match event {
            TuiEvent::Key(key_event) => screen.handle_key(key_event),
            TuiEvent::Paste(pasted) => screen.handle_paste(&pasted),
            TuiEvent::Draw => draw_screen(tui, &screen)?,
        }
    }

    tui.terminal.clear()?;
    Ok(screen.take_outcome().unwrap_or(EmailPromptOutcome::Cancelled))
}

fn draw_screen(tui: &mut Tui, screen: &EmailPromptScreen) -> anyhow::Result<()> {
    tui.draw(|frame| {
        let area = frame.area();
        frame.render_widget_ref(screen, area);
        if let Some(position) = screen.cursor_pos(area) {
            frame.set_cursor_position(position);
        }
    })?;
    Ok(())
}

struct EmailPromptScreen {
    request_frame: FrameRequester,
    entry: EmailEntry,
    notice: Option<Notice>,
    outcome: Option<EmailPromptOutcome>,
}

impl EmailPromptScreen {
    fn new(request_frame: FrameRequester, initial: Option<&str>) -> Self {
        Self {
            request_frame,
            entry: EmailEntry::new(initial.unwrap_or_default()),
            notice: None,
            outcome: None,
        }
    }

    fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.kind == KeyEventKind::Release {
            return;
        }
        if INTERRUPT_KEY.is_press(key_event) || CANCEL_KEY.is_press(key_event) {
            self.outcome = Some(EmailPromptOutcome::Cancelled);
        } else if self.notice.take().is_none() {
            // A key press that dismisses a notice does nothing else.
            if SUBMIT_KEY.is_press(key_event) {
                self.submit();
            } else {
                self.entry.handle_key_event(key_event);
            }
        }
        self.request_frame.schedule_frame();
    }

    fn handle_paste(&mut self, pasted: &str) {
        if self.notice.take().is_some() {
            tracing::debug!("notice dismissed by paste");
        }
        self.entry.insert_str(pasted);
        self.request_frame.schedule_frame();
    }

    fn submit(&mut self) {
        match self.entry.submit() {
            Ok(form) => {
                tracing::info!("email challenge requested");
                self.outcome = Some(EmailPromptOutcome::Submitted(form));
            }
            Err(err) => {
                tracing::debug!("blocked email submission: {err}");
                self.notice = Some(Notice::blocking("Enter a valid email address."));
            }
        }
    }

    fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    fn take_outcome(&mut self) -> Option<EmailPromptOutcome> {
        self.outcome.take()
    }

    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let label_width = u16::try_from(FIELD_LABEL.len()).ok()?;
        let x = area
            .x
            .saturating_add(LEFT_INDENT)
            .saturating_add(label_width)
            .saturating_add(self.entry.cursor_offset());
        let y = area.y.saturating_add(FIELD_ROW);
        (x < area.right() && y < area.bottom()).then_some((x, y))
    }

    fn layout(&self) -> PromptLayout {
        let send = if self.entry.submit_enabled() {
            Span::from("[ Send code ]").cyan().bold()
        } else {
            Span::from("[ Send code ]").dim()
        };
        let footer = match &self.notice {
            Some(notice) => notice.line(),
            None => Line::from(vec![
                SUBMIT_KEY.into(),
                Span::from(" send code · ").dim(),
                CANCEL_KEY.into(),
                Span::from(" cancel").dim(),
            ]),
        };

        let mut layout = PromptLayout::new(LEFT_INDENT);
        layout.gap();
        layout.push(Line::from("Verify your email").bold());
        layout.push(
            Line::from(format!(
                "We'll send a {}-digit code to this address.",
                otp_protocol::CODE_LENGTH
            ))
            .dim(),
        );
        layout.gap();
        layout.push(Line::from(vec![
            Span::from(FIELD_LABEL).bold(),
            Span::from(self.entry.text().to_string()),
        ]));
        layout.gap();
        layout.push(send);
        layout.gap();
        layout.push(footer);
        layout
    }
}

impl WidgetRef for &EmailPromptScreen {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        self.layout().render_ref(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use insta::assert_debug_snapshot;
    use pretty_assertions::assert_eq;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen(initial: Option<&str>) -> EmailPromptScreen {
        EmailPromptScreen::new(FrameRequester::test_dummy(), initial)
    }

    fn press(screen: &mut EmailPromptScreen, code: KeyCode) {
        screen.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn rendered_rows(screen: &EmailPromptScreen, width: u16) -> Vec<String> {
        let height = screen.layout().height();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| {
                WidgetRef::render_ref(&screen, frame.area(), frame.buffer_mut());
            })
            .expect("draw");
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| {
                let row: String = (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect();
                row.trim_end().to_string()
            })
            .collect()
    }

    #[test]
    fn malformed_email_blocks_with_notice_and_keeps_text() {
        let mut screen = screen(Some("a@b"));
        press(&mut screen, KeyCode::Enter);
        assert!(!screen.is_done());
        assert!(screen.notice.is_some());
        assert_eq!(screen.entry.text(), "a@b");

        // Dismiss, then finish the address and submit.
        press(&mut screen, KeyCode::Char('x'));
        assert_eq!(screen.entry.text(), "a@b");
        screen.handle_paste(".c");
        press(&mut screen, KeyCode::Enter);

        let Some(EmailPromptOutcome::Submitted(form)) = screen.take_outcome() else {
            panic!("expected a submitted email");
        };
        assert_eq!(form.email.as_str(), "a@b.c");
    }

    #[test]
    fn paste_dismisses_a_notice_and_lands_in_the_field() {
        let mut screen = screen(Some("a@b"));
        press(&mut screen, KeyCode::Enter);
        assert!(screen.notice.is_some());

        screen.handle_paste(".c");
        assert!(screen.notice.is_none());
        assert_eq!(screen.entry.text(), "a@b.c");
        assert!(screen.entry.submit_enabled());
    }

    #[test]
    fn escape_cancels() {
        let mut screen = screen(None);
        press(&mut screen, KeyCode::Esc);
        assert_eq!(screen.take_outcome(), Some(EmailPromptOutcome::Cancelled));
    }

    #[test]
    fn cursor_follows_the_caret() {
        let screen = screen(Some("user@example.com"));
        let area = Rect::new(0, 0, 60, 9);
        assert_eq!(screen.cursor_pos(area), Some((25, 4)));
    }

    #[test]
    fn renders_field_and_gate() {
        let screen = screen(Some("user@example.com"));
        assert_debug_snapshot!(rendered_rows(&screen, 60), @r###"
        [
            "",
            "  Verify your email",
            "  We'll send a 6-digit code to this address.",
            "",
            "  Email  user@example.com",
            "",
            "  [ Send code ]",
            "",
            "  enter send code · esc cancel",
        ]
        "###);
    }
}
