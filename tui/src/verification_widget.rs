//! The code step: digit slots, confirm gate, and cooldown-gated resend bound to one form.
//!
//! A `VerificationWidget` is one mounted instance of the code-entry form. It owns every piece of
//! state it renders; nothing is shared between instances. When the verification service re-renders
//! the code page the caller drops the instance and mounts a fresh one.

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use otp_protocol::CODE_LENGTH;
use otp_protocol::CodeCheckForm;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::style::Stylize as _;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Clear;
use ratatui::widgets::Widget as _;
use ratatui::widgets::WidgetRef;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::code_entry::CodeEntry;
use crate::code_entry::SlotEdit;
use crate::cooldown::Cooldown;
use crate::key_hint;
use crate::key_hint::KeyBinding;
use crate::notice::Notice;
use crate::render::PromptLayout;
use crate::tick_source::TICK_PERIOD;
use crate::tick_source::TickSource;
use crate::tui::FrameRequester;

const SUBMIT_KEY: KeyBinding = key_hint::plain(KeyCode::Enter);
const RESEND_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('r'));
const CANCEL_KEY: KeyBinding = key_hint::plain(KeyCode::Esc);
const INTERRUPT_KEY: KeyBinding = key_hint::ctrl(KeyCode::Char('c'));

const RESEND_ACKNOWLEDGMENT: &str = "A new verification code has been sent.";
const REJECTED_HINT: &str = "The previous code was not accepted. Check your email and try again.";

const LEFT_INDENT: u16 = 2;
/// Width of one rendered slot (`[d]`) plus the gap after it.
const SLOT_STRIDE: u16 = 4;
/// Row of the slot line within the widget, counted from the top of its area.
const SLOT_ROW: u16 = 4;

/// Parameters for mounting the code step.
#[derive(Clone, Debug)]
pub struct CodePromptParams {
    /// Where the challenge was sent, shown as a hint.
    pub email: Option<String>,
    pub cooldown_secs: u32,
    /// The verification service re-rendered the page after a previous submission.
    pub previous_attempt_rejected: bool,
}

impl Default for CodePromptParams {
    fn default() -> Self {
        Self {
            email: None,
            cooldown_secs: crate::cooldown::DEFAULT_COOLDOWN_SECS,
            previous_attempt_rejected: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodePromptOutcome {
    /// The submission passed the gate; the assembled code is ready to be posted.
    Submitted(CodeCheckForm),
    Cancelled,
}

/// Named handlers of the code-entry form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetEvent {
    Slot(SlotEdit),
    Paste(String),
    Submit,
    Resend,
    Cancel,
}

pub struct VerificationWidget {
    request_frame: FrameRequester,
    entry: CodeEntry,
    cooldown: Cooldown,
    ticks: TickSource,
    notice: Option<Notice>,
    email: Option<String>,
    previous_attempt_rejected: bool,
    mounted: bool,
    outcome: Option<CodePromptOutcome>,
}

impl VerificationWidget {
    pub fn new(
        request_frame: FrameRequester,
        app_event_tx: AppEventSender,
        params: CodePromptParams,
    ) -> Self {
        Self {
            request_frame,
            entry: CodeEntry::new(),
            cooldown: Cooldown::new(params.cooldown_secs),
            ticks: TickSource::new(app_event_tx),
            notice: None,
            email: params.email,
            previous_attempt_rejected: params.previous_attempt_rejected,
            mounted: false,
            outcome: None,
        }
    }

    /// Show the form. The resend cooldown starts immediately, whether or not a code was just sent.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.start_cooldown();
        self.request_frame.schedule_frame();
    }

    /// Tear the form down. Stops the tick source; slot state is discarded with the instance.
    pub fn unmount(&mut self) {
        self.ticks.cancel();
        self.mounted = false;
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[cfg(test)]
    pub fn entry(&self) -> &CodeEntry {
        &self.entry
    }

    #[cfg(test)]
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    #[cfg(test)]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn take_outcome(&mut self) -> Option<CodePromptOutcome> {
        self.outcome.take()
    }

    pub fn dispatch(&mut self, event: WidgetEvent) {
        if !self.mounted || self.outcome.is_some() {
            return;
        }
        match event {
            WidgetEvent::Slot(edit) => self.entry.apply(edit),
            WidgetEvent::Paste(payload) => self.entry.on_paste(&payload),
            WidgetEvent::Submit => self.submit(),
            WidgetEvent::Resend => self.resend(),
            WidgetEvent::Cancel => self.outcome = Some(CodePromptOutcome::Cancelled),
        }
        self.request_frame.schedule_frame();
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) {
        if key_event.kind == KeyEventKind::Release {
            return;
        }
        if INTERRUPT_KEY.is_press(key_event) || CANCEL_KEY.is_press(key_event) {
            self.dispatch(WidgetEvent::Cancel);
            return;
        }
        if self.notice.take().is_some() {
            // The key that dismisses a notice does nothing else.
            self.request_frame.schedule_frame();
            return;
        }
        if SUBMIT_KEY.is_press(key_event) {
            self.dispatch(WidgetEvent::Submit);
        } else if RESEND_KEY.is_press(key_event) {
            self.dispatch(WidgetEvent::Resend);
        } else if let Some(edit) = self.entry.edit_for_key(key_event) {
            self.dispatch(WidgetEvent::Slot(edit));
        }
    }

    /// A paste dismisses any open notice and is applied right away.
    pub fn handle_paste(&mut self, pasted: String) {
        if self.notice.take().is_some() {
            tracing::debug!("notice dismissed by paste");
        }
        self.dispatch(WidgetEvent::Paste(pasted));
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CooldownTick { generation } => self.on_cooldown_tick(generation),
        }
    }

    fn on_cooldown_tick(&mut self, generation: u64) {
        if !self.ticks.is_current(generation) {
            tracing::trace!(generation, "ignoring tick from a cancelled source");
            return;
        }
        self.cooldown.tick();
        if !self.cooldown.is_counting() {
            self.ticks.cancel();
            tracing::debug!("resend cooldown elapsed");
        }
        self.request_frame.schedule_frame();
    }

    fn start_cooldown(&mut self) {
        self.cooldown.start();
        if self.cooldown.is_counting() {
            self.ticks.start(TICK_PERIOD);
        } else {
            self.ticks.cancel();
        }
    }

    fn resend(&mut self) {
        if !self.cooldown.resend_enabled() {
            return;
        }
        tracing::info!("verification code resend requested");
        self.notice = Some(Notice::info(RESEND_ACKNOWLEDGMENT));
        self.start_cooldown();
    }

    fn submit(&mut self) {
        match self.entry.assemble() {
            Ok(form) => {
                tracing::info!("verification code submitted");
                self.outcome = Some(CodePromptOutcome::Submitted(form));
            }
            Err(err) => {
                tracing::debug!("blocked code submission: {err}");
                self.notice = Some(Notice::blocking(format!(
                    "Enter all {CODE_LENGTH} digits of the verification code."
                )));
            }
        }
    }

    #[cfg(test)]
    fn tick_generation_for_test(&self) -> Option<u64> {
        self.ticks.generation()
    }

    fn slot_line(&self) -> Line<'static> {
        let mut spans = Vec::with_capacity(CODE_LENGTH * 2);
        for index in 0..CODE_LENGTH {
            let symbol = self.entry.slot(index).unwrap_or(' ');
            let style = if index == self.entry.focus() {
                Style::default().cyan().bold()
            } else {
                Style::default()
            };
            spans.push(Span::styled(format!("[{symbol}]"), style));
            if index + 1 < CODE_LENGTH {
                spans.push(Span::from(" "));
            }
        }
        Line::from(spans)
    }

    fn actions_line(&self) -> Line<'static> {
        let confirm = if self.entry.confirm_enabled() {
            Span::from("[ Confirm ]").cyan().bold()
        } else {
            Span::from("[ Confirm ]").dim()
        };
        let resend = if self.cooldown.resend_enabled() {
            Span::from(self.cooldown.label()).bold()
        } else {
            Span::from(self.cooldown.label()).dim()
        };
        Line::from(vec![confirm, Span::from("  "), resend])
    }

    fn footer_line(&self) -> Line<'static> {
        if let Some(notice) = &self.notice {
            return notice.line();
        }
        Line::from(vec![
            SUBMIT_KEY.into(),
            Span::from(" confirm · ").dim(),
            RESEND_KEY.into(),
            Span::from(" resend · ").dim(),
            CANCEL_KEY.into(),
            Span::from(" cancel").dim(),
        ])
    }

    fn layout(&self) -> PromptLayout {
        let mut layout = PromptLayout::new(LEFT_INDENT);
        layout.gap();
        layout.push(Line::from("Enter verification code").bold());
        match &self.email {
            Some(email) => layout.push(Line::from(format!("Code sent to {email}")).dim()),
            None => layout.gap(),
        }
        layout.gap();
        layout.push(self.slot_line());
        layout.gap();
        layout.push(self.actions_line());
        if self.previous_attempt_rejected {
            layout.push(Line::from(REJECTED_HINT).red());
        } else {
            layout.gap();
        }
        layout.push(self.footer_line());
        layout
    }

    #[cfg(test)]
    pub fn layout_height(&self) -> u16 {
        self.layout().height()
    }

    /// Terminal cursor position inside the focused slot.
    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let focus = u16::try_from(self.entry.focus()).ok()?;
        let x = area
            .x
            .saturating_add(LEFT_INDENT)
            .saturating_add(focus.saturating_mul(SLOT_STRIDE))
            .saturating_add(1);
        let y = area.y.saturating_add(SLOT_ROW);
        (x < area.right() && y < area.bottom()).then_some((x, y))
    }
}

impl Drop for VerificationWidget {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl WidgetRef for &VerificationWidget {
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
    use tokio::sync::mpsc;

    use std::ops::Range;

    use ratatui::style::Modifier;

    use crate::cooldown::CooldownState;
    use crate::cooldown::DEFAULT_COOLDOWN_SECS;
    use crate::notice::NoticeKind;

    fn widget(params: CodePromptParams) -> VerificationWidget {
        let (tx, _rx) = mpsc::unbounded_channel();
        VerificationWidget::new(
            FrameRequester::test_dummy(),
            AppEventSender::new(tx),
            params,
        )
    }

    fn mounted() -> VerificationWidget {
        let mut widget = widget(CodePromptParams::default());
        widget.mount();
        widget
    }

    fn press(widget: &mut VerificationWidget, code: KeyCode) {
        widget.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn tick(widget: &mut VerificationWidget) {
        if let Some(generation) = widget.tick_generation_for_test() {
            widget.handle_app_event(AppEvent::CooldownTick { generation });
        }
    }

    fn rendered_rows(widget: &VerificationWidget, width: u16) -> Vec<String> {
        let height = widget.layout_height();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| {
                WidgetRef::render_ref(&widget, frame.area(), frame.buffer_mut());
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

    #[tokio::test]
    async fn mount_starts_cooldown_and_tick_source() {
        let mut widget = widget(CodePromptParams::default());
        assert_eq!(widget.cooldown().state(), CooldownState::Idle);

        widget.mount();
        assert!(widget.is_mounted());
        assert_eq!(
            widget.cooldown().state(),
            CooldownState::Counting { remaining: 60 }
        );
        assert!(widget.tick_generation_for_test().is_some());

        widget.unmount();
        assert_eq!(widget.tick_generation_for_test(), None);
    }

    #[tokio::test]
    async fn sixty_ticks_make_resend_available() {
        let mut widget = mounted();
        for _ in 0..59 {
            tick(&mut widget);
        }
        assert_eq!(widget.cooldown().remaining(), 1);
        assert!(!widget.cooldown().resend_enabled());

        tick(&mut widget);
        assert_eq!(widget.cooldown().state(), CooldownState::Idle);
        assert!(widget.cooldown().resend_enabled());
        assert_eq!(widget.tick_generation_for_test(), None);
    }

    #[tokio::test]
    async fn resend_while_counting_is_inert() {
        let mut widget = mounted();
        tick(&mut widget);
        tick(&mut widget);
        let generation = widget.tick_generation_for_test();

        widget.handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));

        assert_eq!(widget.cooldown().remaining(), 58);
        assert_eq!(widget.tick_generation_for_test(), generation);
        assert_eq!(widget.notice(), None);
    }

    #[tokio::test]
    async fn resend_while_idle_restarts_countdown_and_acknowledges() {
        let mut widget = widget(CodePromptParams {
            cooldown_secs: 2,
            ..Default::default()
        });
        widget.mount();
        tick(&mut widget);
        tick(&mut widget);
        assert!(widget.cooldown().resend_enabled());

        widget.dispatch(WidgetEvent::Resend);
        assert_eq!(
            widget.cooldown().state(),
            CooldownState::Counting { remaining: 2 }
        );
        assert_eq!(
            widget.notice().map(Notice::kind),
            Some(NoticeKind::Info)
        );
    }

    #[tokio::test]
    async fn stale_ticks_do_not_double_decrement() {
        let mut widget = widget(CodePromptParams {
            cooldown_secs: 1,
            ..Default::default()
        });
        widget.mount();
        let first = widget.tick_generation_for_test().expect("ticking");
        tick(&mut widget);
        assert!(widget.cooldown().resend_enabled());

        widget.dispatch(WidgetEvent::Resend);
        widget.handle_app_event(AppEvent::CooldownTick { generation: first });
        assert_eq!(widget.cooldown().remaining(), 1);
    }

    #[tokio::test]
    async fn incomplete_submit_is_blocked_and_keeps_digits() {
        let mut widget = mounted();
        for code in [KeyCode::Char('4'), KeyCode::Char('2'), KeyCode::Enter] {
            press(&mut widget, code);
        }
        assert!(!widget.is_done());
        assert_eq!(widget.entry().assembled(), "42");
        assert_eq!(
            widget.notice().map(Notice::kind),
            Some(NoticeKind::Blocking)
        );

        // The dismissing key press is swallowed.
        press(&mut widget, KeyCode::Char('7'));
        assert_eq!(widget.notice(), None);
        assert_eq!(widget.entry().assembled(), "42");

        press(&mut widget, KeyCode::Char('7'));
        assert_eq!(widget.entry().assembled(), "427");
    }

    #[tokio::test]
    async fn complete_submit_yields_the_assembled_code() {
        let mut widget = mounted();
        widget.handle_paste("Your code: 908 112".to_string());
        assert!(widget.entry().confirm_enabled());

        press(&mut widget, KeyCode::Enter);
        let Some(CodePromptOutcome::Submitted(form)) = widget.take_outcome() else {
            panic!("expected a submitted code");
        };
        assert_eq!(form.code.as_str(), "908112");
    }

    #[tokio::test]
    async fn escape_cancels_without_submitting() {
        let mut widget = mounted();
        widget.handle_paste("123456".to_string());
        press(&mut widget, KeyCode::Esc);
        assert_eq!(widget.take_outcome(), Some(CodePromptOutcome::Cancelled));
    }

    #[tokio::test]
    async fn events_before_mount_are_ignored() {
        let mut widget = widget(CodePromptParams::default());
        widget.dispatch(WidgetEvent::Paste("123456".to_string()));
        assert_eq!(widget.entry().assembled(), "");
    }

    #[tokio::test]
    async fn cursor_sits_inside_the_focused_slot() {
        let mut widget = mounted();
        widget.handle_paste("12".to_string());
        press(&mut widget, KeyCode::Right);
        press(&mut widget, KeyCode::Right);
        let area = Rect::new(0, 3, 60, 9);
        assert_eq!(widget.cursor_pos(area), Some((11, 7)));
    }

    #[tokio::test]
    async fn renders_slots_gate_and_countdown() {
        let mut widget = widget(CodePromptParams {
            email: Some("a@b.c".to_string()),
            ..Default::default()
        });
        widget.mount();
        widget.handle_paste("12".to_string());
        tick(&mut widget);

        assert_debug_snapshot!(rendered_rows(&widget, 60), @r###"
        [
            "",
            "  Enter verification code",
            "  Code sent to a@b.c",
            "",
            "  [1] [2] [ ] [ ] [ ] [ ]",
            "",
            "  [ Confirm ]  Resend (59 seconds)",
            "",
            "  enter confirm · ctrl + r resend · esc cancel",
        ]
        "###);
    }

    #[tokio::test]
    async fn renders_blocking_notice_in_footer() {
        let mut widget = mounted();
        press(&mut widget, KeyCode::Enter);

        let rows = rendered_rows(&widget, 80);
        assert_eq!(
            rows.last().map(String::as_str),
            Some("  ! Enter all 6 digits of the verification code.  (press any key)")
        );
    }

    const ACTIONS_ROW: u16 = 6;
    const CONFIRM_CELLS: Range<u16> = 2..13;
    const RESEND_CELLS: Range<u16> = 15..21;

    fn render_buffer(widget: &VerificationWidget, width: u16) -> Buffer {
        let area = Rect::new(0, 0, width, widget.layout_height());
        let mut buf = Buffer::empty(area);
        WidgetRef::render_ref(&widget, area, &mut buf);
        buf
    }

    fn all_cells(buf: &Buffer, cells: Range<u16>, modifier: Modifier) -> bool {
        cells
            .into_iter()
            .all(|x| buf[(x, ACTIONS_ROW)].modifier.contains(modifier))
    }

    fn no_cells(buf: &Buffer, cells: Range<u16>, modifier: Modifier) -> bool {
        cells
            .into_iter()
            .all(|x| !buf[(x, ACTIONS_ROW)].modifier.contains(modifier))
    }

    #[tokio::test]
    async fn confirm_is_dimmed_until_the_code_is_complete() {
        let mut widget = mounted();
        let buf = render_buffer(&widget, 60);
        assert!(all_cells(&buf, CONFIRM_CELLS, Modifier::DIM));
        assert!(no_cells(&buf, CONFIRM_CELLS, Modifier::BOLD));

        widget.handle_paste("123456".to_string());
        let buf = render_buffer(&widget, 60);
        assert!(no_cells(&buf, CONFIRM_CELLS, Modifier::DIM));
        assert!(all_cells(&buf, CONFIRM_CELLS, Modifier::BOLD));
    }

    #[tokio::test]
    async fn resend_is_dimmed_while_counting() {
        let mut widget = mounted();
        let buf = render_buffer(&widget, 60);
        assert!(all_cells(&buf, RESEND_CELLS, Modifier::DIM));

        for _ in 0..DEFAULT_COOLDOWN_SECS {
            tick(&mut widget);
        }
        assert_eq!(widget.cooldown().state(), CooldownState::Idle);
        let buf = render_buffer(&widget, 60);
        assert!(no_cells(&buf, RESEND_CELLS, Modifier::DIM));
        assert!(all_cells(&buf, RESEND_CELLS, Modifier::BOLD));
    }

    #[tokio::test]
    async fn paste_after_a_blocked_submit_dismisses_the_notice_and_fills_slots() {
        let mut widget = mounted();
        press(&mut widget, KeyCode::Enter);
        assert!(widget.notice().is_some());

        widget.handle_paste("123456".to_string());
        assert_eq!(widget.notice(), None);
        assert_eq!(widget.entry().assembled(), "123456");
        assert!(widget.entry().confirm_enabled());
    }
}
