use tokio::sync::mpsc;

use crate::app_event_sender::AppEventSender;
use crate::tui::Tui;
use crate::tui::TuiEvent;
use crate::verification_widget::CodePromptOutcome;
use crate::verification_widget::CodePromptParams;
use crate::verification_widget::VerificationWidget;
use crate::verification_widget::WidgetEvent;

/// Mounts a fresh code-entry widget and runs it until the user submits a complete code or
/// leaves.
///
/// Terminal input and cooldown ticks are consumed by this one loop, one at a time, so no two
/// handlers ever interleave.
pub async fn run_code_prompt(
    tui: &mut Tui,
    params: CodePromptParams,
) -> anyhow::Result<CodePromptOutcome> {
    let (app_event_tx, mut app_event_rx) = mpsc::unbounded_channel();
    let mut widget = VerificationWidget::new(
        tui.frame_requester(),
        AppEventSender::new(app_event_tx),
        params,
    );
    widget.mount();
    draw_widget(tui, &widget)?;

    while !widget.is_done() {
        tokio::select! {
            event = tui.next_event() => {
                let Some(event) = event else {
                    widget.dispatch(WidgetEvent::Cancel);
                    break;
                };
                match event {
                    TuiEvent::Key(key_event) => widget.handle_key_event(key_event),
                    TuiEvent::Paste(pasted) => widget.handle_paste(pasted),
                    TuiEvent::Draw => draw_widget(tui, &widget)?,
                }
            }
            Some(app_event) = app_event_rx.recv() => widget.handle_app_event(app_event),
        }
    }

    widget.unmount();
    tui.terminal.clear()?;
    Ok(widget
        .take_outcome()
        .unwrap_or(CodePromptOutcome::Cancelled))
}

fn draw_widget(tui: &mut Tui, widget: &VerificationWidget) -> anyhow::Result<()> {
    tui.draw(|frame| {
        let area = frame.area();
        frame.render_widget_ref(widget, area);
        if let Some(position) = widget.cursor_pos(area) {
            frame.set_cursor_position(position);
        }
    })?;
    Ok(())
}
