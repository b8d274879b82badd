//! Terminal session plumbing: raw mode, the inline viewport, and the merged event queue.
//!
//! Every prompt pulls from [`Tui::next_event`], which yields terminal input and redraw requests
//! one at a time. Prompts that also own app-level events (cooldown ticks) `select!` over both, so
//! all widget mutation is serialized through a single loop.

use std::io;
use std::io::Stdout;
use std::io::stdout;

use crossterm::event::DisableBracketedPaste;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyEvent;
use crossterm::execute;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use ratatui::Frame;
use ratatui::TerminalOptions;
use ratatui::Viewport;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

pub type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

/// Height of the inline viewport reserved below the shell prompt.
pub const VIEWPORT_HEIGHT: u16 = 12;

/// Enter raw mode, enable bracketed paste, and allocate the inline viewport.
pub fn init() -> io::Result<Terminal> {
    enable_raw_mode()?;
    execute!(stdout(), EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout());
    ratatui::Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        },
    )
}

/// Undo [`init`]. Safe to call more than once.
pub fn restore() -> io::Result<()> {
    execute!(stdout(), DisableBracketedPaste)?;
    disable_raw_mode()
}

#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    Paste(String),
    Draw,
}

/// Cheap handle widgets use to ask the loop for a redraw.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_tx: Option<mpsc::UnboundedSender<()>>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        if let Some(tx) = &self.frame_tx {
            let _ = tx.send(());
        }
    }

    /// A requester that is not connected to any loop.
    #[cfg(test)]
    pub fn test_dummy() -> Self {
        Self { frame_tx: None }
    }
}

pub struct Tui {
    pub terminal: Terminal,
    events: Option<EventStream>,
    frame_tx: mpsc::UnboundedSender<()>,
    frame_rx: mpsc::UnboundedReceiver<()>,
}

impl Tui {
    pub fn new(terminal: Terminal) -> Self {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        Self {
            terminal,
            events: Some(EventStream::new()),
            frame_tx,
            frame_rx,
        }
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            frame_tx: Some(self.frame_tx.clone()),
        }
    }

    pub fn draw(&mut self, render: impl FnOnce(&mut Frame)) -> io::Result<()> {
        self.terminal.draw(render)?;
        Ok(())
    }

    /// Drop the crossterm reader so buffered input from one prompt can't leak into the next.
    pub fn pause_events(&mut self) {
        self.events = None;
    }

    pub fn resume_events(&mut self) {
        if self.events.is_none() {
            self.events = Some(EventStream::new());
        }
    }

    /// Waits for the next terminal event or redraw request.
    ///
    /// Returns `None` once the terminal input stream has ended or failed.
    pub async fn next_event(&mut self) -> Option<TuiEvent> {
        loop {
            let events = self.events.get_or_insert_with(EventStream::new);
            tokio::select! {
                Some(()) = self.frame_rx.recv() => {
                    // Coalesce redraw requests that piled up while we were busy.
                    while self.frame_rx.try_recv().is_ok() {}
                    return Some(TuiEvent::Draw);
                }
                event = events.next() => match event {
                    Some(Ok(Event::Key(key_event))) => return Some(TuiEvent::Key(key_event)),
                    Some(Ok(Event::Paste(pasted))) => return Some(TuiEvent::Paste(pasted)),
                    Some(Ok(Event::Resize(_, _))) => return Some(TuiEvent::Draw),
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::error!("terminal event stream failed: {err}");
                        return None;
                    }
                    None => return None,
                },
            }
        }
    }
}
