use tokio::sync::mpsc::UnboundedSender;

use crate::app_event::AppEvent;

#[derive(Clone, Debug)]
pub struct AppEventSender {
    pub app_event_tx: UnboundedSender<AppEvent>,
}

impl AppEventSender {
    pub fn new(app_event_tx: UnboundedSender<AppEvent>) -> Self {
        Self { app_event_tx }
    }

    /// Send an event to the prompt loop. A closed loop is logged, not propagated: the prompt
    /// that owned the receiver is already gone.
    pub fn send(&self, event: AppEvent) {
        if let Err(err) = self.app_event_tx.send(event) {
            tracing::error!("failed to send app event: {err}");
        }
    }
}
