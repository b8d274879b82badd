use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Recurring cooldown tick with a held cancellation handle.
///
/// At most one ticking task exists per source: [`TickSource::start`] aborts the previous task
/// before spawning the next, and every tick is tagged with the generation it was started as so a
/// tick that was already queued when its task was aborted can be recognized and dropped.
#[derive(Debug)]
pub struct TickSource {
    app_event_tx: AppEventSender,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl TickSource {
    pub fn new(app_event_tx: AppEventSender) -> Self {
        Self {
            app_event_tx,
            generation: 0,
            handle: None,
        }
    }

    /// Cancel any running task and start a new one. The first tick fires one `period` from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, period: Duration) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let tx = self.app_event_tx.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.app_event_tx.is_closed() {
                    break;
                }
                tx.send(AppEvent::CooldownTick { generation });
            }
        }));
        tracing::debug!(generation, "cooldown tick source started");
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::debug!(generation = self.generation, "cooldown tick source cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Generation of the running task, if any.
    pub fn generation(&self) -> Option<u64> {
        self.is_running().then_some(self.generation)
    }

    /// Whether `generation` belongs to the task that is currently running.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == Some(generation)
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn drain(rx: &mut UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = TickSource::new(AppEventSender::new(tx));
        let generation = source.start(TICK_PERIOD);

        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(
            drain(&mut rx),
            vec![AppEvent::CooldownTick { generation }; 3]
        );
        assert!(source.is_current(generation));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_leaves_exactly_one_ticker() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = TickSource::new(AppEventSender::new(tx));
        let first = source.start(TICK_PERIOD);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(drain(&mut rx), vec![AppEvent::CooldownTick { generation: first }]);

        let second = source.start(TICK_PERIOD);
        assert_ne!(first, second);
        assert!(!source.is_current(first));

        tokio::time::sleep(Duration::from_millis(1250)).await;
        assert_eq!(
            drain(&mut rx),
            vec![AppEvent::CooldownTick { generation: second }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut source = TickSource::new(AppEventSender::new(tx));
        let generation = source.start(TICK_PERIOD);
        source.cancel();
        assert!(!source.is_running());
        assert!(!source.is_current(generation));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(drain(&mut rx), Vec::new());
    }
}
