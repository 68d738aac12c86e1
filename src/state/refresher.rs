use crate::state::messages::UiEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// One-second round clock. Started when an incomplete round's view opens and
/// stopped — the task aborted through its handle, not left for collection —
/// the moment the round completes or the view is torn down.
pub struct RoundTicker {
    handle: JoinHandle<()>,
}

impl RoundTicker {
    pub fn start(events: mpsc::Sender<UiEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(1));
            // Skip the immediate first tick; the view already rendered a
            // clock value on load.
            tick.tick().await;
            loop {
                tick.tick().await;
                if events.send(UiEvent::ClockTick).await.is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}
