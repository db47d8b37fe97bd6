use alert_engine::{Position, PositionSource};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Emits one configured position immediately and then on every interval tick.
pub struct IntervalFixSource {
    position: Position,
    period: Duration,
    token: Mutex<Option<CancellationToken>>,
}

impl IntervalFixSource {
    pub fn new(position: Position, period: Duration) -> Self {
        Self {
            position,
            period,
            token: Mutex::new(None),
        }
    }

    pub fn from_settings(config: &shared::FixesConfig) -> Self {
        Self::new(
            Position::new(config.latitude, config.longitude),
            Duration::from_secs(config.interval_seconds.max(1)),
        )
    }
}

impl PositionSource for IntervalFixSource {
    /// Must be called within a tokio runtime.
    fn start(&self, fixes: mpsc::Sender<Position>) {
        let mut slot = self.token.lock();
        if slot.is_some() {
            warn!(name: "fixes.start.duplicate", "position source already started");
            return;
        }
        let token = CancellationToken::new();
        *slot = Some(token.clone());

        let position = self.position;
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(name: "fixes.started", period = ?self.period, "starting fixed-interval position source");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if fixes.send(position).await.is_err() {
                            debug!(name: "fixes.receiver.closed", "fix receiver dropped");
                            break;
                        }
                    }
                }
            }
        });
    }

    fn stop(&self) {
        if let Some(token) = self.token.lock().take() {
            token.cancel();
            info!(name: "fixes.stopped", "position source stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const HOME: Position = Position::new(37.7749, -122.4194);

    #[tokio::test(start_paused = true)]
    async fn emits_immediately_then_on_interval() {
        let source = IntervalFixSource::new(HOME, Duration::from_secs(60));
        let (tx, mut rx) = mpsc::channel(4);
        source.start(tx);

        assert_eq!(rx.recv().await, Some(HOME));
        let second = timeout(Duration::from_secs(61), rx.recv()).await;
        assert_eq!(second.ok().flatten(), Some(HOME));
        source.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_closes_the_stream() {
        let source = IntervalFixSource::new(HOME, Duration::from_secs(60));
        let (tx, mut rx) = mpsc::channel(4);
        source.start(tx);
        assert_eq!(rx.recv().await, Some(HOME));

        source.stop();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn second_start_is_ignored() {
        let source = IntervalFixSource::new(HOME, Duration::from_secs(60));
        let (first_tx, mut first_rx) = mpsc::channel(4);
        let (second_tx, mut second_rx) = mpsc::channel(4);
        source.start(first_tx);
        source.start(second_tx);

        assert_eq!(first_rx.recv().await, Some(HOME));
        assert_eq!(second_rx.recv().await, None);
        source.stop();
    }
}
