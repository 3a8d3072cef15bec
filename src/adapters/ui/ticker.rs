//! Carousel timer. One interval task per ticker, aborted when the ticker is dropped.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct CarouselTicker {
    handle: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

impl CarouselTicker {
    /// Spawns the interval task. The first tick fires one `period` after start.
    pub fn start(period: Duration) -> Self {
        let (tx, ticks) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                // Full buffer means the UI is busy; dropping the tick is fine.
                if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(()) {
                    break;
                }
            }
        });
        Self { handle, ticks }
    }

    /// Number of ticks since the last drain.
    pub fn drain(&mut self) -> usize {
        let mut n = 0;
        while self.ticks.try_recv().is_ok() {
            n += 1;
        }
        n
    }
}

impl Drop for CarouselTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ticks_on_interval() {
        let mut ticker = CarouselTicker::start(Duration::from_millis(20));
        assert_eq!(ticker.drain(), 0);
        tokio::time::sleep(Duration::from_millis(90)).await;
        assert!(ticker.drain() >= 2);
    }

    #[tokio::test]
    async fn drop_stops_the_task() {
        let ticker = CarouselTicker::start(Duration::from_millis(10));
        let handle = ticker.handle.abort_handle();
        drop(ticker);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
    }
}
