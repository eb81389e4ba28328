use std::time::{Duration, Instant};

use log::{debug, trace};
use tokio::sync::mpsc::{self, Receiver, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// A periodic, payload-free timing signal.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub at: Instant,
}

/// Fixed-period tick producer.
///
/// Delivery is best-effort: the queue holds one tick, and ticks that find it
/// full are dropped, so a slow consumer sees them coalesced.
pub struct Ticker {
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking. The first tick arrives one `period` from now.
    pub fn start(period: Duration) -> (Self, Receiver<Tick>) {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let at = interval.tick().await;
                match tx.try_send(Tick { at: at.into_std() }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => trace!("Tick coalesced"),
                    Err(TrySendError::Closed(_)) => return,
                }
            }
        });
        debug!("Ticker started ({:?})", period);
        (Self { task: Some(task) }, rx)
    }

    /// Stop ticking and release the timer. Later calls do nothing.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
