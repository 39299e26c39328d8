//! Scripted tick feed. Delivers a fixed sequence of ticks on a background
//! thread, which is how live-session plumbing gets exercised without a
//! real market connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::domain::error::TickwheelError;
use crate::domain::tick::Tick;
use crate::ports::feed_port::{FeedPort, TickCallback};

pub struct ReplayFeedAdapter {
    script: Vec<Tick>,
    /// Pause between deliveries; zero replays as fast as possible.
    interval: Duration,
    stop: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ReplayFeedAdapter {
    pub fn new(script: Vec<Tick>) -> Self {
        Self {
            script,
            interval: Duration::ZERO,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl FeedPort for ReplayFeedAdapter {
    fn subscribe(
        &mut self,
        symbols: &[String],
        on_tick: TickCallback,
    ) -> Result<(), TickwheelError> {
        let wanted: Vec<String> = symbols.to_vec();
        let script: Vec<Tick> = self
            .script
            .iter()
            .filter(|t| wanted.iter().any(|s| s == &t.symbol))
            .cloned()
            .collect();
        let stop = Arc::clone(&self.stop);
        let interval = self.interval;

        self.worker = Some(thread::spawn(move || {
            for tick in script {
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                on_tick(tick);
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
        }));
        Ok(())
    }

    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for ReplayFeedAdapter {
    fn drop(&mut self) {
        self.close();
    }
}
