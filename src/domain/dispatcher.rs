//! Tick routing: bounded worker pool for live feeds, inline dispatch for
//! replays.
//!
//! Delivery order across symbols is not guaranteed in live mode, and
//! same-symbol ordering is only as strong as submission order into the
//! job channel; the pool enforces no sequencing token. Replay dispatch is
//! strictly chronological by construction.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::domain::strategy::Strategy;
use crate::domain::tick::Tick;
use crate::ports::log_port::LogSink;

/// Worker count for live sessions.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// How long `shutdown` waits for in-flight work before detaching workers.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

struct Job {
    timestamp: NaiveDateTime,
    tick: Tick,
}

type StrategyMap = HashMap<String, Mutex<Box<dyn Strategy>>>;

/// Cloneable submission handle for feed callbacks.
#[derive(Clone)]
pub struct DispatchHandle {
    sender: Sender<Job>,
    log: Arc<dyn LogSink>,
}

impl DispatchHandle {
    /// Queue one tick for a worker. Never blocks on strategy work.
    pub fn submit(&self, timestamp: NaiveDateTime, tick: Tick) {
        if self.sender.send(Job { timestamp, tick }).is_err() {
            self.log.log("Dispatcher", "Tick dropped: dispatcher is shut down");
        }
    }
}

pub struct TickDispatcher {
    strategies: Arc<StrategyMap>,
    sender: Option<Sender<Job>>,
    done_rx: Receiver<()>,
    workers: Vec<thread::JoinHandle<()>>,
    log: Arc<dyn LogSink>,
}

impl TickDispatcher {
    /// Build a dispatcher over one strategy instance per symbol. With
    /// `pool_size` 0 no threads start and only [`dispatch_blocking`]
    /// (replay mode) is usable.
    ///
    /// [`dispatch_blocking`]: TickDispatcher::dispatch_blocking
    pub fn new(
        strategies: HashMap<String, Box<dyn Strategy>>,
        pool_size: usize,
        log: Arc<dyn LogSink>,
    ) -> Self {
        let strategies: Arc<StrategyMap> = Arc::new(
            strategies
                .into_iter()
                .map(|(symbol, strategy)| (symbol, Mutex::new(strategy)))
                .collect(),
        );

        let (sender, receiver) = channel::<Job>();
        let (done_tx, done_rx) = channel::<()>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let receiver = Arc::clone(&receiver);
            let strategies = Arc::clone(&strategies);
            let log = Arc::clone(&log);
            let done_tx = done_tx.clone();
            workers.push(thread::spawn(move || {
                loop {
                    let job = {
                        let guard = match receiver.lock() {
                            Ok(guard) => guard,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        guard.recv()
                    };
                    match job {
                        Ok(job) => process_tick(&strategies, &log, job.timestamp, &job.tick),
                        Err(_) => break,
                    }
                }
                let _ = done_tx.send(());
            }));
        }

        TickDispatcher {
            strategies,
            sender: if pool_size > 0 { Some(sender) } else { None },
            done_rx,
            workers,
            log,
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.strategies.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Submission handle for the live feed callback.
    pub fn handle(&self) -> Option<DispatchHandle> {
        self.sender.as_ref().map(|sender| DispatchHandle {
            sender: sender.clone(),
            log: Arc::clone(&self.log),
        })
    }

    /// Queue one tick for the worker pool.
    pub fn submit(&self, timestamp: NaiveDateTime, tick: Tick) {
        match &self.sender {
            Some(sender) => {
                if sender.send(Job { timestamp, tick }).is_err() {
                    self.log.log("Dispatcher", "Tick dropped: worker pool stopped");
                }
            }
            None => self.log.log(
                "Dispatcher",
                "Tick dropped: dispatcher has no worker pool (replay mode)",
            ),
        }
    }

    /// Process one tick inline on the caller thread (replay mode).
    pub fn dispatch_blocking(&self, timestamp: NaiveDateTime, tick: &Tick) {
        process_tick(&self.strategies, &self.log, timestamp, tick);
    }

    /// Graceful drain: stop accepting ticks, wait for submitted work,
    /// join the workers. Workers still busy after [`DRAIN_TIMEOUT`] are
    /// detached with a warning.
    pub fn shutdown(mut self) {
        drop(self.sender.take());

        let deadline = Instant::now() + DRAIN_TIMEOUT;
        let mut finished = 0usize;
        for _ in 0..self.workers.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.done_rx.recv_timeout(remaining) {
                Ok(()) => finished += 1,
                Err(_) => break,
            }
        }

        if finished < self.workers.len() {
            self.log.log(
                "Dispatcher",
                &format!(
                    "Drain timed out; detaching {} busy worker(s)",
                    self.workers.len() - finished
                ),
            );
            return;
        }

        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Deliver one tick to its symbol's strategy. Strategy errors and panics
/// are logged here and never propagate; ticks for unsubscribed symbols
/// are ignored.
fn process_tick(
    strategies: &StrategyMap,
    log: &Arc<dyn LogSink>,
    timestamp: NaiveDateTime,
    tick: &Tick,
) {
    let Some(slot) = strategies.get(&tick.symbol) else {
        return;
    };
    let mut strategy = match slot.lock() {
        Ok(guard) => guard,
        // A previous panic poisoned the slot; the strategy's own state is
        // whatever it is, but the ledger stayed consistent.
        Err(poisoned) => poisoned.into_inner(),
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| strategy.on_tick(timestamp, tick)));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log.log(
            "Dispatcher",
            &format!("Error processing tick for {}: {e}", tick.symbol),
        ),
        Err(_) => log.log(
            "Dispatcher",
            &format!("Panic processing tick for {}", tick.symbol),
        ),
    }
}
