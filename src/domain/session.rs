//! Session lifecycle: live trading, paced live simulation, and backtests.
//!
//! One session at a time. All three session kinds share the coordinator's
//! ledger except backtests, which run against fresh in-memory stores so a
//! historical run can never touch the live position files.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::adapters::memory_state_adapter::{MemoryPositionStore, MemoryTradeHistory};
use crate::domain::dispatcher::{DEFAULT_POOL_SIZE, TickDispatcher};
use crate::domain::error::TickwheelError;
use crate::domain::ledger::PositionLedger;
use crate::domain::order::TradeType;
use crate::domain::position::{Position, TradeRecord};
use crate::domain::strategy::{Sizing, Strategy, StrategyContext, StrategyRegistry, Tracker};
use crate::domain::tick::Tick;
use crate::ports::auth_port::AuthPort;
use crate::ports::data_port::{DEFAULT_RESOLUTION, DataPort};
use crate::ports::feed_port::FeedPort;
use crate::ports::log_port::LogSink;

/// Cancellation poll granularity: a stop request is noticed within this
/// interval even mid-sleep.
const CANCEL_POLL: Duration = Duration::from_millis(100);

/// Ceiling on replay pacing so overnight and weekend gaps replay in
/// seconds, not hours.
const MAX_PACED_GAP: Duration = Duration::from_secs(5);

/// Outcome of one backtest run.
#[derive(Debug)]
pub struct BacktestReport {
    pub symbol: String,
    pub strategy: String,
    pub trades: Vec<TradeRecord>,
    pub open_positions: Vec<Position>,
}

impl BacktestReport {
    /// Sum of realized P&L across the journal.
    pub fn total_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}

struct LiveSession {
    feed: Box<dyn FeedPort>,
    dispatcher: TickDispatcher,
}

pub struct SessionCoordinator {
    auth: Box<dyn AuthPort>,
    data: Box<dyn DataPort>,
    ledger: Arc<PositionLedger>,
    registry: StrategyRegistry,
    log: Arc<dyn LogSink>,
    active: Mutex<Option<&'static str>>,
    cancel: Arc<AtomicBool>,
    token: Mutex<Option<String>>,
    live: Mutex<Option<LiveSession>>,
}

impl SessionCoordinator {
    pub fn new(
        auth: Box<dyn AuthPort>,
        data: Box<dyn DataPort>,
        ledger: Arc<PositionLedger>,
        registry: StrategyRegistry,
        log: Arc<dyn LogSink>,
    ) -> Self {
        SessionCoordinator {
            auth,
            data,
            ledger,
            registry,
            log,
            active: Mutex::new(None),
            cancel: Arc::new(AtomicBool::new(false)),
            token: Mutex::new(None),
            live: Mutex::new(None),
        }
    }

    pub fn ledger(&self) -> &Arc<PositionLedger> {
        &self.ledger
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
        match mutex.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Claim the single session slot, or report what is already running.
    fn begin(&self, kind: &'static str) -> Result<(), TickwheelError> {
        let mut active = Self::lock(&self.active);
        if let Some(running) = *active {
            return Err(TickwheelError::SessionActive {
                running: running.to_string(),
            });
        }
        *active = Some(kind);
        self.cancel.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn finish(&self) {
        *Self::lock(&self.active) = None;
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Fetch the broker token once; later sessions reuse it.
    fn authenticate(&self) -> Result<(), TickwheelError> {
        let mut token = Self::lock(&self.token);
        if token.is_some() {
            self.log.log("Session", "Reusing existing access token");
            return Ok(());
        }
        *token = Some(self.auth.get_access_token()?);
        self.log.log("Session", "Authenticated with broker");
        Ok(())
    }

    /// One strategy instance per tracker. Unknown strategy names are
    /// warned about and skipped, not fatal.
    fn build_strategies(
        &self,
        trackers: &[Tracker],
    ) -> Result<HashMap<String, Box<dyn Strategy>>, TickwheelError> {
        let mut strategies: HashMap<String, Box<dyn Strategy>> = HashMap::new();
        for tracker in trackers {
            if !self.registry.contains(&tracker.strategy_name) {
                self.log.log(
                    "Session",
                    &format!(
                        "Unknown strategy '{}' for {}; tracker skipped",
                        tracker.strategy_name, tracker.symbol
                    ),
                );
                continue;
            }
            let strategy = self.registry.build(
                &tracker.strategy_name,
                StrategyContext {
                    symbol: tracker.symbol.clone(),
                    ledger: Arc::clone(&self.ledger),
                    trade_type: tracker.trade_type,
                    sizing: tracker.sizing,
                },
            )?;
            strategies.insert(tracker.symbol.clone(), strategy);
        }
        Ok(strategies)
    }

    /// Start live trading over the given feed and return immediately; the
    /// session runs on the feed's delivery thread and the dispatcher pool
    /// until [`stop_session`] is called.
    ///
    /// [`stop_session`]: SessionCoordinator::stop_session
    pub fn start_live_session(
        &self,
        trackers: &[Tracker],
        mut feed: Box<dyn FeedPort>,
    ) -> Result<(), TickwheelError> {
        self.begin("live")?;
        match self.live_setup(trackers, feed.as_mut()) {
            Ok(Some(dispatcher)) => {
                *Self::lock(&self.live) = Some(LiveSession { feed, dispatcher });
                Ok(())
            }
            Ok(None) => {
                self.finish();
                Ok(())
            }
            Err(e) => {
                self.finish();
                Err(e)
            }
        }
    }

    fn live_setup(
        &self,
        trackers: &[Tracker],
        feed: &mut dyn FeedPort,
    ) -> Result<Option<TickDispatcher>, TickwheelError> {
        self.authenticate()?;
        let strategies = self.build_strategies(trackers)?;
        if strategies.is_empty() {
            self.log
                .log("Session", "No valid trackers; live session not started");
            return Ok(None);
        }

        let dispatcher = TickDispatcher::new(strategies, DEFAULT_POOL_SIZE, Arc::clone(&self.log));
        let symbols = dispatcher.symbols();
        let Some(handle) = dispatcher.handle() else {
            return Err(TickwheelError::Feed {
                reason: "dispatcher started without a worker pool".to_string(),
            });
        };

        // Live ticks are stamped with arrival time; only replays carry
        // historical timestamps.
        feed.subscribe(
            &symbols,
            Box::new(move |tick| {
                handle.submit(Local::now().naive_local(), tick);
            }),
        )?;

        self.log.log(
            "Session",
            &format!("Live session started for {} symbol(s)", symbols.len()),
        );
        Ok(Some(dispatcher))
    }

    /// Start paced historical replay; blocks until the range is exhausted
    /// or a stop is requested. `speed` divides the inter-tick gaps.
    pub fn start_live_simulation(
        &self,
        trackers: &[Tracker],
        start: NaiveDate,
        end: NaiveDate,
        speed: f64,
    ) -> Result<(), TickwheelError> {
        self.begin("simulation")?;
        let result = self.simulate_inner(trackers, start, end, speed);
        self.finish();
        result
    }

    fn simulate_inner(
        &self,
        trackers: &[Tracker],
        start: NaiveDate,
        end: NaiveDate,
        speed: f64,
    ) -> Result<(), TickwheelError> {
        let speed = if speed > 0.0 {
            speed
        } else {
            self.log
                .log("Session", "Non-positive speed; falling back to 1x");
            1.0
        };

        self.authenticate()?;
        let strategies = self.build_strategies(trackers)?;
        if strategies.is_empty() {
            self.log
                .log("Session", "No valid trackers; simulation not started");
            return Ok(());
        }

        let mut stream: Vec<(NaiveDateTime, Tick)> = Vec::new();
        for symbol in strategies.keys() {
            let candles = self
                .data
                .fetch_candles(symbol, start, end, DEFAULT_RESOLUTION)?;
            for candle in candles {
                stream.push((candle.timestamp, candle.to_tick(symbol)));
            }
        }
        // Stable sort: per-symbol chronological order from the data port
        // is preserved for equal timestamps.
        stream.sort_by_key(|(ts, _)| *ts);

        if stream.is_empty() {
            self.log
                .log("Session", "No historical data in simulation range");
            return Ok(());
        }

        self.log.log(
            "Session",
            &format!(
                "Simulation started: {} ticks across {} symbol(s) at {}x",
                stream.len(),
                strategies.len(),
                speed
            ),
        );

        let dispatcher = TickDispatcher::new(strategies, 0, Arc::clone(&self.log));
        let mut delivered = 0usize;
        for i in 0..stream.len() {
            if self.is_cancelled() {
                self.log.log("Session", "Simulation cancelled");
                return Ok(());
            }
            let started = Instant::now();
            let (timestamp, tick) = &stream[i];
            dispatcher.dispatch_blocking(*timestamp, tick);
            delivered += 1;

            if let Some((next_ts, _)) = stream.get(i + 1) {
                let gap_ms = next_ts
                    .signed_duration_since(*timestamp)
                    .num_milliseconds()
                    .max(0) as f64;
                let paced = Duration::from_millis((gap_ms / speed) as u64).min(MAX_PACED_GAP);
                let budget = paced.saturating_sub(started.elapsed());
                self.sleep_cancellable(budget);
            }
        }

        self.log.log(
            "Session",
            &format!("Simulation complete ({} ticks)", delivered),
        );
        Ok(())
    }

    /// Single-pass unthrottled replay of one symbol and strategy over
    /// fresh in-memory stores.
    pub fn run_backtest(
        &self,
        symbol: &str,
        strategy_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        trade_type: TradeType,
        sizing: Sizing,
    ) -> Result<BacktestReport, TickwheelError> {
        self.begin("backtest")?;
        let result = self.backtest_inner(symbol, strategy_name, start, end, trade_type, sizing);
        self.finish();
        result
    }

    fn backtest_inner(
        &self,
        symbol: &str,
        strategy_name: &str,
        start: NaiveDate,
        end: NaiveDate,
        trade_type: TradeType,
        sizing: Sizing,
    ) -> Result<BacktestReport, TickwheelError> {
        let ledger = Arc::new(PositionLedger::new(
            Box::new(MemoryPositionStore::new()),
            Box::new(MemoryTradeHistory::new()),
            Arc::clone(&self.log),
        )?);

        let strategy = self.registry.build(
            strategy_name,
            StrategyContext {
                symbol: symbol.to_string(),
                ledger: Arc::clone(&ledger),
                trade_type,
                sizing,
            },
        )?;

        let candles = self
            .data
            .fetch_candles(symbol, start, end, DEFAULT_RESOLUTION)?;
        if candles.is_empty() {
            self.log.log(
                "Session",
                &format!("No historical data for {symbol} in range"),
            );
            return Ok(BacktestReport {
                symbol: symbol.to_string(),
                strategy: strategy_name.to_string(),
                trades: Vec::new(),
                open_positions: Vec::new(),
            });
        }

        self.log.log(
            "Session",
            &format!("Backtest started: {} over {} candles", strategy_name, candles.len()),
        );

        let mut strategies: HashMap<String, Box<dyn Strategy>> = HashMap::new();
        strategies.insert(symbol.to_string(), strategy);
        let dispatcher = TickDispatcher::new(strategies, 0, Arc::clone(&self.log));

        for candle in &candles {
            dispatcher.dispatch_blocking(candle.timestamp, &candle.to_tick(symbol));
        }

        self.log.log("Session", "Backtest complete");
        Ok(BacktestReport {
            symbol: symbol.to_string(),
            strategy: strategy_name.to_string(),
            trades: ledger.trade_records(),
            open_positions: ledger.open_positions(),
        })
    }

    /// Request cancellation of whatever is running. A simulation notices
    /// within one poll interval; a live session is closed and drained
    /// before this returns.
    pub fn stop_session(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        self.log.log("Session", "Stop requested");

        if let Some(mut session) = Self::lock(&self.live).take() {
            session.feed.close();
            session.dispatcher.shutdown();
            self.finish();
            self.log.log("Session", "Live session stopped");
        }
    }

    fn sleep_cancellable(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while !self.is_cancelled() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(CANCEL_POLL));
        }
    }
}
