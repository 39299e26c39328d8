//! Swing pivot breakout with a daily-trend filter and 1:2 risk:reward.

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::TickwheelError;
use crate::domain::indicator::{pivot_high, pivot_low, sma};
use crate::domain::order::Side;
use crate::domain::strategy::{PositionView, Strategy, StrategyContext};
use crate::domain::tick::{Candle, Tick};

pub const NAME: &str = "Swing Breakout Trend";

const DAILY_SMA_LENGTH: usize = 20;
const SWING_LENGTH: usize = 5;
/// Target distance is this multiple of the structural risk.
const REWARD_RISK: f64 = 2.0;

/// Longs break above a confirmed pivot high when the daily close sits
/// above its 20-day SMA; shorts mirror below a pivot low. The stop is the
/// pivot bar's opposite extreme and the target twice the risk.
pub struct SwingBreakout {
    ctx: StrategyContext,
    daily_sma_length: usize,
    swing_length: usize,
    daily_closes: Vec<(NaiveDate, f64)>,
    bars: Vec<Candle>,
    entry_price: Option<f64>,
    stop: Option<f64>,
    target: Option<f64>,
}

pub fn factory(ctx: StrategyContext) -> Box<dyn Strategy> {
    Box::new(SwingBreakout::new(ctx, DAILY_SMA_LENGTH, SWING_LENGTH))
}

impl SwingBreakout {
    pub fn new(ctx: StrategyContext, daily_sma_length: usize, swing_length: usize) -> Self {
        // Stop and target are not persisted; after a restart they rebuild
        // from the next confirmed pivot.
        let entry_price = ctx.restored_entry_price(NAME);
        SwingBreakout {
            ctx,
            daily_sma_length,
            swing_length,
            daily_closes: Vec::new(),
            bars: Vec::new(),
            entry_price,
            stop: None,
            target: None,
        }
    }

    fn record_bar(&mut self, timestamp: NaiveDateTime, tick: &Tick, price: f64) {
        self.bars.push(Candle {
            timestamp,
            open: tick.open.unwrap_or(price),
            high: tick.high_or_price().unwrap_or(price),
            low: tick.low_or_price().unwrap_or(price),
            close: price,
            volume: tick.volume.unwrap_or(0),
        });

        let date = timestamp.date();
        match self.daily_closes.last_mut() {
            Some((last_date, close)) if *last_date == date => *close = price,
            _ => self.daily_closes.push((date, price)),
        }
    }

    fn daily_trend(&self) -> Option<(bool, bool)> {
        if self.daily_closes.len() < self.daily_sma_length {
            return None;
        }
        let closes: Vec<f64> = self.daily_closes.iter().map(|(_, c)| *c).collect();
        let daily_sma = sma(&closes, self.daily_sma_length)?;
        let daily_close = *closes.last()?;
        Some((daily_close > daily_sma, daily_close < daily_sma))
    }

    fn rebuild_levels(&mut self, quantity: i64) {
        let Some(entry) = self.entry_price else {
            return;
        };
        if quantity > 0 {
            if let Some(pivot) = pivot_high(&self.bars, self.swing_length) {
                let stop = pivot.counter_value;
                self.stop = Some(stop);
                self.target = Some(entry + (entry - stop) * REWARD_RISK);
            }
        } else if let Some(pivot) = pivot_low(&self.bars, self.swing_length) {
            let stop = pivot.counter_value;
            self.stop = Some(stop);
            self.target = Some(entry - (stop - entry) * REWARD_RISK);
        }
    }

    fn reset_trade(&mut self) {
        self.entry_price = None;
        self.stop = None;
        self.target = None;
    }

    fn manage_position(
        &mut self,
        quantity: i64,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), TickwheelError> {
        if self.stop.is_none() || self.target.is_none() {
            self.rebuild_levels(quantity);
        }
        let (Some(stop), Some(target)) = (self.stop, self.target) else {
            return Ok(());
        };

        let should_exit = if quantity > 0 {
            price <= stop || price >= target
        } else {
            price >= stop || price <= target
        };
        if !should_exit {
            return Ok(());
        }

        let side = if quantity > 0 { Side::Sell } else { Side::Buy };
        self.ctx.place_exit(
            NAME,
            timestamp,
            side,
            quantity.abs(),
            price,
            self.entry_price,
            "SL/TP Hit",
        )?;
        self.reset_trade();
        Ok(())
    }
}

impl Strategy for SwingBreakout {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_tick(&mut self, timestamp: NaiveDateTime, tick: &Tick) -> Result<(), TickwheelError> {
        let Some(price) = tick.price() else {
            return Ok(());
        };

        let quantity = match self.ctx.position_view(NAME) {
            PositionView::Foreign => return Ok(()),
            PositionView::Mine(pos) => pos.quantity,
            PositionView::Flat => 0,
        };

        self.record_bar(timestamp, tick, price);

        let Some((trend_long, trend_short)) = self.daily_trend() else {
            return Ok(());
        };

        if quantity != 0 {
            return self.manage_position(quantity, price, timestamp);
        }

        let order_quantity = self.ctx.quantity_for(price);
        if order_quantity <= 0 {
            return Ok(());
        }

        if trend_long {
            if let Some(pivot) = pivot_high(&self.bars, self.swing_length) {
                if price > pivot.value {
                    self.ctx
                        .place_entry(NAME, timestamp, Side::Buy, order_quantity, price)?;
                    let stop = pivot.counter_value;
                    self.entry_price = Some(price);
                    self.stop = Some(stop);
                    self.target = Some(price + (price - stop) * REWARD_RISK);
                    return Ok(());
                }
            }
        }
        if trend_short {
            if let Some(pivot) = pivot_low(&self.bars, self.swing_length) {
                if price < pivot.value {
                    self.ctx
                        .place_entry(NAME, timestamp, Side::Sell, order_quantity, price)?;
                    let stop = pivot.counter_value;
                    self.entry_price = Some(price);
                    self.stop = Some(stop);
                    self.target = Some(price - (stop - price) * REWARD_RISK);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::log_adapter::ChannelLogAdapter;
    use crate::adapters::memory_state_adapter::{MemoryPositionStore, MemoryTradeHistory};
    use crate::domain::ledger::PositionLedger;
    use crate::domain::order::TradeType;
    use crate::domain::strategy::Sizing;
    use std::sync::Arc;

    fn ts(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample_ledger() -> Arc<PositionLedger> {
        let (log, _rx) = ChannelLogAdapter::pair();
        Arc::new(
            PositionLedger::new(
                Box::new(MemoryPositionStore::new()),
                Box::new(MemoryTradeHistory::new()),
                Arc::new(log),
            )
            .unwrap(),
        )
    }

    /// Short windows keep the fixtures small; the production factory uses
    /// SMA 20 / swing 5.
    fn sample_strategy(ledger: Arc<PositionLedger>) -> SwingBreakout {
        SwingBreakout::new(
            StrategyContext {
                symbol: "NSE:NIFTY50-INDEX".into(),
                ledger,
                trade_type: TradeType::Intraday,
                sizing: Sizing::Quantity(2),
            },
            2,
            1,
        )
    }

    fn bar_tick(high: f64, low: f64, close: f64) -> Tick {
        Tick {
            symbol: "NSE:NIFTY50-INDEX".into(),
            ltp: None,
            open: Some(close),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(100),
        }
    }

    fn warmed_up(ledger: Arc<PositionLedger>) -> SwingBreakout {
        let mut strategy = sample_strategy(ledger);
        // Day 1 establishes the first daily close at 100.
        for m in 0..3 {
            strategy
                .on_tick(ts(15, 10, m), &bar_tick(100.0, 100.0, 100.0))
                .unwrap();
        }
        // Day 2: a pivot high at 105 (neighbors 101 and 102).
        strategy.on_tick(ts(16, 10, 0), &bar_tick(101.0, 100.0, 100.5)).unwrap();
        strategy
            .on_tick(ts(16, 10, 1), &bar_tick(105.0, 103.5, 104.0))
            .unwrap();
        strategy.on_tick(ts(16, 10, 2), &bar_tick(102.0, 101.0, 101.5)).unwrap();
        strategy
    }

    #[test]
    fn no_entry_without_enough_daily_closes() {
        let ledger = sample_ledger();
        let mut strategy = sample_strategy(ledger.clone());
        for m in 0..10 {
            strategy
                .on_tick(ts(15, 10, m), &bar_tick(100.0 + m as f64, 99.0, 100.0))
                .unwrap();
        }
        assert!(ledger.trade_records().is_empty());
    }

    #[test]
    fn pivot_breakout_with_trend_enters_long() {
        let ledger = sample_ledger();
        let mut strategy = warmed_up(ledger.clone());

        // Price 106 breaks the 105 pivot; daily close 106 > SMA(2) = 103.
        strategy.on_tick(ts(16, 10, 3), &Tick::from_ltp("NSE:NIFTY50-INDEX", 106.0)).unwrap();

        assert_eq!(ledger.get_position_quantity("NSE:NIFTY50-INDEX"), 2);
        assert_eq!(strategy.stop, Some(103.5));
        // Target = 106 + (106 - 103.5) * 2 = 111.
        assert_eq!(strategy.target, Some(111.0));
    }

    #[test]
    fn target_exit_books_one_to_two() {
        let ledger = sample_ledger();
        let mut strategy = warmed_up(ledger.clone());
        strategy.on_tick(ts(16, 10, 3), &Tick::from_ltp("NSE:NIFTY50-INDEX", 106.0)).unwrap();

        strategy.on_tick(ts(16, 10, 10), &Tick::from_ltp("NSE:NIFTY50-INDEX", 111.5)).unwrap();

        let records = ledger.trade_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].reason, "SL/TP Hit");
        assert!((records[1].pnl - (111.5 - 106.0) * 2.0).abs() < 1e-9);
        assert!(ledger.get_open_position("NSE:NIFTY50-INDEX").is_none());
    }

    #[test]
    fn structural_stop_exit() {
        let ledger = sample_ledger();
        let mut strategy = warmed_up(ledger.clone());
        strategy.on_tick(ts(16, 10, 3), &Tick::from_ltp("NSE:NIFTY50-INDEX", 106.0)).unwrap();

        // Stop is the pivot bar's low, 103.5.
        strategy.on_tick(ts(16, 10, 10), &Tick::from_ltp("NSE:NIFTY50-INDEX", 103.0)).unwrap();

        let records = ledger.trade_records();
        assert_eq!(records[1].reason, "SL/TP Hit");
        assert!(records[1].pnl < 0.0);
    }

    #[test]
    fn counter_trend_breakout_is_ignored() {
        let ledger = sample_ledger();
        let mut strategy = sample_strategy(ledger.clone());
        // Day 1 daily close 110; day 2 trades below it, so the long
        // filter is off even if a pivot breaks.
        for m in 0..3 {
            strategy
                .on_tick(ts(15, 10, m), &bar_tick(110.0, 110.0, 110.0))
                .unwrap();
        }
        strategy.on_tick(ts(16, 10, 0), &bar_tick(101.0, 100.0, 100.5)).unwrap();
        strategy.on_tick(ts(16, 10, 1), &bar_tick(105.0, 103.5, 104.0)).unwrap();
        strategy.on_tick(ts(16, 10, 2), &bar_tick(102.0, 101.0, 101.5)).unwrap();
        strategy.on_tick(ts(16, 10, 3), &Tick::from_ltp("NSE:NIFTY50-INDEX", 106.0)).unwrap();

        // 106 < SMA(2) of (110, 106) = 108: no long entry.
        assert!(ledger.trade_records().is_empty());
    }

    #[test]
    fn restart_rebuilds_stop_and_target_from_pivot() {
        let ledger = sample_ledger();
        {
            let mut strategy = warmed_up(ledger.clone());
            strategy.on_tick(ts(16, 10, 3), &Tick::from_ltp("NSE:NIFTY50-INDEX", 106.0)).unwrap();
        }

        // Fresh instance over the same ledger: the entry price restores,
        // but stop/target wait for a newly confirmed pivot.
        let mut strategy = sample_strategy(ledger.clone());
        assert_eq!(strategy.entry_price, Some(106.0));
        assert_eq!(strategy.stop, None);

        strategy.on_tick(ts(16, 11, 0), &bar_tick(105.0, 104.5, 104.8)).unwrap();
        strategy.on_tick(ts(17, 10, 0), &bar_tick(106.0, 104.0, 105.0)).unwrap();
        assert_eq!(strategy.stop, None);

        // Third bar confirms a pivot high at 106 with bar low 104.
        strategy.on_tick(ts(17, 10, 1), &bar_tick(105.5, 105.0, 105.2)).unwrap();
        assert_eq!(strategy.stop, Some(104.0));
        // Target = 106 + (106 - 104) * 2 = 110; 105.2 holds the position.
        assert_eq!(strategy.target, Some(110.0));
        assert_eq!(ledger.get_position_quantity("NSE:NIFTY50-INDEX"), 2);
    }
}
