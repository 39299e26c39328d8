//! Short breakdown of the first 15-minute candle's low.

use chrono::NaiveDateTime;

use crate::domain::candle::CandleBucketer;
use crate::domain::error::TickwheelError;
use crate::domain::order::Side;
use crate::domain::strategy::{PositionView, Strategy, StrategyContext};
use crate::domain::tick::{Candle, Tick};

pub const NAME: &str = "15-Min Breakdown";

const BUCKET_MINUTES: u32 = 15;
/// Setup requires the first candle's range to stay below this percentage
/// of its low.
const MAX_RANGE_PCT: f64 = 1.0;
const TARGET_PCT: f64 = 2.0;
const STOPLOSS_PCT: f64 = 1.0;

enum Phase {
    /// Aggregating the setup candle.
    FirstCandle,
    /// Setup candle closed quiet; watching for a break of its low.
    WatchingBreak { first: Candle },
    /// Short position open.
    InPosition,
}

/// Aggregates ticks into 15-minute candles. When a candle's high-low range
/// is under 1% of its low, a trade of the next candle breaking below that
/// low enters short, targeting 2% below entry with a 1% stop above. Any
/// candle pair that produces no entry resets the setup.
pub struct FifteenMinBreakdown {
    ctx: StrategyContext,
    bucketer: CandleBucketer,
    phase: Phase,
    entry_price: Option<f64>,
}

pub fn factory(ctx: StrategyContext) -> Box<dyn Strategy> {
    Box::new(FifteenMinBreakdown::new(ctx))
}

impl FifteenMinBreakdown {
    pub fn new(ctx: StrategyContext) -> Self {
        let entry_price = ctx.restored_entry_price(NAME);
        let phase = if entry_price.is_some() {
            Phase::InPosition
        } else {
            Phase::FirstCandle
        };
        FifteenMinBreakdown {
            ctx,
            bucketer: CandleBucketer::new(BUCKET_MINUTES),
            phase,
            entry_price,
        }
    }

    fn range_pct(candle: &Candle) -> f64 {
        if candle.low <= 0.0 {
            return f64::MAX;
        }
        (candle.high - candle.low) / candle.low * 100.0
    }

    fn manage_position(
        &mut self,
        quantity: i64,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), TickwheelError> {
        let Some(entry) = self.entry_price else {
            return Ok(());
        };
        let target = entry * (1.0 - TARGET_PCT / 100.0);
        let stop = entry * (1.0 + STOPLOSS_PCT / 100.0);

        let reason = if price <= target {
            "Target Profit Hit"
        } else if price >= stop {
            "Stop Loss Hit"
        } else {
            return Ok(());
        };

        self.ctx.place_exit(
            NAME,
            timestamp,
            Side::Buy,
            quantity.abs(),
            price,
            self.entry_price,
            reason,
        )?;
        self.entry_price = None;
        self.phase = Phase::FirstCandle;
        self.bucketer.reset();
        Ok(())
    }
}

impl Strategy for FifteenMinBreakdown {
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

        if quantity != 0 {
            return self.manage_position(quantity, price, timestamp);
        }

        let completed = self.bucketer.update(timestamp, price);

        match (&self.phase, completed) {
            (Phase::FirstCandle, Some(first)) => {
                if Self::range_pct(&first) < MAX_RANGE_PCT {
                    self.phase = Phase::WatchingBreak { first };
                }
                // A wide first candle stays in FirstCandle; the bucket
                // that just opened becomes the next setup candidate.
            }
            (Phase::WatchingBreak { .. }, Some(_)) => {
                // Second candle closed without a break; start over with
                // the bucket that just opened.
                self.phase = Phase::FirstCandle;
                return Ok(());
            }
            (Phase::InPosition, _) => {
                // Flat in the ledger but still marked in-position: the
                // exit happened through a restart. Resynchronize.
                self.phase = Phase::FirstCandle;
                self.entry_price = None;
                return Ok(());
            }
            _ => {}
        }

        if let Phase::WatchingBreak { first } = &self.phase {
            if price < first.low {
                let order_quantity = self.ctx.quantity_for(price);
                if order_quantity <= 0 {
                    return Ok(());
                }
                self.ctx
                    .place_entry(NAME, timestamp, Side::Sell, order_quantity, price)?;
                self.entry_price = Some(price);
                self.phase = Phase::InPosition;
            }
        }

        Ok(())
    }
}
