//! Opening range breakout with fixed percentage risk management.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::error::TickwheelError;
use crate::domain::order::{Side, TradeType};
use crate::domain::strategy::{PositionView, Strategy, StrategyContext};
use crate::domain::tick::Tick;

pub const NAME: &str = "Opening Breakout";

const THRESHOLD_PCT: f64 = 1.0;
const STOPLOSS_PCT: f64 = 1.0;
const TARGET_PCT: f64 = 2.0;

/// Takes the first price seen at or after 09:30 as the opening reference,
/// then trades a 1% breakout in either direction with a 2% target and 1%
/// stop. One round trip per day; intraday positions square off at 15:15.
pub struct OpeningBreakout {
    ctx: StrategyContext,
    reference_time: NaiveTime,
    square_off_time: NaiveTime,
    reference_price: Option<f64>,
    entry_price: Option<f64>,
    trade_taken_today: bool,
    current_day: Option<NaiveDate>,
}

pub fn factory(ctx: StrategyContext) -> Box<dyn Strategy> {
    Box::new(OpeningBreakout::new(ctx))
}

impl OpeningBreakout {
    pub fn new(ctx: StrategyContext) -> Self {
        let entry_price = ctx.restored_entry_price(NAME);
        OpeningBreakout {
            ctx,
            reference_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            square_off_time: NaiveTime::from_hms_opt(15, 15, 0).unwrap_or_default(),
            reference_price: None,
            entry_price,
            trade_taken_today: false,
            current_day: None,
        }
    }

    fn reset_day(&mut self) {
        self.reference_price = None;
        self.trade_taken_today = false;
    }

    fn manage_open_position(
        &mut self,
        quantity: i64,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), TickwheelError> {
        let Some(entry) = self.entry_price else {
            // Restarted mid-position without a restorable entry price;
            // only the square-off clock can close it.
            return self.square_off_if_due(quantity, price, timestamp);
        };

        let long = quantity > 0;
        let (should_exit, reason) = if long {
            if price >= entry * (1.0 + TARGET_PCT / 100.0) {
                (true, "Target Profit Hit")
            } else if price <= entry * (1.0 - STOPLOSS_PCT / 100.0) {
                (true, "Stop Loss Hit")
            } else {
                (false, "")
            }
        } else if price <= entry * (1.0 - TARGET_PCT / 100.0) {
            (true, "Target Profit Hit")
        } else if price >= entry * (1.0 + STOPLOSS_PCT / 100.0) {
            (true, "Stop Loss Hit")
        } else {
            (false, "")
        };

        if should_exit {
            return self.exit(quantity, price, timestamp, reason);
        }
        self.square_off_if_due(quantity, price, timestamp)
    }

    fn square_off_if_due(
        &mut self,
        quantity: i64,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<(), TickwheelError> {
        if self.ctx.trade_type == TradeType::Intraday && timestamp.time() >= self.square_off_time {
            return self.exit(quantity, price, timestamp, "Intraday Auto Square-Off");
        }
        Ok(())
    }

    fn exit(
        &mut self,
        quantity: i64,
        price: f64,
        timestamp: NaiveDateTime,
        reason: &str,
    ) -> Result<(), TickwheelError> {
        let side = if quantity > 0 { Side::Sell } else { Side::Buy };
        self.ctx.place_exit(
            NAME,
            timestamp,
            side,
            quantity.abs(),
            price,
            self.entry_price,
            reason,
        )?;
        self.entry_price = None;
        self.trade_taken_today = true;
        Ok(())
    }

    fn look_for_entry(&mut self, price: f64, timestamp: NaiveDateTime) -> Result<(), TickwheelError> {
        let Some(reference) = self.reference_price else {
            return Ok(());
        };
        let quantity = self.ctx.quantity_for(price);
        if quantity <= 0 {
            return Ok(());
        }

        let breakout_high = reference * (1.0 + THRESHOLD_PCT / 100.0);
        let breakout_low = reference * (1.0 - THRESHOLD_PCT / 100.0);

        if price > breakout_high {
            self.ctx.place_entry(NAME, timestamp, Side::Buy, quantity, price)?;
            self.entry_price = Some(price);
        } else if price < breakout_low {
            self.ctx.place_entry(NAME, timestamp, Side::Sell, quantity, price)?;
            self.entry_price = Some(price);
        }
        Ok(())
    }
}

impl Strategy for OpeningBreakout {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_tick(&mut self, timestamp: NaiveDateTime, tick: &Tick) -> Result<(), TickwheelError> {
        let Some(price) = tick.price() else {
            return Ok(());
        };

        if self.current_day.is_none_or(|day| timestamp.date() > day) {
            self.reset_day();
            self.current_day = Some(timestamp.date());
        }

        let quantity = match self.ctx.position_view(NAME) {
            PositionView::Foreign => return Ok(()),
            PositionView::Mine(pos) => pos.quantity,
            PositionView::Flat => 0,
        };

        if quantity != 0 {
            return self.manage_open_position(quantity, price, timestamp);
        }

        if self.reference_price.is_none() && timestamp.time() >= self.reference_time {
            self.reference_price = Some(price);
        }

        if !self.trade_taken_today {
            self.look_for_entry(price, timestamp)?;
        }
        Ok(())
    }
}
