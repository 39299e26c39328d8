//! Simple moving average crossover, long and short.

use chrono::NaiveDateTime;

use crate::domain::error::TickwheelError;
use crate::domain::indicator::sma;
use crate::domain::order::Side;
use crate::domain::strategy::{PositionView, Strategy, StrategyContext};
use crate::domain::tick::Tick;

pub const NAME: &str = "SMA Crossover";

const SHORT_WINDOW: usize = 5;
const LONG_WINDOW: usize = 20;

/// Golden cross (short SMA crossing above long) enters long, death cross
/// enters short; an open position exits on the opposite cross.
pub struct SmaCrossover {
    ctx: StrategyContext,
    prices: Vec<f64>,
    short_sma: Option<f64>,
    long_sma: Option<f64>,
    entry_price: Option<f64>,
}

pub fn factory(ctx: StrategyContext) -> Box<dyn Strategy> {
    Box::new(SmaCrossover::new(ctx))
}

impl SmaCrossover {
    pub fn new(ctx: StrategyContext) -> Self {
        let entry_price = ctx.restored_entry_price(NAME);
        SmaCrossover {
            ctx,
            prices: Vec::new(),
            short_sma: None,
            long_sma: None,
            entry_price,
        }
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn on_tick(&mut self, timestamp: NaiveDateTime, tick: &Tick) -> Result<(), TickwheelError> {
        let Some(price) = tick.price() else {
            return Ok(());
        };

        let current_qty = match self.ctx.position_view(NAME) {
            PositionView::Foreign => return Ok(()),
            PositionView::Mine(pos) => pos.quantity,
            PositionView::Flat => 0,
        };

        self.prices.push(price);
        if self.prices.len() < LONG_WINDOW {
            return Ok(());
        }

        let prev_short = self.short_sma;
        let prev_long = self.long_sma;
        self.short_sma = sma(&self.prices, SHORT_WINDOW);
        self.long_sma = sma(&self.prices, LONG_WINDOW);

        let (Some(prev_short), Some(prev_long)) = (prev_short, prev_long) else {
            return Ok(());
        };
        let (Some(short), Some(long)) = (self.short_sma, self.long_sma) else {
            return Ok(());
        };

        let golden_cross = prev_short <= prev_long && short > long;
        let death_cross = prev_short >= prev_long && short < long;

        if current_qty > 0 && death_cross {
            self.ctx.place_exit(
                NAME,
                timestamp,
                Side::Sell,
                current_qty.abs(),
                price,
                self.entry_price,
                "SMA Crossover",
            )?;
            self.entry_price = None;
            return Ok(());
        }

        if current_qty < 0 && golden_cross {
            self.ctx.place_exit(
                NAME,
                timestamp,
                Side::Buy,
                current_qty.abs(),
                price,
                self.entry_price,
                "SMA Crossover",
            )?;
            self.entry_price = None;
            return Ok(());
        }

        if current_qty == 0 {
            let quantity = self.ctx.quantity_for(price);
            if quantity <= 0 {
                return Ok(());
            }
            if golden_cross {
                self.ctx.place_entry(NAME, timestamp, Side::Buy, quantity, price)?;
                self.entry_price = Some(price);
            } else if death_cross {
                self.ctx.place_entry(NAME, timestamp, Side::Sell, quantity, price)?;
                self.entry_price = Some(price);
            }
        }

        Ok(())
    }
}
