//! Historical candle data port trait.

use chrono::NaiveDate;

use crate::domain::error::TickwheelError;
use crate::domain::tick::Candle;

/// Candle resolution in minutes.
pub const DEFAULT_RESOLUTION: u32 = 1;

pub trait DataPort: Send + Sync {
    /// Fetch candles for one symbol over an inclusive date range, in
    /// chronological order.
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        resolution: u32,
    ) -> Result<Vec<Candle>, TickwheelError>;
}
