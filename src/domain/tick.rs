//! Inbound tick and historical candle representation.

use chrono::NaiveDateTime;

/// One inbound price update, live or replayed.
///
/// Live feeds deliver the price under `ltp` (last traded price); historical
/// replays deliver the candle close under `close`. OHLC fields are optional:
/// strategies that only need the last price must tolerate their absence.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub symbol: String,
    pub ltp: Option<f64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl Tick {
    /// A bare last-traded-price tick, as a live feed delivers it.
    pub fn from_ltp(symbol: &str, ltp: f64) -> Self {
        Tick {
            symbol: symbol.to_string(),
            ltp: Some(ltp),
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    /// The tradeable price: `ltp` when present, otherwise the candle close.
    pub fn price(&self) -> Option<f64> {
        self.ltp.or(self.close)
    }

    /// Bar high, falling back to the tradeable price for price-only ticks.
    pub fn high_or_price(&self) -> Option<f64> {
        self.high.or_else(|| self.price())
    }

    /// Bar low, falling back to the tradeable price for price-only ticks.
    pub fn low_or_price(&self) -> Option<f64> {
        self.low.or_else(|| self.price())
    }
}

/// OHLCV aggregate over a fixed time window.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl Candle {
    /// Render this candle as a replay tick for the given symbol.
    pub fn to_tick(&self, symbol: &str) -> Tick {
        Tick {
            symbol: symbol.to_string(),
            ltp: None,
            open: Some(self.open),
            high: Some(self.high),
            low: Some(self.low),
            close: Some(self.close),
            volume: Some(self.volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn price_prefers_ltp() {
        let tick = Tick {
            ltp: Some(101.5),
            close: Some(99.0),
            ..Tick::from_ltp("NSE:SBIN-EQ", 101.5)
        };
        assert_eq!(tick.price(), Some(101.5));
    }

    #[test]
    fn price_falls_back_to_close() {
        let candle = Candle {
            timestamp: ts(9, 15, 0),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 5000,
        };
        let tick = candle.to_tick("NSE:SBIN-EQ");
        assert_eq!(tick.ltp, None);
        assert_eq!(tick.price(), Some(101.0));
    }

    #[test]
    fn price_absent_when_neither_field_set() {
        let tick = Tick {
            symbol: "NSE:SBIN-EQ".into(),
            ltp: None,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        };
        assert_eq!(tick.price(), None);
    }

    #[test]
    fn ohlc_fallback_for_price_only_tick() {
        let tick = Tick::from_ltp("NSE:SBIN-EQ", 250.0);
        assert_eq!(tick.high_or_price(), Some(250.0));
        assert_eq!(tick.low_or_price(), Some(250.0));
    }
}
