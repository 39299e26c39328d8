#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tickwheel::domain::error::TickwheelError;
use tickwheel::domain::tick::Candle;
use tickwheel::ports::data_port::DataPort;

pub const SYMBOL: &str = "NSE:SBIN-EQ";

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
        _resolution: u32,
    ) -> Result<Vec<Candle>, TickwheelError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TickwheelError::DataFetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn session_open() -> NaiveDateTime {
    date(2024, 1, 15).and_hms_opt(9, 15, 0).unwrap()
}

/// A flat minute candle `minute_offset` minutes after the 09:15 open.
pub fn minute_candle(minute_offset: i64, close: f64) -> Candle {
    Candle {
        timestamp: session_open() + chrono::Duration::minutes(minute_offset),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000,
    }
}

/// Twenty flat closes, one golden-cross close, one collapse close: an SMA
/// Crossover entry at 110 followed by a death-cross exit at 10.
pub fn crossover_candles() -> Vec<Candle> {
    let mut candles: Vec<Candle> = (0..20).map(|i| minute_candle(i, 100.0)).collect();
    candles.push(minute_candle(20, 110.0));
    candles.push(minute_candle(21, 10.0));
    candles
}

/// Write candles in the data adapter's on-disk layout.
pub fn write_candles_csv(dir: &Path, symbol: &str, candles: &[Candle]) {
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp.format("%Y-%m-%d %H:%M:%S"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        ));
    }
    let filename = format!("{}.csv", symbol.replace([':', '/'], "_"));
    fs::write(dir.join(filename), content).unwrap();
}
