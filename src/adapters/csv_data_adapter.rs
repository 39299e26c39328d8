//! CSV file data adapter: historical minute candles, one file per symbol.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::domain::candle::bucket_start;
use crate::domain::error::TickwheelError;
use crate::domain::tick::Candle;
use crate::ports::data_port::DataPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize)]
struct CandleRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Exchange-qualified symbols contain characters that do not belong in
    /// file names, so `NSE:SBIN-EQ` is stored as `NSE_SBIN-EQ.csv`.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}.csv", symbol.replace([':', '/'], "_")))
    }
}

impl DataPort for CsvDataAdapter {
    fn fetch_candles(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        resolution: u32,
    ) -> Result<Vec<Candle>, TickwheelError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::Reader::from_path(&path).map_err(|e| TickwheelError::DataFetch {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut candles = Vec::new();
        for row in rdr.deserialize::<CandleRow>() {
            let row = row.map_err(|e| TickwheelError::DataFetch {
                symbol: symbol.to_string(),
                reason: format!("CSV parse error: {}", e),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(&row.timestamp, TIMESTAMP_FORMAT)
                .map_err(|e| TickwheelError::DataFetch {
                    symbol: symbol.to_string(),
                    reason: format!("invalid timestamp {}: {}", row.timestamp, e),
                })?;

            if timestamp.date() < start_date || timestamp.date() > end_date {
                continue;
            }

            candles.push(Candle {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        if resolution > 1 {
            candles = aggregate(candles, resolution);
        }
        Ok(candles)
    }
}

/// Roll 1-minute rows up into `minutes`-wide candles. Source candles are
/// assumed chronological.
fn aggregate(candles: Vec<Candle>, minutes: u32) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::new();
    for candle in candles {
        let bucket = bucket_start(candle.timestamp, minutes);
        match out.last_mut() {
            Some(current) if current.timestamp == bucket => {
                current.high = current.high.max(candle.high);
                current.low = current.low.min(candle.low);
                current.close = candle.close;
                current.volume += candle.volume;
            }
            _ => out.push(Candle {
                timestamp: bucket,
                ..candle
            }),
        }
    }
    out
}
