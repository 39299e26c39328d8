//! Fixed-duration candle aggregation from a tick stream.

use chrono::{NaiveDateTime, Timelike};

use super::tick::Candle;

/// Floor a timestamp to the start of its bucket.
///
/// Buckets are measured from the top of the hour: a 15-minute bucket
/// containing 09:21:40 starts at 09:15:00.
pub fn bucket_start(timestamp: NaiveDateTime, bucket_minutes: u32) -> NaiveDateTime {
    let minute = (timestamp.minute() / bucket_minutes) * bucket_minutes;
    timestamp
        .with_minute(minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

/// Aggregates ticks into fixed-duration OHLC buckets.
///
/// A bucket closes when a tick arrives at or after the start of the next
/// bucket; the completed bucket is finalized and returned before the new
/// bucket opens with that tick.
#[derive(Debug)]
pub struct CandleBucketer {
    bucket_minutes: u32,
    current: Option<Candle>,
}

impl CandleBucketer {
    pub fn new(bucket_minutes: u32) -> Self {
        CandleBucketer {
            bucket_minutes,
            current: None,
        }
    }

    /// The bucket being aggregated, if any.
    pub fn current(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    /// Fold one tick in. Returns the just-completed candle when this tick
    /// rolled the stream into a new bucket.
    pub fn update(&mut self, timestamp: NaiveDateTime, price: f64) -> Option<Candle> {
        let start = bucket_start(timestamp, self.bucket_minutes);

        match &mut self.current {
            Some(candle) if candle.timestamp == start => {
                candle.high = candle.high.max(price);
                candle.low = candle.low.min(price);
                candle.close = price;
                candle.volume += 1;
                None
            }
            _ => {
                let finished = self.current.take();
                self.current = Some(Candle {
                    timestamp: start,
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    volume: 1,
                });
                finished
            }
        }
    }

    /// Drop all aggregation state.
    pub fn reset(&mut self) {
        self.current = None;
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
    fn bucket_start_floors_from_top_of_hour() {
        assert_eq!(bucket_start(ts(9, 21, 40), 15), ts(9, 15, 0));
        assert_eq!(bucket_start(ts(9, 15, 0), 15), ts(9, 15, 0));
        assert_eq!(bucket_start(ts(9, 29, 59), 15), ts(9, 15, 0));
        assert_eq!(bucket_start(ts(9, 30, 1), 15), ts(9, 30, 0));
        assert_eq!(bucket_start(ts(10, 7, 3), 5), ts(10, 5, 0));
    }

    #[test]
    fn closes_exactly_one_bucket_at_the_boundary() {
        // Three ticks inside [09:15, 09:30), then one just after the
        // boundary must finalize the first bucket and open a new one
        // starting at 09:30:00.
        let mut bucketer = CandleBucketer::new(15);

        assert!(bucketer.update(ts(9, 15, 5), 100.0).is_none());
        assert!(bucketer.update(ts(9, 21, 40), 104.0).is_none());
        assert!(bucketer.update(ts(9, 29, 59), 98.0).is_none());

        let closed = bucketer.update(ts(9, 30, 1), 101.0).unwrap();
        assert_eq!(closed.timestamp, ts(9, 15, 0));
        assert_eq!(closed.open, 100.0);
        assert_eq!(closed.high, 104.0);
        assert_eq!(closed.low, 98.0);
        assert_eq!(closed.close, 98.0);

        let current = bucketer.current().unwrap();
        assert_eq!(current.timestamp, ts(9, 30, 0));
        assert_eq!(current.open, 101.0);
    }

    #[test]
    fn boundary_tick_belongs_to_the_new_bucket() {
        let mut bucketer = CandleBucketer::new(15);
        bucketer.update(ts(9, 20, 0), 100.0);

        let closed = bucketer.update(ts(9, 30, 0), 105.0).unwrap();
        assert_eq!(closed.timestamp, ts(9, 15, 0));
        assert_eq!(bucketer.current().unwrap().timestamp, ts(9, 30, 0));
    }

    #[test]
    fn gap_across_multiple_buckets_closes_only_the_open_one() {
        let mut bucketer = CandleBucketer::new(15);
        bucketer.update(ts(9, 16, 0), 100.0);

        // Next tick skips the 09:30 bucket entirely.
        let closed = bucketer.update(ts(9, 46, 0), 102.0).unwrap();
        assert_eq!(closed.timestamp, ts(9, 15, 0));
        assert_eq!(bucketer.current().unwrap().timestamp, ts(9, 45, 0));
    }

    #[test]
    fn reset_discards_partial_bucket() {
        let mut bucketer = CandleBucketer::new(15);
        bucketer.update(ts(9, 16, 0), 100.0);
        bucketer.reset();
        assert!(bucketer.current().is_none());
        assert!(bucketer.update(ts(9, 17, 0), 101.0).is_none());
    }
}
