//! Rolling-window helpers shared by strategies.

use super::tick::Candle;

/// Arithmetic mean of the last `period` values.
///
/// Undefined (returns `None`) until at least `period` values exist, so
/// callers never signal off a partial window.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// A confirmed local extreme in a bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct Pivot {
    pub index: usize,
    /// The extreme itself: the bar's high for a pivot high, low for a
    /// pivot low.
    pub value: f64,
    /// The opposite extreme of the pivot bar, used as a structural stop.
    pub counter_value: f64,
}

/// First bar whose high strictly exceeds the highs of every bar within
/// `swing` positions on both sides. Needs `2 * swing + 1` bars before any
/// pivot can be found.
pub fn pivot_high(bars: &[Candle], swing: usize) -> Option<Pivot> {
    if swing == 0 || bars.len() < 2 * swing + 1 {
        return None;
    }
    for i in swing..bars.len() - swing {
        let center = bars[i].high;
        let left = bars[i - swing..i].iter().all(|b| center > b.high);
        let right = bars[i + 1..=i + swing].iter().all(|b| center > b.high);
        if left && right {
            return Some(Pivot {
                index: i,
                value: center,
                counter_value: bars[i].low,
            });
        }
    }
    None
}

/// Symmetric to [`pivot_high`]: first bar whose low is strictly below the
/// lows of every bar within `swing` positions on both sides.
pub fn pivot_low(bars: &[Candle], swing: usize) -> Option<Pivot> {
    if swing == 0 || bars.len() < 2 * swing + 1 {
        return None;
    }
    for i in swing..bars.len() - swing {
        let center = bars[i].low;
        let left = bars[i - swing..i].iter().all(|b| center < b.low);
        let right = bars[i + 1..=i + swing].iter().all(|b| center < b.low);
        if left && right {
            return Some(Pivot {
                index: i,
                value: center,
                counter_value: bars[i].high,
            });
        }
    }
    None
}
