use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::history::HistoryBuffer;

/// Direction of the swing the levels are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwingDirection {
    /// Price travelled low → high; retracements measure down from the
    /// high, extensions continue above it.
    Up,
    /// Price travelled high → low; retracements measure up from the
    /// low, extensions continue below it.
    Down,
}

pub const RETRACEMENT_RATIOS: [Decimal; 5] = [
    dec!(0.236),
    dec!(0.382),
    dec!(0.5),
    dec!(0.618),
    dec!(0.786),
];

pub const EXTENSION_RATIOS: [Decimal; 2] = [dec!(1.272), dec!(1.618)];

/// Fibonacci retracement/extension levels for one swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevels {
    pub high: Decimal,
    pub low: Decimal,
    pub direction: SwingDirection,
    /// `(ratio, price)` pairs, in [`RETRACEMENT_RATIOS`] order.
    pub retracements: Vec<(Decimal, Decimal)>,
    /// `(ratio, price)` pairs, in [`EXTENSION_RATIOS`] order.
    pub extensions: Vec<(Decimal, Decimal)>,
}

impl FibLevels {
    /// Compute levels by linear interpolation from the swing extremes.
    pub fn new(high: Decimal, low: Decimal, direction: SwingDirection) -> Self {
        let range = high - low;
        let level = |ratio: Decimal| match direction {
            SwingDirection::Up => high - ratio * range,
            SwingDirection::Down => low + ratio * range,
        };
        let extension = |ratio: Decimal| match direction {
            SwingDirection::Up => low + ratio * range,
            SwingDirection::Down => high - ratio * range,
        };
        Self {
            high,
            low,
            direction,
            retracements: RETRACEMENT_RATIOS.iter().map(|&r| (r, level(r))).collect(),
            extensions: EXTENSION_RATIOS
                .iter()
                .map(|&r| (r, extension(r)))
                .collect(),
        }
    }

    /// Price at a specific retracement ratio, if it is one of the
    /// standard set.
    pub fn retracement(&self, ratio: Decimal) -> Option<Decimal> {
        self.retracements
            .iter()
            .find(|(r, _)| *r == ratio)
            .map(|(_, p)| *p)
    }

    /// Price at a specific extension ratio.
    pub fn extension(&self, ratio: Decimal) -> Option<Decimal> {
        self.extensions
            .iter()
            .find(|(r, _)| *r == ratio)
            .map(|(_, p)| *p)
    }

    /// The golden zone: the band between the 0.382 and 0.618
    /// retracements, returned as `(nearer, deeper)` relative to the
    /// swing extreme.
    pub fn golden_zone(&self) -> (Decimal, Decimal) {
        // Both are always in the standard set.
        let a = self.retracement(dec!(0.382)).unwrap_or(self.high);
        let b = self.retracement(dec!(0.618)).unwrap_or(self.low);
        (a, b)
    }
}

/// Locate the dominant swing over the last `lookback` candles.
///
/// Returns `None` until the swing spans at least `min_range` (callers
/// pass `min_swing_atr × ATR`, so quiet chop never produces levels).
/// Direction follows whichever extreme printed more recently.
pub fn find_recent_swing(
    buffer: &HistoryBuffer,
    lookback: usize,
    min_range: Decimal,
) -> Option<FibLevels> {
    if lookback < 2 || buffer.len() < lookback {
        return None;
    }
    let start = buffer.len() - lookback;

    let mut high = buffer.get(start)?.high;
    let mut high_idx = start;
    let mut low = buffer.get(start)?.low;
    let mut low_idx = start;

    for i in start + 1..buffer.len() {
        let c = buffer.get(i)?;
        if c.high > high {
            high = c.high;
            high_idx = i;
        }
        if c.low < low {
            low = c.low;
            low_idx = i;
        }
    }

    if high - low < min_range {
        return None;
    }

    let direction = if high_idx >= low_idx {
        SwingDirection::Up
    } else {
        SwingDirection::Down
    };
    Some(FibLevels::new(high, low, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    use crate::models::Candle;

    #[test]
    fn test_up_swing_retracements() {
        let fib = FibLevels::new(dec!(200), dec!(100), SwingDirection::Up);
        assert_eq!(fib.retracement(dec!(0.5)).unwrap(), dec!(150));
        assert_eq!(fib.retracement(dec!(0.236)).unwrap(), dec!(176.4));
        assert_eq!(fib.retracement(dec!(0.786)).unwrap(), dec!(121.4));
        // Extensions continue above the high.
        assert_eq!(fib.extension(dec!(1.272)).unwrap(), dec!(227.2));
        assert_eq!(fib.extension(dec!(1.618)).unwrap(), dec!(261.8));
    }

    #[test]
    fn test_down_swing_mirrors() {
        let fib = FibLevels::new(dec!(200), dec!(100), SwingDirection::Down);
        assert_eq!(fib.retracement(dec!(0.5)).unwrap(), dec!(150));
        assert_eq!(fib.retracement(dec!(0.236)).unwrap(), dec!(123.6));
        // Extensions continue below the low.
        assert_eq!(fib.extension(dec!(1.272)).unwrap(), dec!(72.8));
    }

    #[test]
    fn test_golden_zone_band() {
        let fib = FibLevels::new(dec!(200), dec!(100), SwingDirection::Up);
        let (upper, lower) = fib.golden_zone();
        assert_eq!(upper, dec!(161.8));
        assert_eq!(lower, dec!(138.2));
    }

    fn buffer_from_ranges(bars: &[(Decimal, Decimal)]) -> HistoryBuffer {
        let mut buf = HistoryBuffer::new(256);
        let base = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
        for (i, &(high, low)) in bars.iter().enumerate() {
            buf.push(Candle {
                timestamp: base + Duration::minutes(i as i64),
                open: low,
                high,
                low,
                close: low,
                volume: dec!(1000),
            })
            .unwrap();
        }
        buf
    }

    #[test]
    fn test_find_recent_swing_direction() {
        // Low first, high later: an up swing.
        let buf = buffer_from_ranges(&[
            (dec!(101), dec!(90)),
            (dec!(105), dec!(95)),
            (dec!(120), dec!(104)),
            (dec!(118), dec!(108)),
        ]);
        let fib = find_recent_swing(&buf, 4, dec!(10)).unwrap();
        assert_eq!(fib.direction, SwingDirection::Up);
        assert_eq!(fib.high, dec!(120));
        assert_eq!(fib.low, dec!(90));
    }

    #[test]
    fn test_small_swing_filtered_out() {
        let buf = buffer_from_ranges(&[
            (dec!(101), dec!(99)),
            (dec!(101), dec!(99)),
            (dec!(102), dec!(100)),
            (dec!(102), dec!(100)),
        ]);
        assert!(find_recent_swing(&buf, 4, dec!(10)).is_none());
    }
}
