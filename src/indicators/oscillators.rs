use rust_decimal::Decimal;

use crate::history::HistoryBuffer;
use crate::num;

/// Stochastic oscillator reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticValue {
    pub k: Decimal,
    pub d: Decimal,
}

/// %K over the `k_period` candles ending at buffer position `end`
/// (inclusive). A zero high-low range reads as the 50 midline.
fn percent_k(buffer: &HistoryBuffer, end: usize, k_period: usize) -> Option<Decimal> {
    if end + 1 < k_period {
        return None;
    }
    let start = end + 1 - k_period;
    let mut highest = buffer.get(start)?.high;
    let mut lowest = buffer.get(start)?.low;
    for i in start + 1..=end {
        let c = buffer.get(i)?;
        highest = highest.max(c.high);
        lowest = lowest.min(c.low);
    }
    let close = buffer.get(end)?.close;
    let range = highest - lowest;
    if range.is_zero() {
        return Some(Decimal::from(50u32));
    }
    num::div(Decimal::ONE_HUNDRED * (close - lowest), range).ok()
}

/// Stochastic oscillator: `%K = 100 · (close − LL(k)) / (HH(k) − LL(k))`,
/// `%D` = SMA of the last `d_period` %K values.
///
/// Needs `k_period + d_period - 1` candles.
pub fn stochastic(
    buffer: &HistoryBuffer,
    k_period: usize,
    d_period: usize,
) -> Option<StochasticValue> {
    if k_period == 0 || d_period == 0 || buffer.len() < k_period + d_period - 1 {
        return None;
    }
    let last = buffer.len() - 1;
    let mut ks = Vec::with_capacity(d_period);
    for offset in (0..d_period).rev() {
        ks.push(percent_k(buffer, last - offset, k_period)?);
    }
    let k = *ks.last()?;
    let d = num::mean(&ks)?;
    Some(StochasticValue { k, d })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal_macros::dec;

    use crate::models::Candle;

    fn push(buf: &mut HistoryBuffer, i: i64, high: Decimal, low: Decimal, close: Decimal) {
        buf.push(Candle {
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
                + Duration::minutes(i),
            open: close,
            high: high.max(close),
            low: low.min(close),
            close,
            volume: dec!(1000),
        })
        .unwrap();
    }

    #[test]
    fn test_stochastic_close_at_high_reads_100() {
        let mut buf = HistoryBuffer::new(64);
        for i in 0..16 {
            push(&mut buf, i, dec!(100) + Decimal::from(i), dec!(90), dec!(100) + Decimal::from(i));
        }
        let s = stochastic(&buf, 14, 3).unwrap();
        assert_eq!(s.k, dec!(100));
        assert_eq!(s.d, dec!(100));
    }

    #[test]
    fn test_stochastic_close_at_low_reads_0() {
        let mut buf = HistoryBuffer::new(64);
        for i in 0..16 {
            let level = dec!(100) - Decimal::from(i);
            push(&mut buf, i, dec!(110), level, level);
        }
        let s = stochastic(&buf, 14, 3).unwrap();
        assert_eq!(s.k, dec!(0));
    }

    #[test]
    fn test_stochastic_zero_range_midline() {
        let mut buf = HistoryBuffer::new(64);
        for i in 0..16 {
            push(&mut buf, i, dec!(100), dec!(100), dec!(100));
        }
        let s = stochastic(&buf, 14, 3).unwrap();
        assert_eq!(s.k, dec!(50));
        assert_eq!(s.d, dec!(50));
    }

    #[test]
    fn test_stochastic_warm_up() {
        let mut buf = HistoryBuffer::new(64);
        for i in 0..15 {
            push(&mut buf, i, dec!(101), dec!(99), dec!(100));
        }
        // k=14, d=3 needs 16 bars
        assert!(stochastic(&buf, 14, 3).is_none());
        push(&mut buf, 15, dec!(101), dec!(99), dec!(100));
        assert!(stochastic(&buf, 14, 3).is_some());
    }
}
