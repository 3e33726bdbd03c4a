use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::models::Candle;
use crate::num;

/// True range of a bar against the previous close:
/// `max(high - low, |high - prev_close|, |low - prev_close|)`.
pub fn true_range(candle: &Candle, prev_close: Decimal) -> Decimal {
    (candle.high - candle.low)
        .max((candle.high - prev_close).abs())
        .max((candle.low - prev_close).abs())
}

/// Average True Range over a trailing window.
///
/// Keeps the last `period` true ranges and averages them each bar.
/// That is O(period) rather than O(1), but the period is small and
/// constant, so the cost is bounded; the per-bar memo in the indicator
/// engine ensures it runs at most once per bar.
#[derive(Debug, Clone)]
pub struct AtrState {
    period: usize,
    prev_close: Option<Decimal>,
    true_ranges: VecDeque<Decimal>,
}

impl AtrState {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            prev_close: None,
            true_ranges: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn update(&mut self, candle: &Candle) {
        if let Some(prev) = self.prev_close {
            self.true_ranges.push_back(true_range(candle, prev));
            while self.true_ranges.len() > self.period {
                self.true_ranges.pop_front();
            }
        }
        self.prev_close = Some(candle.close);
    }

    /// Current ATR; `None` until `period + 1` candles have been seen
    /// (the first candle only provides the previous close).
    pub fn value(&self) -> Option<Decimal> {
        if self.true_ranges.len() < self.period {
            return None;
        }
        let trs: Vec<Decimal> = self.true_ranges.iter().copied().collect();
        num::mean(&trs)
    }
}
